//! Logging macros. Without the `logging` feature they only borrow their
//! arguments, so that no unused-variable warnings show up.

macro_rules! log_at {
    ($level:ident, $fmt:literal $(, $($arg:expr),* $(,)?)?) => {
        #[cfg(feature = "logging")]
        ::log::$level!($fmt $(, $($arg),*)?);
        #[cfg(not(feature = "logging"))]
        { $($(let _ = &$arg;)*)? }
    };
}

macro_rules! ldebug {
    ($($tt:tt)*) => { log_at!(debug, $($tt)*) };
}

macro_rules! ltrace {
    ($($tt:tt)*) => { log_at!(trace, $($tt)*) };
}
