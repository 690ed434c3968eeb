//! Recognition of numbers among finished keyword lexemes.
//!
//! A lexeme is an integer if it is an optional sign followed by digits, and
//! a real if it additionally contains a single `.`. Exponents are not part of
//! PDF syntax, so `1e5` stays a keyword. Integers that overflow an `i32` are
//! returned as reals.

use crate::token::Token;

pub(crate) fn recognize(lexeme: &[u8]) -> Option<Token> {
    let (negative, digits) = match lexeme.first()? {
        b'+' => (false, &lexeme[1..]),
        b'-' => (true, &lexeme[1..]),
        _ => (false, lexeme),
    };

    let mut seen_digit = false;
    let mut seen_point = false;

    for b in digits {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_point => seen_point = true,
            _ => return None,
        }
    }

    if !seen_digit {
        return None;
    }

    if !seen_point && let Some(value) = parse_integer(negative, digits) {
        return Some(Token::Integer(value));
    }

    // Validated above, so this only contains ASCII.
    let text = std::str::from_utf8(lexeme).ok()?;
    let value = text.parse::<f32>().ok()?;

    Some(Token::Real(value))
}

/// Accumulate the digits into an `i32`, returning `None` on overflow.
fn parse_integer(negative: bool, digits: &[u8]) -> Option<i32> {
    let mut value = 0_i32;

    for b in digits {
        let digit = i32::from(b - b'0');
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
    }

    Some(value)
}
