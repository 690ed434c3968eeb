//! Compilation of PostScript calculator programs.

use super::op::{KEYWORDS, Keyword};
use super::{Instruction, Program};
use crate::error::{Error, Result};
use smallvec::SmallVec;

/// The maximum nesting depth of blocks inside the program.
pub(crate) const MAX_NESTING: usize = 32;
/// The maximum length of a single token.
pub(crate) const MAX_TOKEN_LEN: usize = 127;

/// Compile the text of a PostScript calculator function.
pub(crate) fn compile(code: &[u8]) -> Result<Program> {
    Compiler::default()
        .run(&mut Lexer::new(code))
        .map_err(|reason| {
            lwarn!("failed to compile PostScript function: {}", reason);

            Error::CompileError
        })
}

/// A block whose `}` has been seen, waiting for its `if` or `ifelse`.
#[derive(Debug, Clone, Copy)]
struct Block {
    /// The index of its `Begin` placeholder.
    start: usize,
    /// The index after its last instruction.
    end: usize,
}

#[derive(Default)]
struct Compiler {
    instructions: Vec<Instruction>,
    /// Start indices of the blocks that are still open, not counting the
    /// outermost one.
    open: SmallVec<[usize; 8]>,
    closed: SmallVec<[Block; 4]>,
}

impl Compiler {
    fn run(mut self, lexer: &mut Lexer<'_>) -> core::result::Result<Program, &'static str> {
        if lexer.next() != Some(b"{".as_slice()) {
            return Err("program doesn't start with `{`");
        }

        loop {
            let Some(token) = lexer.next() else {
                return Err("missing `}` at the end of the program");
            };

            match token {
                b"{" => self.open_block()?,
                b"}" => {
                    if self.close_block()? {
                        break;
                    }
                }
                _ => self.token(token)?,
            }
        }

        if lexer.next().is_some() {
            return Err("unexpected token after the end of the program");
        }

        Ok(Program {
            instructions: self.instructions,
        })
    }

    fn open_block(&mut self) -> core::result::Result<(), &'static str> {
        if self.open.len() >= MAX_NESTING {
            return Err("blocks are nested too deeply");
        }

        self.open.push(self.instructions.len());
        self.instructions.push(Instruction::Begin);

        Ok(())
    }

    /// Close the innermost block. Returns `true` if this was the end of the
    /// program.
    fn close_block(&mut self) -> core::result::Result<bool, &'static str> {
        match self.open.pop() {
            Some(start) => {
                self.closed.push(Block {
                    start,
                    end: self.instructions.len(),
                });

                Ok(false)
            }
            None => {
                if !self.closed.is_empty() {
                    return Err("block without `if` or `ifelse`");
                }

                self.instructions.push(Instruction::Return);

                Ok(true)
            }
        }
    }

    /// Take the block that ends right at the current position.
    fn take_block(&mut self, end: usize) -> core::result::Result<Block, &'static str> {
        match self.closed.pop() {
            Some(block) if block.end == end => Ok(block),
            _ => Err("`if` or `ifelse` without the blocks right before it"),
        }
    }

    fn token(&mut self, token: &[u8]) -> core::result::Result<(), &'static str> {
        if token.len() > MAX_TOKEN_LEN {
            return Err("token is too long");
        }

        // PostScript operators are all lowercase, everything else must be a
        // number.
        let is_number = token
            .first()
            .is_some_and(|b| b.is_ascii_digit() || !b.is_ascii_lowercase());

        if is_number {
            let number = std::str::from_utf8(token)
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|n| n.is_finite())
                .ok_or("invalid number")?;

            self.instructions.push(Instruction::Literal(number));

            return Ok(());
        }

        match KEYWORDS.get(token) {
            Some(Keyword::Op(op)) => self.instructions.push(Instruction::Op(*op)),
            Some(Keyword::If) => {
                let block = self.take_block(self.instructions.len())?;
                self.instructions[block.start] = Instruction::JumpIfNotTrue(block.end);
            }
            Some(Keyword::IfElse) => {
                let else_block = self.take_block(self.instructions.len())?;
                let then_block = self.take_block(else_block.start)?;

                // Skip the jump over the else block when the condition is
                // false.
                self.instructions[then_block.start] =
                    Instruction::JumpIfNotTrue(else_block.start + 1);
                self.instructions[else_block.start] = Instruction::Jump(else_block.end);
            }
            None => return Err("unknown operator"),
        }

        Ok(())
    }
}

/// Splits a program into whitespace separated tokens, with `{` and `}` as
/// tokens of their own.
struct Lexer<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Lexer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn skip_white_spaces_and_comments(&mut self) {
        while let Some(&b) = self.data.get(self.offset) {
            if is_white_space(b) {
                self.offset += 1;
            } else if b == b'%' {
                while self
                    .data
                    .get(self.offset)
                    .is_some_and(|b| !matches!(b, b'\n' | b'\r'))
                {
                    self.offset += 1;
                }
            } else {
                break;
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_white_spaces_and_comments();

        let start = self.offset;
        let first = *self.data.get(start)?;
        self.offset += 1;

        if !matches!(first, b'{' | b'}') {
            while self
                .data
                .get(self.offset)
                .is_some_and(|b| !is_white_space(*b) && !matches!(b, b'{' | b'}' | b'%'))
            {
                self.offset += 1;
            }
        }

        self.data.get(start..self.offset)
    }
}

#[inline]
fn is_white_space(b: u8) -> bool {
    matches!(b, 0x00 | 0x09 | 0x0a | 0x0c | 0x0d | 0x20)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Operator;

    fn instructions(code: &str) -> Vec<Instruction> {
        compile(code.as_bytes()).unwrap().instructions
    }

    #[test]
    fn lex() {
        let tokens: Vec<&[u8]> = Lexer::new(b" {dup 2.0 % a comment\n exch}{").collect();
        let expected: [&[u8]; 6] = [b"{", b"dup", b"2.0", b"exch", b"}", b"{"];
        assert_eq!(tokens, expected);
    }

    #[test]
    fn straight_line() {
        assert_eq!(
            instructions("{ copy dup 2.0 exch roll }"),
            vec![
                Instruction::Op(Operator::Copy),
                Instruction::Op(Operator::Dup),
                Instruction::Literal(2.0),
                Instruction::Op(Operator::Exch),
                Instruction::Op(Operator::Roll),
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            instructions("{ -3 .5 +2 1e3 4. }"),
            vec![
                Instruction::Literal(-3.0),
                Instruction::Literal(0.5),
                Instruction::Literal(2.0),
                Instruction::Literal(1000.0),
                Instruction::Literal(4.0),
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn if_block() {
        assert_eq!(
            instructions("{ true { 1 } if }"),
            vec![
                Instruction::Op(Operator::True),
                Instruction::JumpIfNotTrue(3),
                Instruction::Literal(1.0),
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn ifelse_block() {
        assert_eq!(
            instructions("{{dup exch} if {0} {1} ifelse}"),
            vec![
                Instruction::JumpIfNotTrue(3),
                Instruction::Op(Operator::Dup),
                Instruction::Op(Operator::Exch),
                Instruction::JumpIfNotTrue(6),
                Instruction::Literal(0.0),
                Instruction::Jump(7),
                Instruction::Literal(1.0),
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn nested_blocks() {
        assert_eq!(
            instructions("{ { { 1 } if } if }"),
            vec![
                Instruction::JumpIfNotTrue(3),
                Instruction::JumpIfNotTrue(3),
                Instruction::Literal(1.0),
                Instruction::Return,
            ]
        );
    }

    #[test]
    fn nesting_limit() {
        let ok = format!("{{ {} {} }}", "{".repeat(32), "} if".repeat(32));
        assert!(compile(ok.as_bytes()).is_ok());

        let too_deep = format!("{{ {} {} }}", "{".repeat(33), "} if".repeat(33));
        assert_eq!(compile(too_deep.as_bytes()), Err(Error::CompileError));
    }

    #[test]
    fn errors() {
        for code in [
            "",
            "1 2 add",
            "{ 1 2 add",
            "{ 1 2 add } 3",
            "{ 1 2 foo }",
            "{ 1 2 Add }",
            "{ 1.2.3 }",
            "{ NaN }",
            "{ 1e999 }",
            "{ { 1 } }",
            "{ if }",
            "{ true { 1 } 2 if }",
            "{ { 1 } ifelse }",
            "{ { 1 } 2 { 3 } ifelse }",
            "{ } }",
        ] {
            assert_eq!(compile(code.as_bytes()), Err(Error::CompileError), "{code}");
        }
    }

    #[test]
    fn long_token() {
        let ok = format!("{{ {} }}", "1".repeat(127));
        assert!(compile(ok.as_bytes()).is_ok());

        let too_long = format!("{{ {} }}", "1".repeat(128));
        assert_eq!(compile(too_long.as_bytes()), Err(Error::CompileError));
    }
}
