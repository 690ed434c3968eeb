//! PostScript calculator functions (type 4).

mod compile;
mod op;
mod vm;

pub use op::Operator;

use crate::error::{Error, ParameterError, Result};
use crate::{Clamper, Values};

const LITERAL: u8 = 0xF0;
const JUMP: u8 = 0xF1;
const JUMP_IF_NOT_TRUE: u8 = 0xF2;
const BEGIN: u8 = 0xF3;
const RETURN: u8 = 0xF4;

/// A single instruction of a compiled program.
///
/// Jump targets are indices into the instructions of the program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    /// Push a number.
    Literal(f64),
    /// Apply an operator.
    Op(Operator),
    /// Pop a boolean and continue at the target if it is `false`.
    JumpIfNotTrue(usize),
    /// Continue at the target.
    Jump(usize),
    /// The placeholder for a block that was never turned into a jump.
    ///
    /// Running it is an error.
    Begin,
    /// Stop and collect the results.
    Return,
}

impl Instruction {
    fn encoded_len(&self) -> usize {
        match self {
            Self::Literal(_) => 9,
            Self::JumpIfNotTrue(_) | Self::Jump(_) => 5,
            Self::Op(_) | Self::Begin | Self::Return => 1,
        }
    }
}

/// A compiled PostScript calculator program.
///
/// Conditional blocks are lowered to jumps, so running a program is a single
/// pass over a flat list of instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Compile the text of a PostScript calculator function, including the
    /// outer braces.
    pub fn compile(code: &[u8]) -> Result<Self> {
        compile::compile(code)
    }

    /// The instructions of the program.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Encode the program as bytes.
    ///
    /// Operators are stored as their tag, numbers as a tag followed by a
    /// little-endian `f64`. Jumps store a little-endian `i32` offset, relative
    /// to the end of the jump instruction.
    pub fn to_bytes(&self) -> Vec<u8> {
        let offsets = self.offsets();
        let mut out = Vec::with_capacity(offsets.last().copied().unwrap_or(0));

        for (i, instruction) in self.instructions.iter().enumerate() {
            let (tag, target) = match *instruction {
                Instruction::Literal(n) => {
                    out.push(LITERAL);
                    out.extend_from_slice(&n.to_le_bytes());

                    continue;
                }
                Instruction::Op(op) => (op.tag(), None),
                Instruction::JumpIfNotTrue(target) => (JUMP_IF_NOT_TRUE, Some(target)),
                Instruction::Jump(target) => (JUMP, Some(target)),
                Instruction::Begin => (BEGIN, None),
                Instruction::Return => (RETURN, None),
            };

            out.push(tag);

            if let Some(target) = target {
                let end = offsets[i] + 5;
                let target = offsets.get(target).copied().unwrap_or(end);
                // Jumps produced by the compiler always point forward.
                let rel = target.saturating_sub(end) as i32;

                out.extend_from_slice(&rel.to_le_bytes());
            }
        }

        out
    }

    /// Decode a program from its byte encoding.
    ///
    /// Only forward jumps that land on an instruction, or right after the
    /// last one, are accepted. This guarantees that every decoded program
    /// terminates.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        // Instructions, with the byte offset of the target for jumps.
        let mut decoded = vec![];
        let mut offsets = vec![];
        let mut offset = 0;

        while offset < data.len() {
            let tag = data[offset];
            offsets.push(offset);

            let payload = |len: usize| {
                data.get(offset + 1..offset + 1 + len)
                    .ok_or(Error::BlockError)
            };

            let (instruction, target) = match tag {
                LITERAL => {
                    let bytes = payload(8)?;
                    let mut n = [0; 8];
                    n.copy_from_slice(bytes);

                    (Instruction::Literal(f64::from_le_bytes(n)), None)
                }
                JUMP | JUMP_IF_NOT_TRUE => {
                    let bytes = payload(4)?;
                    let mut rel = [0; 4];
                    rel.copy_from_slice(bytes);
                    let rel = i32::from_le_bytes(rel);

                    if rel < 0 {
                        return Err(Error::BlockError);
                    }

                    let target = offset + 5 + rel as usize;
                    let instruction = if tag == JUMP {
                        Instruction::Jump(0)
                    } else {
                        Instruction::JumpIfNotTrue(0)
                    };

                    (instruction, Some(target))
                }
                BEGIN => (Instruction::Begin, None),
                RETURN => (Instruction::Return, None),
                _ => (
                    Instruction::Op(Operator::from_tag(tag).ok_or(Error::BlockError)?),
                    None,
                ),
            };

            offset += instruction.encoded_len();
            decoded.push((instruction, target));
        }

        let resolve = |target: usize| {
            if target == data.len() {
                Ok(offsets.len())
            } else {
                offsets.binary_search(&target).map_err(|_| Error::BlockError)
            }
        };

        let instructions = decoded
            .into_iter()
            .map(|(instruction, target)| match (instruction, target) {
                (Instruction::Jump(_), Some(target)) => resolve(target).map(Instruction::Jump),
                (Instruction::JumpIfNotTrue(_), Some(target)) => {
                    resolve(target).map(Instruction::JumpIfNotTrue)
                }
                (instruction, _) => Ok(instruction),
            })
            .collect::<Result<Vec<_>>>()
            .inspect_err(|_| {
                lwarn!("invalid jump target in encoded PostScript function");
            })?;

        Ok(Self { instructions })
    }

    /// The byte offset of each instruction in the encoding, followed by the
    /// total length.
    fn offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.instructions.len() + 1);
        let mut offset = 0;

        for instruction in &self.instructions {
            offsets.push(offset);
            offset += instruction.encoded_len();
        }

        offsets.push(offset);

        offsets
    }
}

/// A type 4 function (PostScript calculator function).
#[derive(Debug)]
pub(crate) struct Type4 {
    pub(crate) clamper: Clamper,
    program: Program,
}

impl Type4 {
    /// Create a new type 4 function.
    pub(crate) fn new(domain: &[(f64, f64)], range: &[(f64, f64)], code: &[u8]) -> Result<Self> {
        if range.is_empty() {
            return Err(ParameterError::MissingRange.into());
        }

        let clamper = Clamper::new(domain, Some(range))?;
        let program = Program::compile(code).map_err(|_| Error::BadPostScriptProgram)?;

        Ok(Self { clamper, program })
    }

    pub(crate) fn outputs(&self) -> usize {
        self.clamper.range.as_ref().map_or(0, |r| r.len())
    }

    /// Evaluate the function with the given input.
    pub(crate) fn eval(&self, input: &[f64]) -> Result<Values> {
        let mut input = Values::from_slice(input);
        self.clamper.clamp_input(&mut input)?;

        let range = self.clamper.range.as_deref().unwrap_or_default();

        self.program.execute(&input, range)
    }
}
