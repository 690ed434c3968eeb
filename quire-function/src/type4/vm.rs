//! The stack machine running compiled PostScript calculator programs.

use super::{Instruction, Operator, Program};
use crate::error::{Error, Result};
use crate::{Values, clip};

/// The maximum number of operands on the stack.
pub(crate) const STACK_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Operand {
    Number(f64),
    Boolean(bool),
}

impl Operand {
    fn as_number(self) -> Result<f64> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Boolean(_) => Err(Error::TypeError),
        }
    }

    /// The operand as an operand of an integer operator.
    fn as_int(self) -> Result<i32> {
        let n = self.as_number()?;

        if n != n.floor() {
            return Err(Error::TypeError);
        }

        if n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
            return Err(Error::RangeError);
        }

        Ok(n as i32)
    }
}

/// A fixed-size operand stack, so that running a program doesn't allocate.
struct Stack {
    operands: [Operand; STACK_CAPACITY],
    depth: usize,
}

impl Stack {
    fn new() -> Self {
        Self {
            operands: [Operand::Number(0.0); STACK_CAPACITY],
            depth: 0,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.depth
    }

    #[inline]
    fn push(&mut self, operand: Operand) -> Result<()> {
        let slot = self
            .operands
            .get_mut(self.depth)
            .ok_or(Error::StackOverflow)?;
        *slot = operand;
        self.depth += 1;

        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> Result<Operand> {
        self.depth = self.depth.checked_sub(1).ok_or(Error::StackUnderflow)?;

        Ok(self.operands[self.depth])
    }

    /// The operand `n` positions below the top.
    #[inline]
    fn peek(&self, n: usize) -> Result<Operand> {
        self.depth
            .checked_sub(n + 1)
            .map(|i| self.operands[i])
            .ok_or(Error::StackUnderflow)
    }

    /// The operands currently on the stack, bottom first.
    #[inline]
    fn live(&self) -> &[Operand] {
        &self.operands[..self.depth]
    }

    #[inline]
    fn live_mut(&mut self) -> &mut [Operand] {
        &mut self.operands[..self.depth]
    }
}

impl Program {
    /// Run the program.
    ///
    /// The input values are pushed onto the stack before the program starts.
    /// Once it finishes, the stack must hold exactly one number per entry of
    /// `range`, which the outputs are clipped to.
    pub fn execute(&self, input: &[f64], range: &[(f64, f64)]) -> Result<Values> {
        let mut stack = Stack::new();
        let mut pc = 0;

        self.run(&mut stack, &mut pc, input, range).inspect_err(|e| {
            lwarn!(
                "PostScript function failed at instruction {} with {} operands on the stack: {}",
                pc.saturating_sub(1),
                stack.len(),
                e
            );
        })
    }

    /// Run until the program returns. On failure, `pc` is one past the
    /// failing instruction.
    fn run(
        &self,
        stack: &mut Stack,
        pc: &mut usize,
        input: &[f64],
        range: &[(f64, f64)],
    ) -> Result<Values> {
        for n in input {
            stack.push(Operand::Number(*n))?;
        }

        loop {
            let instruction = *self.instructions.get(*pc).ok_or(Error::BlockError)?;
            *pc += 1;

            match instruction {
                Instruction::Literal(n) => stack.push(Operand::Number(n))?,
                Instruction::Op(op) => apply(op, stack)?,
                Instruction::JumpIfNotTrue(target) => match stack.pop()? {
                    Operand::Boolean(true) => {}
                    Operand::Boolean(false) => *pc = target,
                    Operand::Number(_) => return Err(Error::TypeError),
                },
                Instruction::Jump(target) => *pc = target,
                Instruction::Begin => return Err(Error::BlockError),
                Instruction::Return => return finish(stack, range),
            }
        }
    }
}

fn finish(stack: &Stack, range: &[(f64, f64)]) -> Result<Values> {
    if stack.len() < range.len() {
        return Err(Error::StackUnderflow);
    }

    if stack.len() > range.len() {
        return Err(Error::StackError);
    }

    stack
        .live()
        .iter()
        .zip(range.iter())
        .map(|(operand, range)| clip(operand.as_number()?, *range))
        .collect()
}

/// Fail with a limit check if an arithmetic result isn't representable.
fn limit(n: f64) -> Result<f64> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(Error::LimitCheck)
    }
}

fn apply(op: Operator, stack: &mut Stack) -> Result<()> {
    macro_rules! one_f {
        ($eval:expr) => {{
            let n = stack.pop()?.as_number()?;
            stack.push(Operand::Number($eval(n)?))?;
        }};
    }

    macro_rules! two_f {
        ($eval:expr) => {{
            let n2 = stack.pop()?.as_number()?;
            let n1 = stack.pop()?.as_number()?;
            stack.push(Operand::Number($eval(n1, n2)?))?;
        }};
    }

    macro_rules! two_i {
        ($eval:expr) => {{
            let n2 = stack.pop()?.as_int()?;
            let n1 = stack.pop()?.as_int()?;
            stack.push(Operand::Number(f64::from($eval(n1, n2)?)))?;
        }};
    }

    macro_rules! compare {
        ($eval:expr) => {{
            let n2 = stack.pop()?.as_number()?;
            let n1 = stack.pop()?.as_number()?;
            stack.push(Operand::Boolean($eval(n1, n2)))?;
        }};
    }

    // Bitwise for integers, logical for booleans.
    macro_rules! logical {
        ($eval:expr) => {{
            let n2 = stack.pop()?;
            let n1 = stack.pop()?;

            let res = match (n1, n2) {
                (Operand::Boolean(b1), Operand::Boolean(b2)) => {
                    Operand::Boolean($eval(u8::from(b1), u8::from(b2)) != 0)
                }
                (Operand::Number(_), Operand::Number(_)) => {
                    Operand::Number(f64::from($eval(n1.as_int()?, n2.as_int()?)))
                }
                _ => return Err(Error::TypeError),
            };

            stack.push(res)?;
        }};
    }

    match op {
        Operator::Abs => one_f!(|n: f64| limit(n.abs())),
        Operator::Add => two_f!(|n1: f64, n2: f64| limit(n1 + n2)),
        Operator::Atan => two_f!(|num: f64, den: f64| {
            if num == 0.0 && den == 0.0 {
                return Err(Error::MathError);
            }

            let angle = num.atan2(den).to_degrees().rem_euclid(360.0);

            // Rounding can push tiny negative angles up to 360.
            Ok(if angle >= 360.0 { 0.0 } else { angle })
        }),
        Operator::Ceiling => one_f!(|n: f64| Ok::<_, Error>(n.ceil())),
        Operator::Cos => one_f!(|n: f64| Ok::<_, Error>(n.to_radians().cos())),
        Operator::Cvi => one_f!(|n: f64| {
            let n = n.trunc();

            if n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
                Err(Error::RangeError)
            } else {
                Ok(n)
            }
        }),
        Operator::Cvr => one_f!(|n: f64| Ok::<_, Error>(n)),
        Operator::Div => two_f!(|n1: f64, n2: f64| {
            if n2 == 0.0 {
                Err(Error::MathError)
            } else {
                limit(n1 / n2)
            }
        }),
        Operator::Exp => two_f!(|base: f64, exponent: f64| {
            let res = base.powf(exponent);

            if res.is_finite() {
                Ok(res)
            } else {
                Err(Error::MathError)
            }
        }),
        Operator::Floor => one_f!(|n: f64| Ok::<_, Error>(n.floor())),
        Operator::Idiv => two_i!(|n1: i32, n2: i32| n1.checked_div(n2).ok_or(Error::RangeError)),
        Operator::Ln => one_f!(|n: f64| {
            if n <= 0.0 {
                Err(Error::RangeError)
            } else {
                Ok(n.ln())
            }
        }),
        Operator::Log => one_f!(|n: f64| {
            if n <= 0.0 {
                Err(Error::RangeError)
            } else {
                Ok(n.log10())
            }
        }),
        Operator::Mod => two_i!(|n1: i32, n2: i32| n1.checked_rem(n2).ok_or(Error::RangeError)),
        Operator::Mul => two_f!(|n1: f64, n2: f64| limit(n1 * n2)),
        Operator::Neg => one_f!(|n: f64| limit(-n)),
        Operator::Round => one_f!(|n: f64| Ok::<_, Error>((n + 0.5).floor())),
        Operator::Sin => one_f!(|n: f64| Ok::<_, Error>(n.to_radians().sin())),
        Operator::Sqrt => one_f!(|n: f64| {
            if n < 0.0 {
                Err(Error::RangeError)
            } else {
                Ok(n.sqrt())
            }
        }),
        Operator::Sub => two_f!(|n1: f64, n2: f64| limit(n1 - n2)),
        Operator::Truncate => one_f!(|n: f64| Ok::<_, Error>(n.trunc())),
        Operator::And => logical!(|a, b| a & b),
        Operator::Or => logical!(|a, b| a | b),
        Operator::Xor => logical!(|a, b| a ^ b),
        Operator::Not => {
            let res = match stack.pop()? {
                Operand::Boolean(b) => Operand::Boolean(!b),
                n @ Operand::Number(_) => Operand::Number(f64::from(!n.as_int()?)),
            };

            stack.push(res)?;
        }
        Operator::Bitshift => two_i!(|n: i32, shift: i32| {
            let n = n as u32;

            let res = if shift >= 0 {
                n.checked_shl(shift as u32).unwrap_or(0)
            } else {
                n.checked_shr(shift.unsigned_abs()).unwrap_or(0)
            };

            Ok::<_, Error>(res as i32)
        }),
        Operator::Eq | Operator::Ne => {
            let n2 = stack.pop()?;
            let n1 = stack.pop()?;

            let equal = match (n1, n2) {
                (Operand::Number(n1), Operand::Number(n2)) => n1 == n2,
                (Operand::Boolean(b1), Operand::Boolean(b2)) => b1 == b2,
                _ => return Err(Error::TypeError),
            };

            stack.push(Operand::Boolean(equal == (op == Operator::Eq)))?;
        }
        Operator::Ge => compare!(|n1: f64, n2: f64| n1 >= n2),
        Operator::Gt => compare!(|n1: f64, n2: f64| n1 > n2),
        Operator::Le => compare!(|n1: f64, n2: f64| n1 <= n2),
        Operator::Lt => compare!(|n1: f64, n2: f64| n1 < n2),
        Operator::True => stack.push(Operand::Boolean(true))?,
        Operator::False => stack.push(Operand::Boolean(false))?,
        Operator::Copy => {
            let n = stack.pop()?.as_int()?;
            let len = stack.len();

            let n = usize::try_from(n)
                .ok()
                .filter(|n| *n <= len)
                .ok_or(Error::RangeError)?;

            if len + n > STACK_CAPACITY {
                return Err(Error::StackOverflow);
            }

            for i in len - n..len {
                let operand = stack.live()[i];
                stack.push(operand)?;
            }
        }
        Operator::Dup => {
            let top = stack.peek(0)?;
            stack.push(top)?;
        }
        Operator::Exch => {
            let n2 = stack.pop()?;
            let n1 = stack.pop()?;

            stack.push(n2)?;
            stack.push(n1)?;
        }
        Operator::Index => {
            let n = stack.pop()?.as_int()?;

            let n = usize::try_from(n)
                .ok()
                .filter(|n| *n < stack.len())
                .ok_or(Error::RangeError)?;

            let operand = stack.peek(n)?;
            stack.push(operand)?;
        }
        Operator::Pop => {
            stack.pop()?;
        }
        Operator::Roll => {
            let j = stack.pop()?.as_int()?;
            let n = stack.pop()?.as_int()?;
            let len = stack.len();

            let n = usize::try_from(n)
                .ok()
                .filter(|n| *n <= len)
                .ok_or(Error::RangeError)?;

            let window = &mut stack.live_mut()[len - n..];

            if n > 0 {
                let shift = j.unsigned_abs() as usize % n;

                // Positive amounts move values up towards the top.
                match j.signum() {
                    -1 => window.rotate_left(shift),
                    _ => window.rotate_right(shift),
                }
            }
        }
    }

    Ok(())
}
