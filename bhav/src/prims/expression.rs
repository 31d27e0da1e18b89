use std::convert::TryFrom;

use crate::prims;
use crate::vm::{code, Context, ErrorKind, Outcome, Primitive};

/// Compare or update a value.
///
/// Operand: lhs index at 0, rhs index at 2, operator at 5, lhs source at 6, rhs source at 7.
/// Comparisons leave both sides alone. Assignments write back to the lhs and succeed.
pub struct Expression;

#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Operator {
    Gt = 0,
    Lt,
    Eq,
    Add,
    Sub,
    Assign,
    Mul,
    Div,
    /// Whether the 1-based flag bit `rhs` is set in `lhs`.
    FlagTest,
    FlagSet,
    FlagClear,
    /// Increment `lhs`, then compare it with `<`.
    IncLt,
    Rem,
    BitAnd,
    Ne,
    Le,
    Ge,
    /// Decrement `lhs`, then compare it with `>`.
    DecGt,
    BitOr,
    BitXor,
    And,
    Or,
    Xor,
}

impl TryFrom<u8> for Operator {
    type Error = ErrorKind;

    fn try_from(op: u8) -> Result<Self, Self::Error> {
        use Operator::*;

        const ALL: [Operator; 23] = [
            Gt, Lt, Eq, Add, Sub, Assign, Mul, Div, FlagTest, FlagSet, FlagClear, IncLt,
            Rem, BitAnd, Ne, Le, Ge, DecGt, BitOr, BitXor, And, Or, Xor,
        ];
        ALL.get(op as usize).copied().ok_or(ErrorKind::Operator(op))
    }
}

fn flag(index: i16) -> Result<i16, ErrorKind> {
    match index {
        1..=16 => Ok((1u16 << (index - 1)) as i16),
        _ => Err(ErrorKind::Flag(index)),
    }
}

impl Operator {
    /// Apply the operator, returning the value to store back into `lhs` (if any) and the
    /// node's result. Arithmetic wraps at 16 bits.
    pub fn evaluate(self, lhs: i16, rhs: i16) -> Result<(Option<i16>, bool), ErrorKind> {
        use Operator::*;

        let (store, result) = match self {
            Gt => (None, lhs > rhs),
            Lt => (None, lhs < rhs),
            Eq => (None, lhs == rhs),
            Ne => (None, lhs != rhs),
            Le => (None, lhs <= rhs),
            Ge => (None, lhs >= rhs),

            Add => (Some(lhs.wrapping_add(rhs)), true),
            Sub => (Some(lhs.wrapping_sub(rhs)), true),
            Assign => (Some(rhs), true),
            Mul => (Some(lhs.wrapping_mul(rhs)), true),
            Div | Rem if rhs == 0 => return Err(ErrorKind::DivideByZero),
            Div => (Some(lhs.wrapping_div(rhs)), true),
            Rem => (Some(lhs.wrapping_rem(rhs)), true),
            BitAnd => (Some(lhs & rhs), true),
            BitOr => (Some(lhs | rhs), true),
            BitXor => (Some(lhs ^ rhs), true),

            FlagTest => (None, lhs & flag(rhs)? != 0),
            FlagSet => (Some(lhs | flag(rhs)?), true),
            FlagClear => (Some(lhs & !flag(rhs)?), true),

            IncLt => {
                let lhs = lhs.wrapping_add(1);
                (Some(lhs), lhs < rhs)
            }
            DecGt => {
                let lhs = lhs.wrapping_sub(1);
                (Some(lhs), lhs > rhs)
            }

            And => (None, lhs != 0 && rhs != 0),
            Or => (None, lhs != 0 || rhs != 0),
            Xor => (None, (lhs != 0) != (rhs != 0)),
        };
        Ok((store, result))
    }
}

impl Primitive for Expression {
    fn name(&self) -> &'static str { "expression" }

    fn execute(&self, cx: &mut Context<'_>, operand: code::Operand<'_>) ->
        Result<Outcome, ErrorKind>
    {
        let op = Operator::try_from(operand.u8(5))?;
        let lhs = prims::read(cx, operand, 0, 6)?;
        let rhs = prims::read(cx, operand, 2, 7)?;

        let (store, result) = op.evaluate(lhs, rhs)?;
        if let Some(value) = store {
            prims::write(cx, operand, 0, 6, value)?;
        }
        Ok(Outcome::from(result))
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;
    use crate::prims::Operator;
    use crate::vm::ErrorKind;

    #[test]
    fn decode() {
        assert_eq!(Operator::try_from(0).ok(), Some(Operator::Gt));
        assert_eq!(Operator::try_from(11).ok(), Some(Operator::IncLt));
        assert_eq!(Operator::try_from(22).ok(), Some(Operator::Xor));
        assert!(matches!(Operator::try_from(23), Err(ErrorKind::Operator(23))));
    }

    #[test]
    fn comparisons() -> Result<(), ErrorKind> {
        assert_eq!(Operator::Gt.evaluate(3, 2)?, (None, true));
        assert_eq!(Operator::Lt.evaluate(3, 2)?, (None, false));
        assert_eq!(Operator::Le.evaluate(2, 2)?, (None, true));
        assert_eq!(Operator::Ne.evaluate(2, 2)?, (None, false));
        assert_eq!(Operator::Xor.evaluate(5, 0)?, (None, true));
        assert_eq!(Operator::And.evaluate(5, 0)?, (None, false));
        Ok(())
    }

    #[test]
    fn arithmetic() -> Result<(), ErrorKind> {
        assert_eq!(Operator::Add.evaluate(i16::MAX, 1)?, (Some(i16::MIN), true));
        assert_eq!(Operator::Mul.evaluate(10, 2)?, (Some(20), true));
        assert_eq!(Operator::Div.evaluate(i16::MIN, -1)?, (Some(i16::MIN), true));
        assert_eq!(Operator::Rem.evaluate(-7, 3)?, (Some(-1), true));
        assert!(matches!(Operator::Div.evaluate(1, 0), Err(ErrorKind::DivideByZero)));
        assert!(matches!(Operator::Rem.evaluate(1, 0), Err(ErrorKind::DivideByZero)));
        assert_eq!(Operator::IncLt.evaluate(4, 5)?, (Some(5), false));
        assert_eq!(Operator::DecGt.evaluate(4, 2)?, (Some(3), true));
        Ok(())
    }

    #[test]
    fn flags() -> Result<(), ErrorKind> {
        assert_eq!(Operator::FlagSet.evaluate(0, 1)?, (Some(1), true));
        assert_eq!(Operator::FlagSet.evaluate(0, 16)?, (Some(i16::MIN), true));
        assert_eq!(Operator::FlagClear.evaluate(0b110, 2)?, (Some(0b100), true));
        assert_eq!(Operator::FlagTest.evaluate(0b100, 3)?, (None, true));
        assert_eq!(Operator::FlagTest.evaluate(0b100, 2)?, (None, false));
        assert!(matches!(Operator::FlagTest.evaluate(0, 0), Err(ErrorKind::Flag(0))));
        assert!(matches!(Operator::FlagSet.evaluate(0, 17), Err(ErrorKind::Flag(17))));
        Ok(())
    }
}
