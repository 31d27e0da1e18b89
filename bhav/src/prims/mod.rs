//! The built-in primitives.
//!
//! Operands refer to values through a data source tag byte paired with a 16-bit index, so
//! most primitives read and write through `read` and `write` below.

use std::convert::TryFrom;

use crate::vm::{code, Context, DataSource, ErrorKind, Registry};

pub use self::sleep::Sleep;
pub use self::expression::{Expression, Operator};
pub use self::random::Random;
pub use self::remove::RemoveObject;
pub use self::object::{CreateObject, TestObjectType};
pub use self::idle::NotifyOutOfIdle;
pub use self::script::RunScript;

mod sleep;
mod expression;
mod random;
mod remove;
mod object;
mod idle;
mod script;

/// Install every built-in primitive at its standard opcode.
pub fn register(registry: &mut Registry) {
    use crate::vm::code::op;

    registry.insert(op::SLEEP, Sleep);
    registry.insert(op::EXPRESSION, Expression);
    registry.insert(op::RANDOM, Random);
    registry.insert(op::REMOVE_OBJECT, RemoveObject);
    registry.insert(op::TEST_OBJECT_TYPE, TestObjectType);
    registry.insert(op::CREATE_OBJECT, CreateObject);
    registry.insert(op::NOTIFY_OUT_OF_IDLE, NotifyOutOfIdle);
    registry.insert(op::RUN_SCRIPT, RunScript);
}

/// Read the value whose tag is at operand byte `tag` and index at bytes `data..data + 2`.
pub(crate) fn read(cx: &Context<'_>, operand: code::Operand<'_>, data: usize, tag: usize) ->
    Result<i16, ErrorKind>
{
    let source = DataSource::try_from(operand.u8(tag))?;
    cx.read(source, operand.i16(data))
}

pub(crate) fn write(
    cx: &mut Context<'_>, operand: code::Operand<'_>, data: usize, tag: usize, value: i16
) -> Result<(), ErrorKind> {
    let source = DataSource::try_from(operand.u8(tag))?;
    cx.write(source, operand.i16(data), value)
}
