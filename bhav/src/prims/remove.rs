use tracing::debug;

use crate::vm::{code, Context, ErrorKind, Outcome, Primitive};

const ME: u8 = 0;
const STACK_OBJECT: u8 = 1;

const RETURN_IMMEDIATELY: u8 = 1 << 0;
const CLEAN_UP_ALL: u8 = 1 << 1;

/// Delete an entity.
///
/// Operand: target at 0 (0 for the running entity, 1 for the stack object), flags at 1.
/// Deleting the running entity halts the thread, since it has no owner left to act for.
pub struct RemoveObject;

impl Primitive for RemoveObject {
    fn name(&self) -> &'static str { "remove_object" }

    fn execute(&self, cx: &mut Context<'_>, operand: code::Operand<'_>) ->
        Result<Outcome, ErrorKind>
    {
        let target = match operand.u8(0) {
            ME => cx.me,
            STACK_OBJECT => cx.stack_object(),
            other => return Err(ErrorKind::Operand(other)),
        };
        let flags = operand.u8(1);

        if cx.world.remove_entity(target).is_none() {
            return Err(ErrorKind::Object(target));
        }
        debug!(
            id = %target,
            return_immediately = flags & RETURN_IMMEDIATELY != 0,
            clean_up_all = flags & CLEAN_UP_ALL != 0,
            "remove object"
        );

        if target == cx.me {
            Ok(Outcome::HaltTrue)
        } else {
            Ok(Outcome::True)
        }
    }
}
