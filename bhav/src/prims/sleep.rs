use std::cmp;

use crate::prims;
use crate::vm::{code, Context, Continuation, ErrorKind, Outcome, Primitive};

/// Suspend the thread for a number of ticks.
///
/// Operand: duration index at 0, duration source at 2. Negative durations sleep for zero
/// ticks, which still yields until the next tick.
pub struct Sleep;

impl Primitive for Sleep {
    fn name(&self) -> &'static str { "sleep" }

    fn execute(&self, cx: &mut Context<'_>, operand: code::Operand<'_>) ->
        Result<Outcome, ErrorKind>
    {
        let ticks = prims::read(cx, operand, 0, 2)?;
        let until = cx.tick + cmp::max(ticks, 0) as u64;
        Ok(Outcome::Wait(Continuation::Sleep { until }))
    }
}
