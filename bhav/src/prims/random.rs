use rand::Rng;

use crate::prims;
use crate::vm::{code, Context, ErrorKind, Outcome, Primitive};

/// Store a uniformly distributed value in `0..bound`.
///
/// Operand: bound index at 0, bound source at 2, destination index at 4, destination source
/// at 6. A bound of zero or less stores 0.
pub struct Random;

impl Primitive for Random {
    fn name(&self) -> &'static str { "random" }

    fn execute(&self, cx: &mut Context<'_>, operand: code::Operand<'_>) ->
        Result<Outcome, ErrorKind>
    {
        let bound = prims::read(cx, operand, 0, 2)?;
        let value = if bound > 0 { cx.rng.random_range(0..bound) } else { 0 };
        prims::write(cx, operand, 4, 6, value)?;
        Ok(Outcome::True)
    }
}
