use bstr::BStr;
use tracing::trace;

use crate::prims;
use crate::vm::{code, Context, ErrorKind, Outcome, Primitive, ScriptContext};

const MAX_PARAMS: u8 = 3;

/// Run a script through the host's bridge and branch on its signal.
///
/// Operand: script id at 0, parameter count at 2, then each parameter as a source byte
/// followed by a 16-bit index, starting at 3.
pub struct RunScript;

impl Primitive for RunScript {
    fn name(&self) -> &'static str { "run_script" }

    fn execute(&self, cx: &mut Context<'_>, operand: code::Operand<'_>) ->
        Result<Outcome, ErrorKind>
    {
        let resources = cx.resources;
        let id = operand.u16(0);
        let count = operand.u8(2);
        if count > MAX_PARAMS {
            return Err(ErrorKind::Operand(count));
        }

        let mut params = [None; MAX_PARAMS as usize];
        for (i, param) in params.iter_mut().enumerate().take(count as usize) {
            let at = 3 + 3 * i;
            *param = Some(prims::read(cx, operand, at + 1, at)?);
        }

        let script = resources.scripts.get(&id).ok_or(ErrorKind::Script(id))?;
        let bridge = cx.bridge.take().ok_or(ErrorKind::NoBridge)?;
        trace!(script = %script.name, ?params, "run script");

        let name = BStr::new(&script.name);
        let source = BStr::new(&script.source);
        let result = bridge.run(name, source, params, &mut ScriptContext::new(cx));
        cx.bridge = Some(bridge);

        let signal = result.map_err(ErrorKind::Bridge)?;
        Ok(Outcome::from(bool::from(signal)))
    }
}
