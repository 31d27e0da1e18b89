use crate::vm::{code, Context, ErrorKind, Outcome, Primitive};

/// Wake the stack object's main thread from a sleep, starting on the next tick.
pub struct NotifyOutOfIdle;

impl Primitive for NotifyOutOfIdle {
    fn name(&self) -> &'static str { "notify_out_of_idle" }

    fn execute(&self, cx: &mut Context<'_>, _: code::Operand<'_>) -> Result<Outcome, ErrorKind> {
        let id = cx.stack_object();
        if !cx.world.contains(id) {
            return Err(ErrorKind::Object(id));
        }
        cx.world.queue_interrupt(id);
        Ok(Outcome::True)
    }
}
