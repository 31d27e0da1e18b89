use crate::vm::{code, Context, ErrorKind, Outcome, Primitive};

/// Whether the stack object is an instance of a definition. Operand: definition at 0.
pub struct TestObjectType;

/// Create an instance of a definition and make it the stack object. Operand: definition at 0.
pub struct CreateObject;

impl Primitive for TestObjectType {
    fn name(&self) -> &'static str { "test_object_type" }

    fn execute(&self, cx: &mut Context<'_>, operand: code::Operand<'_>) ->
        Result<Outcome, ErrorKind>
    {
        let id = cx.stack_object();
        let entity = cx.world.entity(id).ok_or(ErrorKind::Object(id))?;
        Ok(Outcome::from(entity.object() == operand.u16(0)))
    }
}

impl Primitive for CreateObject {
    fn name(&self) -> &'static str { "create_object" }

    fn execute(&self, cx: &mut Context<'_>, operand: code::Operand<'_>) ->
        Result<Outcome, ErrorKind>
    {
        let id = cx.world.spawn_instance(cx.resources, operand.u16(0))?;
        cx.thread.set_stack_object(id);
        Ok(Outcome::True)
    }
}
