use rand::rngs::StdRng;
use rustc_hash::FxHashMap;

use crate::vm::{self, code, BuildError, Continuation, ErrorKind, ObjectId, ScriptBridge, Slots};
use crate::vm::{Thread, TreeId, World};

/// The result of executing one node.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Outcome {
    True,
    False,
    /// Abandon the thread's whole stack. Used when an entity deletes itself.
    HaltTrue,
    /// Suspend the thread until the continuation allows it to resume.
    Wait(Continuation),
    /// Push a frame for another tree.
    Call { tree: TreeId, args: Slots },
}

/// The handler for one opcode.
pub trait Primitive {
    fn name(&self) -> &'static str;

    fn execute(&self, cx: &mut Context<'_>, operand: code::Operand<'_>) ->
        Result<Outcome, ErrorKind>;
}

/// Everything a primitive may observe or mutate while its thread runs.
pub struct Context<'a> {
    pub world: &'a mut World,
    pub resources: &'a vm::Resources,
    pub thread: &'a mut Thread,
    pub rng: &'a mut StdRng,
    pub(crate) bridge: Option<&'a mut (dyn ScriptBridge + 'static)>,

    /// The entity that owns the running thread.
    pub me: ObjectId,
    pub tick: u64,
}

/// The opcode dispatch table.
#[derive(Default)]
pub struct Registry {
    primitives: FxHashMap<u16, Box<dyn Primitive>>,
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self { if value { Outcome::True } else { Outcome::False } }
}

impl Context<'_> {
    /// The entity the thread currently acts upon.
    pub fn stack_object(&self) -> ObjectId { self.thread.stack_object }
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    /// A registry holding every built-in primitive.
    pub fn with_builtins() -> Self {
        let mut registry = Self::default();
        crate::prims::register(&mut registry);
        registry
    }

    pub fn len(&self) -> usize { self.primitives.len() }

    pub fn is_empty(&self) -> bool { self.primitives.is_empty() }

    pub fn contains(&self, opcode: u16) -> bool { self.primitives.contains_key(&opcode) }

    pub fn register<P: Primitive + 'static>(&mut self, opcode: u16, primitive: P) ->
        Result<(), BuildError>
    {
        if opcode >= code::CALL_BASE {
            return Err(BuildError::PrimitiveRange(opcode));
        }
        if self.contains(opcode) {
            return Err(BuildError::Duplicate(opcode));
        }
        self.insert(opcode, primitive);
        Ok(())
    }

    pub(crate) fn insert<P: Primitive + 'static>(&mut self, opcode: u16, primitive: P) {
        self.primitives.insert(opcode, Box::new(primitive));
    }

    pub fn get(&self, opcode: u16) -> Result<&dyn Primitive, ErrorKind> {
        let primitive = self.primitives.get(&opcode).ok_or(ErrorKind::Opcode(opcode))?;
        Ok(&**primitive)
    }
}

#[cfg(test)]
mod tests {
    use std::ptr;
    use crate::vm::{code, BuildError, Context, ErrorKind, Outcome, Primitive, Registry};

    struct Nop;

    impl Primitive for Nop {
        fn name(&self) -> &'static str { "nop" }

        fn execute(&self, _: &mut Context<'_>, _: code::Operand<'_>) -> Result<Outcome, ErrorKind> {
            Ok(Outcome::True)
        }
    }

    #[test]
    fn lookup() -> Result<(), BuildError> {
        let mut registry = Registry::new();
        registry.register(0x40, Nop)?;

        let a = registry.get(0x40).ok().map(|p| ptr::from_ref(p).cast::<()>());
        let b = registry.get(0x40).ok().map(|p| ptr::from_ref(p).cast::<()>());
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(registry.get(0x40).map(|p| p.name()).ok(), Some("nop"));

        assert!(matches!(registry.get(0x41), Err(ErrorKind::Opcode(0x41))));
        assert!(matches!(registry.register(0x40, Nop), Err(BuildError::Duplicate(0x40))));
        assert!(matches!(registry.register(0x100, Nop), Err(BuildError::PrimitiveRange(0x100))));
        Ok(())
    }

    #[test]
    fn builtins() {
        let registry = Registry::with_builtins();
        for opcode in code::op::ALL {
            assert!(registry.contains(opcode), "opcode {:#06x} is not registered", opcode);
        }
        assert_eq!(registry.len(), code::op::ALL.len());
    }
}
