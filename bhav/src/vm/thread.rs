use std::{cmp, fmt};
use smallvec::SmallVec;

use project::Tree;
use crate::vm::{Continuation, ObjectId, TreeId};

/// Fixed-size storage for arguments, locals and temporaries.
pub type Slots = SmallVec<[i16; 8]>;

/// A thread's index within its entity. Thread 0 is the main thread.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct ThreadId(pub u32);

/// A cooperative thread of behavior tree execution.
pub struct Thread {
    pub(in crate::vm) id: ThreadId,
    pub(in crate::vm) stack: Vec<Frame>,

    /// The entity this thread currently acts upon.
    pub(in crate::vm) stack_object: ObjectId,
    pub(in crate::vm) temps: Slots,

    pub(in crate::vm) interrupt: bool,
    pub(in crate::vm) waiting: Option<Continuation>,
    /// Node visits since the thread last yielded.
    pub(in crate::vm) visits: u32,
}

/// One activation of a tree.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Frame {
    pub tree: TreeId,
    /// Index of the current node.
    pub node: u16,
    pub args: Slots,
    pub locals: Slots,
    /// Whether the current node is a call waiting on the frame above.
    pub(in crate::vm) calling: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    /// The stack is empty.
    Idle,
    Runnable,
    /// A continuation must allow the thread to resume.
    Suspended,
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl Frame {
    /// Activate `tree`, binding as many of `args` as it declares. Missing arguments are zero.
    pub fn new(tree: &Tree, args: &[i16]) -> Frame {
        let mut bound = Slots::from_elem(0, tree.args as usize);
        let len = cmp::min(bound.len(), args.len());
        bound[..len].copy_from_slice(&args[..len]);

        Frame {
            tree: tree.id,
            node: 0,
            args: bound,
            locals: Slots::from_elem(0, tree.locals as usize),
            calling: false,
        }
    }
}

impl Thread {
    pub fn new(id: ThreadId, owner: ObjectId, temps: usize) -> Thread {
        Thread {
            id,
            stack: Vec::default(),

            stack_object: owner,
            temps: Slots::from_elem(0, temps),

            interrupt: false,
            waiting: None,
            visits: 0,
        }
    }

    pub fn id(&self) -> ThreadId { self.id }

    pub fn state(&self) -> State {
        if self.waiting.is_some() {
            State::Suspended
        } else if self.stack.is_empty() {
            State::Idle
        } else {
            State::Runnable
        }
    }

    pub fn stack(&self) -> &[Frame] { &self.stack }

    pub fn frame(&self) -> Option<&Frame> { self.stack.last() }

    pub fn push(&mut self, tree: &Tree, args: &[i16]) {
        self.stack.push(Frame::new(tree, args));
    }

    pub fn stack_object(&self) -> ObjectId { self.stack_object }

    pub fn set_stack_object(&mut self, id: ObjectId) { self.stack_object = id; }

    pub fn temps(&self) -> &[i16] { &self.temps }

    /// Whether an interrupt is pending, not yet consumed by a continuation.
    pub fn interrupted(&self) -> bool { self.interrupt }

    /// Drop every frame above `depth`, so the frame left on top runs its current node again.
    pub(in crate::vm) fn unwind(&mut self, depth: usize) {
        self.stack.truncate(depth);
        if let Some(frame) = self.stack.last_mut() {
            frame.calling = false;
        }
    }

    /// Abandon the whole stack, leaving the thread idle.
    pub(in crate::vm) fn reset(&mut self) {
        self.stack.clear();
        self.waiting = None;
        self.visits = 0;
    }
}

#[cfg(test)]
mod tests {
    use project::{Tree, Node, Branch};
    use crate::vm::{Continuation, ObjectId, Thread, ThreadId, State};

    #[test]
    fn bind_arguments() {
        let tree = Tree::new(0x100, "three", 3, 2, vec![Node::new(0, Branch::True, Branch::True)]);
        let mut thread = Thread::new(ThreadId(0), ObjectId(1), 4);
        assert_eq!(thread.state(), State::Idle);

        thread.push(&tree, &[7, 8]);
        thread.push(&tree, &[1, 2, 3, 4, 5]);
        assert_eq!(thread.state(), State::Runnable);
        assert_eq!(&thread.stack()[0].args[..], [7, 8, 0]);
        assert_eq!(&thread.stack()[1].args[..], [1, 2, 3]);
        assert_eq!(&thread.stack()[1].locals[..], [0, 0]);

        thread.waiting = Some(Continuation::Sleep { until: 5 });
        assert_eq!(thread.state(), State::Suspended);

        thread.waiting = None;
        thread.stack[0].calling = true;
        thread.unwind(1);
        assert_eq!(thread.stack().len(), 1);
        assert!(!thread.stack()[0].calling);

        thread.reset();
        assert_eq!(thread.state(), State::Idle);
        assert_eq!(thread.stack_object(), ObjectId(1));
    }
}
