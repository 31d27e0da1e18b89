use std::fmt;
use thiserror::Error;
use tracing::trace;

use project::{Branch, Node};
use crate::vm::{self, code, Config, Context, DataSource, ObjectId, Outcome, Registry, Slots};
use crate::vm::{StepMode, Thread, TreeId};

/// A runtime error, located at the node that raised it.
#[derive(Error)]
#[error("{tree:#06x}+{node}: {kind}")]
pub struct Error {
    pub kind: ErrorKind,
    pub tree: TreeId,
    pub node: u16,
    pub opcode: u16,
}

#[derive(Clone, Debug, Error)]
pub enum ErrorKind {
    /// No primitive for an opcode below the call range.
    #[error("no primitive registered for opcode {0:#06x}")]
    Opcode(u16),
    /// Entity does not exist.
    #[error("object {0} does not exist")]
    Object(ObjectId),
    #[error("unknown tree {0:#06x}")]
    Tree(TreeId),
    #[error("unknown object definition {0}")]
    Definition(u16),
    /// Data source index out of range.
    #[error("{tag:?} index {index} out of bounds")]
    Bounds { tag: DataSource, index: i16 },
    #[error("unknown data source {0}")]
    Source(u8),
    #[error("cannot write to {0:?}")]
    ReadOnly(DataSource),
    #[error("unknown expression operator {0}")]
    Operator(u8),
    /// A malformed operand field.
    #[error("invalid operand value {0}")]
    Operand(u8),
    #[error("flag {0} out of range")]
    Flag(i16),
    #[error("division by 0")]
    DivideByZero,
    /// The loop guard tripped.
    #[error("more than {0} nodes visited without yielding")]
    InfiniteLoop(u32),
    #[error("call stack deeper than {0} frames")]
    StackOverflow(usize),
    /// A node branched to an authored error exit.
    #[error("tree reached an error exit")]
    ErrorExit,
    #[error("node {0} does not exist")]
    Node(u16),
    #[error("no scripting bridge installed")]
    NoBridge,
    #[error("unknown script {0}")]
    Script(u16),
    /// Error from the scripting bridge.
    #[error("script failed: {0}")]
    Bridge(String),
    #[error("no free object ids")]
    Capacity,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}+{}:{:?}", self.tree, self.node, self.kind)
    }
}

/// Run a thread for one tick.
///
/// A suspended thread first polls its continuation. Then nodes run until the thread yields,
/// or for a single node in `StepMode::Single`. A primitive that fails stays current, so a
/// retried thread re-runs it. A runaway thread is unwound to the frame it started the tick in.
/// An error exit leaves the thread idle, since the node that took it has already run.
pub(in crate::vm) fn advance(cx: &mut Context<'_>, registry: &Registry, config: &Config) ->
    Result<(), Error>
{
    let resources = cx.resources;

    if let Some(continuation) = cx.thread.waiting {
        let Some(result) = continuation.poll(cx.tick, &mut cx.thread.interrupt) else {
            return Ok(());
        };
        trace!(me = %cx.me, thread = %cx.thread.id, result, "resumed");
        cx.thread.waiting = None;
        follow(cx.thread, resources, result)?;
    }

    if config.step == StepMode::UntilYield {
        cx.thread.visits = 0;
    }
    let depth = cx.thread.stack.len();

    loop {
        let Some(frame) = cx.thread.stack.last() else {
            cx.thread.visits = 0;
            return Ok(());
        };
        let (tree, index) = (frame.tree, frame.node);
        let node = resources.node(tree, index)
            .map_err(|kind| locate(cx.thread, resources, kind))?;
        let opcode = node.opcode;
        let error = |kind| Error { kind, tree, node: index, opcode };

        cx.thread.visits += 1;
        if cx.thread.visits > config.max_node_visits {
            cx.thread.visits = 0;
            let error = error(ErrorKind::InfiniteLoop(config.max_node_visits));
            cx.thread.unwind(depth);
            return Err(error);
        }

        trace!(me = %cx.me, thread = %cx.thread.id, tree, node = index, opcode, "visit");
        match dispatch(cx, registry, node).map_err(error)? {
            Outcome::True => follow(cx.thread, resources, true)?,
            Outcome::False => follow(cx.thread, resources, false)?,
            Outcome::HaltTrue => {
                trace!(me = %cx.me, thread = %cx.thread.id, "halted");
                cx.thread.reset();
                return Ok(());
            }
            Outcome::Wait(continuation) => {
                cx.thread.waiting = Some(continuation);
                cx.thread.visits = 0;
                return Ok(());
            }
            Outcome::Call { tree: callee, args } => {
                let callee = resources.tree(callee).map_err(error)?;
                if cx.thread.stack.len() >= config.max_stack_depth {
                    cx.thread.unwind(depth);
                    return Err(error(ErrorKind::StackOverflow(config.max_stack_depth)));
                }
                if let Some(caller) = cx.thread.stack.last_mut() {
                    caller.calling = true;
                }
                cx.thread.push(callee, &args);
            }
        }

        if config.step == StepMode::Single {
            return Ok(());
        }
    }
}

/// Branch on `result`, abandoning the stack if the branch is an error exit.
fn follow(thread: &mut Thread, resources: &vm::Resources, result: bool) -> Result<(), Error> {
    let Err(kind) = branch(thread, resources, result) else { return Ok(()) };
    let error = locate(thread, resources, kind);
    if let ErrorKind::ErrorExit = error.kind {
        thread.reset();
    }
    Err(error)
}

/// Locate an error at the thread's current node.
fn locate(thread: &Thread, resources: &vm::Resources, kind: ErrorKind) -> Error {
    let (tree, node) = thread.frame().map_or((0, 0), |frame| (frame.tree, frame.node));
    // Built trees have no dangling node indices, so the fallback is never reported.
    let opcode = resources.node(tree, node).map_or(0, |node| node.opcode);
    Error { kind, tree, node, opcode }
}

/// Execute one node. Call opcodes produce `Outcome::Call` without touching the registry.
fn dispatch(cx: &mut Context<'_>, registry: &Registry, node: &Node) ->
    Result<Outcome, vm::ErrorKind>
{
    let operand = code::Operand::new(&node.operand);

    if code::is_call(node.opcode) {
        // All four arguments set to -1 passes the caller's temporaries through instead.
        let args: Slots = (0..4).map(|i| operand.i16(2 * i)).collect();
        let args = if args.iter().all(|&arg| arg == -1) {
            cx.thread.temps.iter().take(4).copied().collect()
        } else {
            args
        };
        return Ok(Outcome::Call { tree: node.opcode, args });
    }

    let primitive = registry.get(node.opcode)?;
    primitive.execute(cx, operand)
}

/// Follow the current node's branch for `result`.
///
/// Branching to `True` or `False` returns from the tree, and the caller's current node (the
/// call) then branches on that value in turn. A frame that was seeded beneath another rather
/// than called from it starts at its current node instead.
fn branch(thread: &mut Thread, resources: &vm::Resources, mut result: bool) ->
    Result<(), ErrorKind>
{
    loop {
        let Some(frame) = thread.stack.last_mut() else { return Ok(()) };
        let node = resources.node(frame.tree, frame.node)?;
        match if result { node.true_branch } else { node.false_branch } {
            Branch::Node(next) => {
                frame.node = next;
                return Ok(());
            }
            Branch::Error => return Err(ErrorKind::ErrorExit),
            exit => {
                result = exit == Branch::True;
                trace!(thread = %thread.id, result, "return");
                thread.stack.pop();

                match thread.stack.last_mut() {
                    Some(caller) if caller.calling => caller.calling = false,
                    _ => return Ok(()),
                }
            }
        }
    }
}
