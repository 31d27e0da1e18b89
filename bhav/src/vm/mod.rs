use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

use project::{Node, Object, Script, Tree};

pub use crate::vm::interpreter::{Error, ErrorKind};
pub use crate::vm::world::{World, Entity, ObjectId};
pub use crate::vm::thread::{Thread, Frame, ThreadId, State, Slots};
pub use crate::vm::primitive::{Primitive, Registry, Outcome, Context};
pub use crate::vm::data::DataSource;
pub use crate::vm::continuation::Continuation;
pub use crate::vm::debug::Diagnostic;
pub use crate::vm::bridge::{ScriptBridge, ScriptContext, Signal};
pub use crate::vm::scheduler::Scheduler;

pub mod code;
pub mod debug;
mod world;
mod instance_map;
mod thread;
mod interpreter;
mod primitive;
mod data;
mod continuation;
mod bridge;
mod scheduler;

/// A tree's id, which is also the opcode that calls it.
pub type TreeId = u16;

/// The immutable assets a `Vm` executes.
#[derive(Default)]
pub struct Resources {
    pub trees: FxHashMap<TreeId, Tree>,
    pub objects: Vec<Object>,
    pub scripts: FxHashMap<u16, Script>,
    pub globals: usize,
}

/// Errors detected while assembling a `Vm`, before any tick runs.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("tree id {0:#06x} is below the call range")]
    TreeId(TreeId),
    #[error("tree {0:#06x} is defined twice")]
    DuplicateTree(TreeId),
    #[error("tree {0:#06x} has no nodes")]
    EmptyTree(TreeId),
    #[error("tree {tree:#06x} node {node}: no primitive registered for opcode {opcode:#06x}")]
    Unregistered { tree: TreeId, node: u16, opcode: u16 },
    #[error("tree {tree:#06x} node {node}: call to unknown tree {opcode:#06x}")]
    UnknownCall { tree: TreeId, node: u16, opcode: u16 },
    #[error("tree {tree:#06x} node {node}: branch target out of range")]
    Branch { tree: TreeId, node: u16 },
    #[error("object {object}: entry point {name} refers to unknown tree {tree:#06x}")]
    EntryPoint { object: usize, name: String, tree: TreeId },
    #[error("script {0} is defined twice")]
    DuplicateScript(u16),
    #[error("opcode {0:#06x} is outside the primitive range")]
    PrimitiveRange(u16),
    #[error("opcode {0:#06x} is already registered")]
    Duplicate(u16),
    #[error("primitives cannot be registered after the first tick")]
    Frozen,
}

/// Interpreter limits and policies.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Node visits a thread may make without yielding before it is stopped as a runaway.
    pub max_node_visits: u32,
    /// Frames a thread's stack may hold before a call fails.
    pub max_stack_depth: usize,
    pub step: StepMode,
    /// Seed for the random number primitive.
    pub seed: u64,
    /// Number of temporaries per thread.
    pub temps: usize,
    pub on_error: ErrorPolicy,
}

/// How far a thread advances in one tick.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Run nodes until the thread suspends, goes idle or fails.
    #[default]
    UntilYield,
    /// Advance exactly one node.
    Single,
}

/// What happens to a thread's stack after it reports an error.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Keep the stack; the failing node runs again next tick. Error exits still reset.
    #[default]
    Retry,
    /// Abandon the stack, leaving the thread idle.
    Reset,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_node_visits: 10_000,
            max_stack_depth: 64,
            step: StepMode::default(),
            seed: 0,
            temps: 20,
            on_error: ErrorPolicy::default(),
        }
    }
}

impl Resources {
    pub fn tree(&self, id: TreeId) -> Result<&Tree, ErrorKind> {
        self.trees.get(&id).ok_or(ErrorKind::Tree(id))
    }

    pub fn node(&self, tree: TreeId, node: u16) -> Result<&Node, ErrorKind> {
        self.tree(tree)?.nodes.get(node as usize).ok_or(ErrorKind::Node(node))
    }
}

/// The execution root: entities, their threads, and the global clock.
pub struct Vm {
    resources: Resources,
    registry: Registry,
    config: Config,

    world: World,
    scheduler: Scheduler,
    bridge: Option<Box<dyn ScriptBridge>>,
    rng: StdRng,

    diagnostics: Vec<Diagnostic>,
    tick: u64,
}

impl Vm {
    pub fn new(resources: Resources, registry: Registry, config: Config) -> Vm {
        let world = World::new(resources.globals, config.temps);
        let rng = StdRng::seed_from_u64(config.seed);
        Vm {
            resources,
            registry,
            config,

            world,
            scheduler: Scheduler::default(),
            bridge: None,
            rng,

            diagnostics: Vec::default(),
            tick: 0,
        }
    }

    pub fn world(&self) -> &World { &self.world }

    pub fn tick_count(&self) -> u64 { self.tick }

    /// Register an additional primitive. Only allowed before the first tick.
    pub fn register<P: Primitive + 'static>(&mut self, opcode: u16, primitive: P) ->
        Result<(), BuildError>
    {
        if self.tick > 0 {
            return Err(BuildError::Frozen);
        }
        self.registry.register(opcode, primitive)
    }

    pub fn set_bridge<B: ScriptBridge + 'static>(&mut self, bridge: B) {
        self.bridge = Some(Box::new(bridge));
    }

    /// Place a new instance of an object definition, seeding its main thread.
    pub fn add_entity(&mut self, object: u16) -> Result<ObjectId, ErrorKind> {
        self.world.spawn_instance(&self.resources, object)
    }

    pub fn remove_entity(&mut self, id: ObjectId) -> bool {
        self.world.remove_entity(id).is_some()
    }

    pub fn get_entity_by_id(&self, id: ObjectId) -> Option<&Entity> { self.world.entity(id) }

    pub fn get_entity_mut(&mut self, id: ObjectId) -> Option<&mut Entity> {
        self.world.entity_mut(id)
    }

    /// Start an additional thread on an entity, running `tree`.
    pub fn spawn(&mut self, id: ObjectId, tree: TreeId, args: &[i16]) ->
        Result<ThreadId, ErrorKind>
    {
        let tree = self.resources.tree(tree)?;
        let temps = self.config.temps;
        let entity = self.world.entity_mut(id).ok_or(ErrorKind::Object(id))?;

        let thread_id = ThreadId(entity.threads.len() as u32);
        let mut thread = Thread::new(thread_id, id, temps);
        thread.push(tree, args);
        entity.threads.push(thread);

        debug!(%id, thread = %thread_id, tree = %tree.name, "spawned thread");
        Ok(thread_id)
    }

    /// Push `tree` onto an existing thread.
    ///
    /// Any wait is abandoned. Once `tree` returns, the frame beneath runs its current node again.
    pub fn invoke(&mut self, id: ObjectId, thread: ThreadId, tree: TreeId, args: &[i16]) ->
        Result<(), ErrorKind>
    {
        let tree = self.resources.tree(tree)?;
        let entity = self.world.entity_mut(id).ok_or(ErrorKind::Object(id))?;
        let thread = entity.thread_mut(thread).ok_or(ErrorKind::Object(id))?;
        thread.waiting = None;
        thread.push(tree, args);
        Ok(())
    }

    /// Queue an interrupt for an entity's main thread, applied at the start of the next tick.
    pub fn interrupt(&mut self, id: ObjectId) {
        self.world.queue_interrupt(id);
    }

    pub fn global(&self, index: usize) -> Option<i16> { self.world.globals().get(index).copied() }

    pub fn set_global(&mut self, index: usize, value: i16) -> Result<(), ErrorKind> {
        let slot = self.world.globals_mut().get_mut(index).ok_or(ErrorKind::Bounds {
            tag: DataSource::Global,
            index: index as i16,
        })?;
        *slot = value;
        Ok(())
    }

    /// Errors reported by threads since the last call to `take_diagnostics`.
    pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> { std::mem::take(&mut self.diagnostics) }

    /// Advance the clock by one tick and run one scheduler pass over every entity.
    pub fn tick(&mut self) {
        self.tick += 1;

        let Vm { resources, registry, config, world, scheduler, bridge, rng, diagnostics, tick } =
            self;
        debug!(tick = *tick, entities = world.len(), "tick");

        let pass = scheduler::Pass {
            world,
            resources,
            registry,
            config,
            rng,
            bridge: bridge.as_deref_mut(),
            tick: *tick,
        };
        scheduler.run(pass, diagnostics);
    }
}
