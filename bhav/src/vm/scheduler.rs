use std::mem;
use rand::rngs::StdRng;
use tracing::{trace, warn};

use crate::vm::{self, interpreter, Config, Context, Diagnostic, ErrorPolicy, ObjectId, Registry};
use crate::vm::{ScriptBridge, State, World};

/// Runs every entity's threads once per tick, in registration order.
#[derive(Default)]
pub struct Scheduler {
    order: Vec<ObjectId>,
}

/// Borrowed VM state for one scheduler pass.
pub(in crate::vm) struct Pass<'a> {
    pub world: &'a mut World,
    pub resources: &'a vm::Resources,
    pub registry: &'a Registry,
    pub config: &'a Config,
    pub rng: &'a mut StdRng,
    pub bridge: Option<&'a mut (dyn ScriptBridge + 'static)>,
    pub tick: u64,
}

impl Scheduler {
    /// Run one pass.
    ///
    /// Interrupts queued since the last pass are delivered first. Entities created during the
    /// pass first run on the next one. An entity removed during the pass runs no further
    /// threads, even if it was the one running.
    pub(in crate::vm) fn run(&mut self, pass: Pass<'_>, diagnostics: &mut Vec<Diagnostic>) {
        let Pass { world, resources, registry, config, rng, mut bridge, tick } = pass;

        for id in mem::take(&mut world.interrupts) {
            match world.entity_mut(id).and_then(|entity| entity.threads.first_mut()) {
                Some(thread) => thread.interrupt = true,
                None => trace!(%id, "dropped interrupt for missing object"),
            }
        }

        self.order.clear();
        self.order.extend(world.ids());

        for &me in &self.order {
            let Some(entity) = world.entity_mut(me) else { continue };
            let mut threads = mem::take(&mut entity.threads);

            for thread in threads.iter_mut() {
                if thread.state() == State::Idle {
                    continue;
                }

                let id = thread.id;
                let mut cx = Context {
                    world: &mut *world,
                    resources,
                    thread: &mut *thread,
                    rng: &mut *rng,
                    bridge: bridge.as_deref_mut(),
                    me,
                    tick,
                };
                if let Err(error) = interpreter::advance(&mut cx, registry, config) {
                    if config.on_error == ErrorPolicy::Reset {
                        thread.reset();
                    }
                    let diagnostic = Diagnostic::new(error, resources, me, id, tick);
                    warn!("{}", diagnostic);
                    diagnostics.push(diagnostic);
                }

                if !world.contains(me) {
                    break;
                }
            }

            match world.entity_mut(me) {
                Some(entity) => entity.threads = threads,
                None => trace!(%me, threads = threads.len(), "dropped threads of removed object"),
            }
        }
    }
}
