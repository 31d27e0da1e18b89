use std::fmt;
use tracing::{debug, trace};

use project::entry_point;
use crate::vm::{self, ErrorKind, Thread, ThreadId};
use crate::vm::instance_map::InstanceMap;

/// The entity table: every live object instance, plus global variables.
pub struct World {
    next_id: i16,
    entities: InstanceMap<ObjectId, Entity>,

    globals: Vec<i16>,
    temps: usize,
    pub(in crate::vm) interrupts: Vec<ObjectId>,
}

/// The stable id of an object instance.
///
/// Ids are positive and fit in a data source value, so scripts can store and compare them.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ObjectId(pub i16);

/// A simulated object instance.
pub struct Entity {
    id: ObjectId,
    object: u16,
    pub fields: Vec<i16>,
    pub(in crate::vm) threads: Vec<Thread>,
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl Entity {
    pub fn id(&self) -> ObjectId { self.id }

    /// The index of this entity's object definition.
    pub fn object(&self) -> u16 { self.object }

    pub fn threads(&self) -> &[Thread] { &self.threads }

    pub fn thread_mut(&mut self, id: ThreadId) -> Option<&mut Thread> {
        self.threads.get_mut(id.0 as usize)
    }

    /// The entity's main thread, which receives interrupts.
    pub fn main_thread(&self) -> Option<&Thread> { self.threads.first() }
}

impl World {
    pub fn new(globals: usize, temps: usize) -> World {
        World {
            next_id: 1,
            entities: InstanceMap::default(),

            globals: vec![0; globals],
            temps,
            interrupts: Vec::default(),
        }
    }

    pub fn len(&self) -> usize { self.entities.len() }

    pub fn is_empty(&self) -> bool { self.entities.is_empty() }

    pub fn contains(&self, id: ObjectId) -> bool { self.entities.contains_key(id) }

    pub fn entity(&self, id: ObjectId) -> Option<&Entity> { self.entities.get(id) }

    pub fn entity_mut(&mut self, id: ObjectId) -> Option<&mut Entity> { self.entities.get_mut(id) }

    /// Entity ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ { self.entities.keys() }

    pub fn globals(&self) -> &[i16] { &self.globals }

    pub fn globals_mut(&mut self) -> &mut [i16] { &mut self.globals }

    /// Create an instance of object definition `object`.
    ///
    /// The main thread is seeded with the `main` entry point and then `init` on top of it, so
    /// `init` runs first and `main` picks up when it returns.
    pub fn spawn_instance(&mut self, resources: &vm::Resources, object: u16) ->
        Result<ObjectId, ErrorKind>
    {
        let definition = resources.objects.get(object as usize)
            .ok_or(ErrorKind::Definition(object))?;
        let id = self.allocate_id()?;

        let mut main = Thread::new(ThreadId(0), id, self.temps);
        for name in [entry_point::MAIN, entry_point::INIT] {
            if let Some(tree) = definition.entry_point(name) {
                main.push(resources.tree(tree)?, &[]);
            }
        }

        let fields = vec![0; definition.fields as usize];
        let entity = Entity { id, object, fields, threads: vec![main] };
        self.entities.insert(id, entity);

        debug!(%id, object = %definition.name, "created entity");
        Ok(id)
    }

    /// Remove an entity. Its threads are dropped with it.
    pub fn remove_entity(&mut self, id: ObjectId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        debug!(%id, "removed entity");
        Some(entity)
    }

    pub fn queue_interrupt(&mut self, id: ObjectId) {
        trace!(%id, "queued interrupt");
        self.interrupts.push(id);
    }

    fn allocate_id(&mut self) -> Result<ObjectId, ErrorKind> {
        for _ in 0..i16::MAX {
            let id = ObjectId(self.next_id);
            self.next_id = if self.next_id == i16::MAX { 1 } else { self.next_id + 1 };
            if !self.entities.contains_key(id) {
                return Ok(id);
            }
        }
        Err(ErrorKind::Capacity)
    }
}

#[cfg(test)]
mod tests {
    use project::{Object, Tree, Node, Branch};
    use crate::vm::{self, ObjectId, ErrorKind, World, State};

    fn resources() -> vm::Resources {
        let mut resources = vm::Resources::default();
        let idle = Tree::new(0x100, "idle", 0, 0, vec![Node::new(0, Branch::True, Branch::True)]);
        resources.trees.insert(idle.id, idle);
        resources.objects.push(Object::new("plain", 2));
        resources.objects.push(Object::new("busy", 0).with_entry_point("init", 0x100));
        resources
    }

    #[test]
    fn spawn_and_remove() -> Result<(), ErrorKind> {
        let resources = resources();
        let mut world = World::new(0, 4);

        let a = world.spawn_instance(&resources, 0)?;
        let b = world.spawn_instance(&resources, 1)?;
        assert_eq!((a, b), (ObjectId(1), ObjectId(2)));
        assert_eq!(world.entity(a).map(|e| e.fields.len()), Some(2));
        let state = |id| world.entity(id).and_then(|e| e.main_thread()).map(|t| t.state());
        assert_eq!(state(a), Some(State::Idle));
        assert_eq!(state(b), Some(State::Runnable));

        assert!(world.remove_entity(a).is_some());
        assert!(world.remove_entity(a).is_none());
        assert_eq!(world.ids().collect::<Vec<_>>(), [b]);

        // Removed ids are not handed out again straight away.
        let c = world.spawn_instance(&resources, 0)?;
        assert_eq!(c, ObjectId(3));
        Ok(())
    }

    #[test]
    fn unknown_definition() {
        let mut world = World::new(0, 4);
        let result = world.spawn_instance(&resources(), 7);
        assert!(matches!(result, Err(ErrorKind::Definition(7))));
        assert!(world.is_empty());
    }
}
