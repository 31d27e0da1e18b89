use std::convert::TryFrom;

use crate::vm::{Context, ErrorKind, ObjectId};

/// Where a primitive operand's value lives.
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DataSource {
    /// The operand itself. Read-only.
    Literal = 0,
    /// The thread's temporaries.
    Temp = 1,
    /// The current frame's arguments.
    Param = 2,
    /// The current frame's locals.
    Local = 3,
    /// A field of the entity running the thread.
    MyField = 4,
    /// A field of the thread's stack object.
    StackObjectField = 5,
    Global = 6,
    /// The id of the thread's stack object. Writing it retargets the thread.
    StackObjectId = 7,
}

impl TryFrom<u8> for DataSource {
    type Error = ErrorKind;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            0 => DataSource::Literal,
            1 => DataSource::Temp,
            2 => DataSource::Param,
            3 => DataSource::Local,
            4 => DataSource::MyField,
            5 => DataSource::StackObjectField,
            6 => DataSource::Global,
            7 => DataSource::StackObjectId,
            _ => return Err(ErrorKind::Source(tag)),
        })
    }
}

// Negative indices map past the end of any slice.
fn position(index: i16) -> usize { usize::try_from(index).unwrap_or(usize::MAX) }

fn slot(slots: &[i16], tag: DataSource, index: i16) -> Result<&i16, ErrorKind> {
    slots.get(position(index)).ok_or(ErrorKind::Bounds { tag, index })
}

fn slot_mut(slots: &mut [i16], tag: DataSource, index: i16) -> Result<&mut i16, ErrorKind> {
    slots.get_mut(position(index)).ok_or(ErrorKind::Bounds { tag, index })
}

impl Context<'_> {
    /// Resolve a data source to its current value.
    pub fn read(&self, tag: DataSource, index: i16) -> Result<i16, ErrorKind> {
        let value = match tag {
            DataSource::Literal => index,
            DataSource::Temp => *slot(&self.thread.temps, tag, index)?,
            DataSource::Param => *slot(&self.frame(tag, index)?.args, tag, index)?,
            DataSource::Local => *slot(&self.frame(tag, index)?.locals, tag, index)?,
            DataSource::MyField => *slot(self.fields(self.me)?, tag, index)?,
            DataSource::StackObjectField => *slot(self.fields(self.stack_object())?, tag, index)?,
            DataSource::Global => *slot(self.world.globals(), tag, index)?,
            DataSource::StackObjectId => self.stack_object().0,
        };
        Ok(value)
    }

    /// Store a value into a data source.
    pub fn write(&mut self, tag: DataSource, index: i16, value: i16) -> Result<(), ErrorKind> {
        let target = match tag {
            DataSource::Literal => return Err(ErrorKind::ReadOnly(tag)),
            DataSource::Temp => slot_mut(&mut self.thread.temps, tag, index)?,
            DataSource::Param => {
                let frame = self.thread.stack.last_mut().ok_or(ErrorKind::Bounds { tag, index })?;
                slot_mut(&mut frame.args, tag, index)?
            }
            DataSource::Local => {
                let frame = self.thread.stack.last_mut().ok_or(ErrorKind::Bounds { tag, index })?;
                slot_mut(&mut frame.locals, tag, index)?
            }
            DataSource::MyField => slot_mut(self.fields_mut(self.me)?, tag, index)?,
            DataSource::StackObjectField => {
                let id = self.stack_object();
                slot_mut(self.fields_mut(id)?, tag, index)?
            }
            DataSource::Global => slot_mut(self.world.globals_mut(), tag, index)?,
            DataSource::StackObjectId => {
                self.thread.stack_object = ObjectId(value);
                return Ok(());
            }
        };
        *target = value;
        Ok(())
    }

    fn frame(&self, tag: DataSource, index: i16) -> Result<&crate::vm::Frame, ErrorKind> {
        self.thread.stack.last().ok_or(ErrorKind::Bounds { tag, index })
    }

    fn fields(&self, id: ObjectId) -> Result<&[i16], ErrorKind> {
        let entity = self.world.entity(id).ok_or(ErrorKind::Object(id))?;
        Ok(&entity.fields)
    }

    fn fields_mut(&mut self, id: ObjectId) -> Result<&mut [i16], ErrorKind> {
        let entity = self.world.entity_mut(id).ok_or(ErrorKind::Object(id))?;
        Ok(&mut entity.fields)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use project::{Object, Tree, Node, Branch};
    use crate::vm::{self, Context, DataSource, ErrorKind, ObjectId, World};

    fn resources() -> vm::Resources {
        let mut resources = vm::Resources::default();
        let tree = Tree::new(0x100, "frame", 2, 3, vec![Node::new(0, Branch::True, Branch::True)]);
        resources.trees.insert(tree.id, tree);
        resources.objects.push(Object::new("thing", 4).with_entry_point("main", 0x100));
        resources.globals = 5;
        resources
    }

    #[test]
    fn round_trip() -> Result<(), ErrorKind> {
        let resources = resources();
        let mut world = World::new(resources.globals, 6);
        let me = world.spawn_instance(&resources, 0)?;
        let other = world.spawn_instance(&resources, 0)?;

        let mut threads = world.entity_mut(me).map(|e| std::mem::take(&mut e.threads));
        let thread = threads.as_mut().and_then(|threads| threads.first_mut()).ok_or(ErrorKind::Object(me))?;
        let mut rng = StdRng::seed_from_u64(0);
        let mut cx = Context {
            world: &mut world, resources: &resources, thread, rng: &mut rng, bridge: None,
            me, tick: 1,
        };

        cx.write(DataSource::StackObjectId, 0, other.0)?;
        assert_eq!(cx.stack_object(), other);

        let kinds = [
            (DataSource::Temp, 5),
            (DataSource::Param, 1),
            (DataSource::Local, 2),
            (DataSource::MyField, 3),
            (DataSource::StackObjectField, 0),
            (DataSource::Global, 4),
        ];
        for (i, &(tag, index)) in kinds.iter().enumerate() {
            let value = -100 - i as i16;
            cx.write(tag, index, value)?;
            assert_eq!(cx.read(tag, index)?, value, "{:?}", tag);
        }
        assert_eq!(cx.read(DataSource::Literal, 1200)?, 1200);

        // Fields of "me" and of the stack object are distinct storage.
        assert_eq!(cx.world.entity(me).map(|e| e.fields[3]), Some(-103));
        assert_eq!(cx.world.entity(other).map(|e| e.fields[0]), Some(-104));
        Ok(())
    }

    #[test]
    fn errors() -> Result<(), ErrorKind> {
        let resources = resources();
        let mut world = World::new(resources.globals, 6);
        let me = world.spawn_instance(&resources, 0)?;

        let mut threads = world.entity_mut(me).map(|e| std::mem::take(&mut e.threads));
        let thread = threads.as_mut().and_then(|threads| threads.first_mut()).ok_or(ErrorKind::Object(me))?;
        let mut rng = StdRng::seed_from_u64(0);
        let mut cx = Context {
            world: &mut world, resources: &resources, thread, rng: &mut rng, bridge: None,
            me, tick: 1,
        };

        assert!(matches!(cx.read(DataSource::Temp, 6), Err(ErrorKind::Bounds { index: 6, .. })));
        assert!(matches!(cx.read(DataSource::Param, -1), Err(ErrorKind::Bounds { .. })));
        assert!(matches!(cx.write(DataSource::Literal, 0, 1), Err(ErrorKind::ReadOnly(_))));
        assert!(matches!(DataSource::try_from(9), Err(ErrorKind::Source(9))));

        cx.write(DataSource::StackObjectId, 0, 77)?;
        let stale = cx.read(DataSource::StackObjectField, 0);
        assert!(matches!(stale, Err(ErrorKind::Object(ObjectId(77)))));
        Ok(())
    }
}
