use std::fmt;
use bstr::BString;

use crate::vm::{self, code, ErrorKind, ObjectId, ThreadId, TreeId};

/// A thread error as reported to the host, with enough context to find the failing node.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub tree: TreeId,
    pub tree_name: BString,
    pub node: u16,
    pub opcode: u16,
    pub entity: ObjectId,
    pub thread: ThreadId,
    pub tick: u64,
}

impl Diagnostic {
    pub fn new(
        error: vm::Error, resources: &vm::Resources,
        entity: ObjectId, thread: ThreadId, tick: u64
    ) -> Diagnostic {
        let vm::Error { kind, tree, node, opcode } = error;
        let tree_name = resources.trees.get(&tree)
            .map_or_else(BString::default, |tree| tree.name.clone());
        Diagnostic { kind, tree, tree_name, node, opcode, entity, thread, tick }
    }
}

struct Opcode(u16);

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Opcode(opcode) = *self;
        match code::op::name(opcode) {
            _ if code::is_call(opcode) => write!(f, "call {:#06x}", opcode),
            Some(name) => write!(f, "{}", name),
            None => write!(f, "op {:#06x}", opcode),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostic { ref kind, tree, ref tree_name, node, opcode, entity, thread, tick } =
            *self;
        write!(f, "tick {} object {} thread {}: ", tick, entity, thread)?;
        write!(f, "{} ({:#06x}) node {} [{}]: {}", tree_name, tree, node, Opcode(opcode), kind)
    }
}

#[cfg(test)]
mod tests {
    use project::{Branch, Node, Tree};
    use crate::vm::{self, code, Diagnostic, ErrorKind, ObjectId, ThreadId};

    #[test]
    fn display() {
        let mut resources = vm::Resources::default();
        let node = Node::new(code::op::EXPRESSION, Branch::True, Branch::False);
        let tree = Tree::new(0x0102, "patrol", 0, 0, vec![node; 4]);
        resources.trees.insert(tree.id, tree);

        let error = vm::Error {
            kind: ErrorKind::DivideByZero, tree: 0x0102, node: 3, opcode: code::op::EXPRESSION,
        };
        let diagnostic = Diagnostic::new(error, &resources, ObjectId(5), ThreadId(1), 40);
        assert_eq!(diagnostic.tree_name, "patrol");
        assert_eq!(
            diagnostic.to_string(),
            "tick 40 object 5 thread 1: patrol (0x0102) node 3 [expression]: division by 0"
        );
    }
}
