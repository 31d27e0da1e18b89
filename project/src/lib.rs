use std::collections::BTreeMap;
use bstr::BString;
use serde::{Deserialize, Serialize};

#[cfg(feature = "read")]
pub use crate::read::read_json;

#[cfg(feature = "read")]
mod read;

/// The size of a node's operand buffer, in bytes.
pub const OPERAND_SIZE: usize = 16;

/// A set of decoded behavior assets, as produced by the asset pipeline.
#[derive(Default, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub trees: Vec<Tree>,
    pub objects: Vec<Object>,
    pub scripts: Vec<Script>,
    /// Number of global variable slots.
    pub globals: u16,
    /// Object definition indices placed into the world at start-up, in order.
    pub instances: Vec<u16>,
}

/// A compiled behavior tree.
///
/// Execution begins at `nodes[0]`. The tree's `id` doubles as the opcode used to call it.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Tree {
    pub id: u16,
    pub name: BString,
    pub args: u16,
    pub locals: u16,
    pub nodes: Vec<Node>,
}

/// A single decoded instruction.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Node {
    pub opcode: u16,
    #[serde(default)]
    pub operand: [u8; OPERAND_SIZE],
    pub true_branch: Branch,
    pub false_branch: Branch,
}

/// The successor of a node for one outcome.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Branch {
    /// Continue at the node with this index.
    Node(u16),
    /// Return `true` from the tree.
    True,
    /// Return `false` from the tree.
    False,
    /// The tree reached an authored error exit.
    Error,
}

/// Static data shared by every instance of an object.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Object {
    pub name: BString,
    /// Number of persistent fields.
    pub fields: u16,
    /// Named trees run by the object's main thread. See `entry_point`.
    pub entry_points: BTreeMap<String, u16>,
}

/// An externally authored script, run through the host's scripting bridge.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub id: u16,
    pub name: BString,
    pub source: BString,
}

pub mod entry_point {
    pub const INIT: &str = "init";
    pub const MAIN: &str = "main";
}

impl Node {
    pub fn new(opcode: u16, true_branch: Branch, false_branch: Branch) -> Node {
        Node { opcode, operand: [0; OPERAND_SIZE], true_branch, false_branch }
    }

    pub fn with_operand(mut self, operand: [u8; OPERAND_SIZE]) -> Node {
        self.operand = operand;
        self
    }

    pub fn successors(&self) -> [Branch; 2] { [self.true_branch, self.false_branch] }
}

impl Tree {
    pub fn new(id: u16, name: &str, args: u16, locals: u16, nodes: Vec<Node>) -> Tree {
        Tree { id, name: BString::from(name), args, locals, nodes }
    }
}

impl Object {
    pub fn new(name: &str, fields: u16) -> Object {
        Object { name: BString::from(name), fields, entry_points: BTreeMap::default() }
    }

    pub fn with_entry_point(mut self, name: &str, tree: u16) -> Object {
        self.entry_points.insert(String::from(name), tree);
        self
    }

    pub fn entry_point(&self, name: &str) -> Option<u16> { self.entry_points.get(name).copied() }
}

impl Script {
    pub fn new(id: u16, name: &str, source: &str) -> Script {
        Script { id, name: BString::from(name), source: BString::from(source) }
    }
}
