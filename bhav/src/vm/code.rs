use std::fmt;

use project::{Branch, Node, Tree, OPERAND_SIZE};

/// Opcodes at or above this value call the tree with that id instead of a primitive.
pub const CALL_BASE: u16 = 0x100;

/// Built-in primitive opcodes.
pub mod op {
    pub const SLEEP: u16 = 0;
    pub const EXPRESSION: u16 = 2;
    pub const RANDOM: u16 = 8;
    pub const REMOVE_OBJECT: u16 = 18;
    pub const TEST_OBJECT_TYPE: u16 = 32;
    pub const CREATE_OBJECT: u16 = 42;
    pub const NOTIFY_OUT_OF_IDLE: u16 = 49;
    pub const RUN_SCRIPT: u16 = 80;

    pub const ALL: [u16; 8] = [
        SLEEP, EXPRESSION, RANDOM, REMOVE_OBJECT,
        TEST_OBJECT_TYPE, CREATE_OBJECT, NOTIFY_OUT_OF_IDLE, RUN_SCRIPT,
    ];

    pub fn name(opcode: u16) -> Option<&'static str> {
        let name = match opcode {
            SLEEP => "sleep",
            EXPRESSION => "expression",
            RANDOM => "random",
            REMOVE_OBJECT => "remove_object",
            TEST_OBJECT_TYPE => "test_object_type",
            CREATE_OBJECT => "create_object",
            NOTIFY_OUT_OF_IDLE => "notify_out_of_idle",
            RUN_SCRIPT => "run_script",
            _ => return None,
        };
        Some(name)
    }
}

/// Whether `opcode` calls a tree rather than a primitive.
pub fn is_call(opcode: u16) -> bool { opcode >= CALL_BASE }

/// A view of a node's operand bytes.
///
/// Multi-byte fields are stored in little-endian order. Reads past the end yield zero.
#[derive(Copy, Clone)]
pub struct Operand<'a>(&'a [u8; OPERAND_SIZE]);

impl<'a> Operand<'a> {
    pub fn new(bytes: &'a [u8; OPERAND_SIZE]) -> Self { Operand(bytes) }

    pub fn u8(&self, at: usize) -> u8 { self.0.get(at).copied().unwrap_or(0) }

    pub fn u16(&self, at: usize) -> u16 { u16::from_le_bytes([self.u8(at), self.u8(at + 1)]) }

    pub fn i16(&self, at: usize) -> i16 { self.u16(at) as i16 }
}

impl fmt::Debug for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 { write!(f, " ")?; }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Builds operand bytes field by field, for tools and tests.
#[derive(Default)]
pub struct Encoder {
    bytes: [u8; OPERAND_SIZE],
}

impl Encoder {
    pub fn new() -> Self { Self::default() }

    pub fn u8(mut self, at: usize, value: u8) -> Self {
        self.bytes[at] = value;
        self
    }

    pub fn u16(mut self, at: usize, value: u16) -> Self {
        self.bytes[at..at + 2].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i16(self, at: usize, value: i16) -> Self { self.u16(at, value as u16) }

    pub fn finish(self) -> [u8; OPERAND_SIZE] { self.bytes }
}

/// Human-readable listing of a tree, one node per line.
pub struct Disassembly<'a>(pub &'a Tree);

struct Target(Branch);

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Branch::Node(node) => write!(f, "{}", node),
            Branch::True => write!(f, "true"),
            Branch::False => write!(f, "false"),
            Branch::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for Disassembly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Disassembly(tree) = *self;
        writeln!(f, "{:#06x} {}(args {}, locals {})", tree.id, tree.name, tree.args, tree.locals)?;

        for (index, &Node { opcode, ref operand, true_branch, false_branch }) in
            tree.nodes.iter().enumerate()
        {
            write!(f, "  {:3}: ", index)?;
            match op::name(opcode) {
                _ if is_call(opcode) => write!(f, "call {:#06x}", opcode)?,
                Some(name) => write!(f, "{}", name)?,
                None => write!(f, "op {:#06x}", opcode)?,
            }
            let (t, e) = (Target(true_branch), Target(false_branch));
            writeln!(f, " [{:?}] -> {}, {}", Operand::new(operand), t, e)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use project::{Branch, Node, Tree};
    use crate::vm::code::{self, op, Disassembly, Encoder, Operand};

    #[test]
    fn operand_fields() {
        let bytes = Encoder::new().i16(0, -2).u16(2, 0x1234).u8(15, 7).finish();
        let operand = Operand::new(&bytes);
        assert_eq!(operand.i16(0), -2);
        assert_eq!(operand.u16(0), 0xfffe);
        assert_eq!(operand.u8(2), 0x34);
        assert_eq!(operand.u16(2), 0x1234);
        assert_eq!(operand.u8(15), 7);
        assert_eq!(operand.u16(15), 7);
        assert_eq!(operand.u8(16), 0);
    }

    #[test]
    fn disassemble() {
        let nodes = vec![
            Node::new(op::SLEEP, Branch::Node(1), Branch::False)
                .with_operand(Encoder::new().i16(0, 3).finish()),
            Node::new(0x0101, Branch::True, Branch::Error),
        ];
        let tree = Tree::new(0x0100, "nap", 1, 0, nodes);

        let listing = format!("{}", Disassembly(&tree));
        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines[0], "0x0100 nap(args 1, locals 0)");
        assert!(lines[1].starts_with("    0: sleep [03 00 00"));
        assert!(lines[1].ends_with("] -> 1, false"));
        assert!(lines[2].starts_with("    1: call 0x0101 ["));
        assert!(lines[2].ends_with("] -> true, error"));
        assert!(code::is_call(0x0101));
    }
}
