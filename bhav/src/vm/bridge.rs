use bstr::BStr;

use crate::vm::{Context, DataSource, ErrorKind, ObjectId};

/// The boolean result a script hands back to its node.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Signal {
    True,
    False,
}

/// A host-provided script engine.
///
/// The VM never interprets script source itself. `RunScript` nodes hand it to the bridge along
/// with up to three parameters, and branch on the returned signal.
pub trait ScriptBridge {
    fn run(
        &mut self, name: &BStr, source: &BStr, params: [Option<i16>; 3],
        cx: &mut ScriptContext<'_, '_>
    ) -> Result<Signal, String>;
}

/// What a script may see of the thread that invoked it.
pub struct ScriptContext<'c, 'a> {
    pub(in crate::vm) cx: &'c mut Context<'a>,
}

impl From<bool> for Signal {
    fn from(value: bool) -> Self { if value { Signal::True } else { Signal::False } }
}

impl From<Signal> for bool {
    fn from(signal: Signal) -> Self { signal == Signal::True }
}

impl<'c, 'a> ScriptContext<'c, 'a> {
    pub fn new(cx: &'c mut Context<'a>) -> Self { ScriptContext { cx } }

    pub fn me(&self) -> ObjectId { self.cx.me }

    pub fn stack_object(&self) -> ObjectId { self.cx.stack_object() }

    pub fn tick(&self) -> u64 { self.cx.tick }

    pub fn temp(&self, index: i16) -> Result<i16, ErrorKind> {
        self.cx.read(DataSource::Temp, index)
    }

    pub fn set_temp(&mut self, index: i16, value: i16) -> Result<(), ErrorKind> {
        self.cx.write(DataSource::Temp, index, value)
    }

    /// Read a field of the invoking entity.
    pub fn field(&self, index: i16) -> Result<i16, ErrorKind> {
        self.cx.read(DataSource::MyField, index)
    }

    pub fn set_field(&mut self, index: i16, value: i16) -> Result<(), ErrorKind> {
        self.cx.write(DataSource::MyField, index, value)
    }

    pub fn global(&self, index: i16) -> Result<i16, ErrorKind> {
        self.cx.read(DataSource::Global, index)
    }
}
