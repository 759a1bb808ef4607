use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;

use crate::runtime::{leak_detector::PayloadKind, value::Value};

/// Host callable stored behind a function value.
pub type Callable = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Key→value storage behind a table value.
pub type TableMap = HashMap<Value, Value>;

/// Heap payloads whose liveness is tracked by the ledger.
pub enum Payload {
    /// Immutable string content.
    String(Box<str>),
    /// Host callable.
    Function(Callable),
    /// Mutable key→value mapping.
    Table(RwLock<TableMap>),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::String(_) => PayloadKind::String,
            Payload::Function(_) => PayloadKind::Function,
            Payload::Table(_) => PayloadKind::Table,
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::String(s) => f.debug_tuple("String").field(s).finish(),
            Payload::Function(_) => f.write_str("Function(<callable>)"),
            Payload::Table(map) => f
                .debug_struct("Table")
                .field("len", &map.read().len())
                .finish(),
        }
    }
}
