//! `serde` support for values.
//!
//! Nil serializes as unit, tables as maps keyed by each key's display text,
//! functions as their identity tag. A table reached again while it is
//! already being serialized (a cycle) is written as its identity tag.

use serde::{
    Serialize, Serializer,
    ser::{Error, SerializeMap},
};

use crate::runtime::{
    ledger::LedgerHandle,
    value::{Repr, Value},
};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Scoped {
            value: self,
            parent: None,
        }
        .serialize(serializer)
    }
}

/// A value together with the chain of tables enclosing it.
struct Scoped<'a> {
    value: &'a Value,
    parent: Option<&'a Scoped<'a>>,
}

impl Scoped<'_> {
    fn is_enclosed_by(&self, handle: LedgerHandle) -> bool {
        let mut scope = self.parent;
        while let Some(current) = scope {
            if current.value.handle() == Some(handle) {
                return true;
            }
            scope = current.parent;
        }
        false
    }
}

impl Serialize for Scoped<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value.live_repr() {
            Repr::Nil => serializer.serialize_unit(),
            Repr::Boolean(b) => serializer.serialize_bool(b),
            Repr::Number(n) => serializer.serialize_f64(n),
            Repr::String(_) => {
                let text = self.value.string_content().map_err(S::Error::custom)?;
                serializer.serialize_str(&text)
            }
            Repr::Function(..) => serializer.serialize_str(&self.value.to_string()),
            Repr::Table(handle, _) => {
                if self.is_enclosed_by(handle) {
                    return serializer.serialize_str(&self.value.to_string());
                }
                let entries = self.value.entries().map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in &entries {
                    let nested = Scoped {
                        value,
                        parent: Some(self),
                    };
                    map.serialize_entry(&key.to_string(), &nested)?;
                }
                map.end()
            }
        }
    }
}
