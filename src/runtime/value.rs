use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use parking_lot::RwLock;
use tracing::debug;

use crate::runtime::{
    convert::format_number,
    error::{TypeError, TypeResult},
    iter::TableIter,
    ledger::{self, Callable, LedgerHandle, Payload, TableMap},
    table_ref::Ref,
};

/// The active discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Nil,
    Boolean,
    Number,
    String,
    Function,
    Table,
}

impl Kind {
    /// Returns the user-visible kind label used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Nil => "nil",
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Function => "function",
            Kind::Table => "table",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a handle counts toward its payload's liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    Strong,
    Weak,
}

#[derive(Clone, Copy)]
pub(crate) enum Repr {
    Nil,
    Boolean(bool),
    Number(f64),
    /// Strings never form cycles, so their handles are always strong.
    String(LedgerHandle),
    Function(LedgerHandle, Ownership),
    Table(LedgerHandle, Ownership),
}

/// Dynamic value: nil, boolean, number, string, function or table.
///
/// ## Memory Management Model
///
/// Strings, functions and tables live in the process-wide reference ledger.
/// A strong `Value` holds one counted reference; cloning retains and dropping
/// releases, and the payload is freed when the last strong reference goes.
///
/// Functions and tables may also be held weakly. A weak value keeps no
/// payload alive and reads as nil once the payload has been freed, which is
/// how back-references (a child table pointing at its parent, a table
/// containing itself) are expressed without leaking.
///
/// Cloning a live weak value yields a strong value; cloning an expired one
/// yields nil.
///
/// Every check on a weak value (`is_truthy`, `kind`, equality) asks the
/// ledger whether the payload is still there, which takes the global lock.
/// Loops that test the same weak value repeatedly should call
/// [`Value::refresh`] instead: it answers the same question and, once the
/// payload is gone, turns the value into a plain nil that never consults
/// the ledger again.
pub struct Value {
    pub(crate) repr: Repr,
}

/// A pinned table payload, readable without holding the ledger lock.
pub(crate) struct TablePin(Arc<Payload>);

impl TablePin {
    pub(crate) fn map(&self) -> &RwLock<TableMap> {
        match &*self.0 {
            Payload::Table(map) => map,
            _ => unreachable!("table handle resolved to a non-table payload"),
        }
    }

    pub(crate) fn same_table(&self, other: &TablePin) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Value {
    pub const fn nil() -> Self {
        Value { repr: Repr::Nil }
    }

    /// Creates an empty, strongly held table.
    pub fn table() -> Self {
        Self::from_map(TableMap::new())
    }

    /// Wraps a host callable in a strongly held function value.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::from_callable(Arc::new(f))
    }

    /// Like [`Value::function`], but an absent callable yields nil without
    /// registering anything.
    pub fn maybe_function<F>(f: Option<F>) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        f.map_or_else(Value::nil, Value::function)
    }

    pub fn from_callable(callable: Callable) -> Self {
        let handle = ledger::register(Payload::Function(callable));
        Value {
            repr: Repr::Function(handle, Ownership::Strong),
        }
    }

    /// Builds a table keyed `1..` from `items`.
    ///
    /// Nil items are skipped; the key only advances when an item is stored.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut map = TableMap::new();
        let mut next = 1.0;
        for item in items {
            if item.is_nil() {
                continue;
            }
            map.insert(Value::from(next), item);
            next += 1.0;
        }
        Self::from_map(map)
    }

    fn from_map(map: TableMap) -> Self {
        let handle = ledger::register(Payload::Table(RwLock::new(map)));
        Value {
            repr: Repr::Table(handle, Ownership::Strong),
        }
    }

    /// Returns the representation with expired weak handles read as nil.
    pub(crate) fn live_repr(&self) -> Repr {
        match self.repr {
            Repr::Function(handle, Ownership::Weak) | Repr::Table(handle, Ownership::Weak)
                if !ledger::is_live(handle) =>
            {
                Repr::Nil
            }
            repr => repr,
        }
    }

    pub fn kind(&self) -> Kind {
        match self.live_repr() {
            Repr::Nil => Kind::Nil,
            Repr::Boolean(_) => Kind::Boolean,
            Repr::Number(_) => Kind::Number,
            Repr::String(_) => Kind::String,
            Repr::Function(..) => Kind::Function,
            Repr::Table(..) => Kind::Table,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.live_repr(), Repr::Nil)
    }

    /// Truthiness: nil, `false` and expired weak handles are falsy.
    pub fn is_truthy(&self) -> bool {
        match self.repr {
            Repr::Nil => false,
            Repr::Boolean(b) => b,
            Repr::Function(handle, Ownership::Weak) | Repr::Table(handle, Ownership::Weak) => {
                ledger::is_live(handle)
            }
            _ => true,
        }
    }

    /// Truthiness that also collapses an expired weak handle into nil, so
    /// later checks on this value skip the ledger entirely.
    pub fn refresh(&mut self) -> bool {
        let truthy = self.is_truthy();
        if !truthy && self.is_weak() {
            self.repr = Repr::Nil;
        }
        truthy
    }

    /// Returns the handle's ownership, or `None` for kinds that carry no payload.
    pub fn ownership(&self) -> Option<Ownership> {
        match self.repr {
            Repr::String(_) => Some(Ownership::Strong),
            Repr::Function(_, ownership) | Repr::Table(_, ownership) => Some(ownership),
            _ => None,
        }
    }

    pub fn is_weak(&self) -> bool {
        self.ownership() == Some(Ownership::Weak)
    }

    /// Switches a function or table handle between strong and weak.
    ///
    /// Going weak gives up this handle's reference; if it was the last one
    /// the payload is freed right away and this value becomes nil. Going
    /// strong only succeeds while the payload is alive; an expired handle
    /// becomes nil instead of resurrecting anything.
    ///
    /// Returns whether the value is weak afterwards. Other kinds are left
    /// untouched and report `false`.
    pub fn set_weak(&mut self, weak: bool) -> bool {
        let (handle, ownership) = match self.repr {
            Repr::Function(handle, ownership) | Repr::Table(handle, ownership) => {
                (handle, ownership)
            }
            _ => return false,
        };

        match (ownership, weak) {
            (Ownership::Strong, true) => {
                if ledger::release(handle) {
                    self.repr = Repr::Nil;
                    false
                } else {
                    self.repr = self.repr.with_ownership(Ownership::Weak);
                    true
                }
            }
            (Ownership::Weak, false) => {
                if ledger::retain(handle) {
                    self.repr = self.repr.with_ownership(Ownership::Strong);
                } else {
                    debug!(%handle, "weak handle could not be promoted: payload already freed");
                    self.repr = Repr::Nil;
                }
                false
            }
            (ownership, _) => ownership == Ownership::Weak,
        }
    }

    /// Returns a weak handle to the same function or table without touching
    /// the ledger. Other kinds are copied as usual.
    pub fn downgrade(&self) -> Value {
        match self.live_repr() {
            repr @ (Repr::Function(..) | Repr::Table(..)) => Value {
                repr: repr.with_ownership(Ownership::Weak),
            },
            _ => self.clone(),
        }
    }

    /// Copies the handle keeping its ownership: weak stays weak.
    pub(crate) fn copy_preserving(&self) -> Value {
        if self.is_weak() {
            self.downgrade()
        } else {
            self.clone()
        }
    }

    /// Current strong count of this value's payload, if it has a live one.
    pub fn strong_count(&self) -> Option<usize> {
        ledger::strong_count(self)
    }

    pub(crate) fn handle(&self) -> Option<LedgerHandle> {
        match self.repr {
            Repr::String(handle) | Repr::Function(handle, _) | Repr::Table(handle, _) => {
                Some(handle)
            }
            _ => None,
        }
    }

    fn strong_handle(&self) -> Option<LedgerHandle> {
        match self.repr {
            Repr::String(handle)
            | Repr::Function(handle, Ownership::Strong)
            | Repr::Table(handle, Ownership::Strong) => Some(handle),
            _ => None,
        }
    }

    pub(crate) fn pin_table(&self, op: &'static str) -> TypeResult<TablePin> {
        match self.repr {
            Repr::Table(handle, _) => ledger::pin(handle)
                .map(TablePin)
                .ok_or(TypeError::mismatch(op, Kind::Nil)),
            _ => Err(TypeError::mismatch(op, self.kind())),
        }
    }

    /// Runs `f` over the string content, or returns `None` for non-strings.
    pub(crate) fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> Option<R> {
        let Repr::String(handle) = self.repr else {
            return None;
        };
        match ledger::pin(handle).as_deref() {
            Some(Payload::String(text)) => Some(f(text)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.repr {
            Repr::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.repr {
            Repr::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Copies out the content of a string value.
    pub fn string_content(&self) -> TypeResult<String> {
        self.with_str(str::to_owned)
            .ok_or_else(|| TypeError::mismatch("read string content of", self.kind()))
    }

    /// Invokes a function value. The callable runs without any lock held.
    pub fn call(&self, arg: Value) -> TypeResult<Value> {
        let callable = match self.repr {
            Repr::Function(handle, _) => match ledger::pin(handle).as_deref() {
                Some(Payload::Function(callable)) => callable.clone(),
                _ => return Err(TypeError::mismatch("call", Kind::Nil)),
            },
            _ => return Err(TypeError::mismatch("call", self.kind())),
        };
        Ok(callable(arg))
    }

    /// Binds a slot proxy for `key` in this table.
    pub fn index(&self, key: impl Into<Value>) -> TypeResult<Ref<'_>> {
        match self.live_repr() {
            Repr::Table(..) => Ok(Ref::new(self, key.into())),
            _ => Err(TypeError::mismatch("index", self.kind())),
        }
    }

    /// Iterates `(key, Ref)` pairs in the table's native order.
    ///
    /// Keys are snapshotted when the iterator is created, so the table can
    /// be mutated through the yielded refs.
    pub fn iter(&self) -> TypeResult<TableIter<'_>> {
        let pin = self.pin_table("iterate")?;
        let keys: Vec<Value> = pin
            .map()
            .read()
            .keys()
            .map(Value::clone)
            .filter(|key| !key.is_nil())
            .collect();
        Ok(TableIter::new(self, keys))
    }

    /// Snapshot of every live `(key, value)` pair.
    pub fn entries(&self) -> TypeResult<Vec<(Value, Value)>> {
        let pin = self.pin_table("iterate")?;
        let map = pin.map().read();
        Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .filter(|(k, v)| !k.is_nil() && !v.is_nil())
            .collect())
    }

    pub fn len(&self) -> TypeResult<usize> {
        let pin = self.pin_table("measure")?;
        let len = pin.map().read().len();
        Ok(len)
    }

    pub fn is_empty(&self) -> TypeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Flips the ownership of the key stored in this table that equals `key`.
    ///
    /// Returns whether such a key was present. If making the key weak frees
    /// its payload, the whole entry goes away with it.
    pub fn set_key_weak(&self, key: &Value, weak: bool) -> TypeResult<bool> {
        let pin = self.pin_table("set key ownership in")?;
        let displaced = {
            let mut map = pin.map().write();
            let Some((mut stored, value)) = map.remove_entry(key) else {
                return Ok(false);
            };
            stored.set_weak(weak);
            if stored.is_nil() {
                Some((stored, value))
            } else {
                map.insert(stored, value);
                None
            }
        };
        drop(displaced);
        Ok(true)
    }
}

impl Repr {
    fn with_ownership(self, ownership: Ownership) -> Repr {
        match self {
            Repr::Function(handle, _) => Repr::Function(handle, ownership),
            Repr::Table(handle, _) => Repr::Table(handle, ownership),
            repr => repr,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::nil()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let repr = match self.repr {
            Repr::String(handle) if ledger::retain(handle) => Repr::String(handle),
            Repr::Function(handle, _) if ledger::retain(handle) => {
                Repr::Function(handle, Ownership::Strong)
            }
            Repr::Table(handle, _) if ledger::retain(handle) => {
                Repr::Table(handle, Ownership::Strong)
            }
            Repr::String(_) | Repr::Function(..) | Repr::Table(..) => Repr::Nil,
            repr => repr,
        };
        Value { repr }
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        if let Some(handle) = self.strong_handle() {
            ledger::release(handle);
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.live_repr(), other.live_repr()) {
            (Repr::Nil, Repr::Nil) => true,
            (Repr::Boolean(a), Repr::Boolean(b)) => a == b,
            (Repr::Number(a), Repr::Number(b)) => a == b,
            (Repr::String(a), Repr::String(b)) => {
                a == b
                    || self
                        .with_str(|lhs| other.with_str(|rhs| lhs == rhs))
                        .flatten()
                        .unwrap_or(false)
            }
            (Repr::Function(a, _), Repr::Function(b, _)) | (Repr::Table(a, _), Repr::Table(b, _)) => {
                a == b
            }
            _ => false,
        }
    }
}

// NaN keys are refused by table assignment, so treating `==` as an
// equivalence here is sound for every key that can actually be stored.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Heap kinds hash by identity of the raw handle, so a stored weak key
        // keeps its bucket after its payload expires.
        match self.repr {
            Repr::Nil => 0u8.hash(state),
            Repr::Boolean(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Repr::Number(n) => {
                2u8.hash(state);
                let n = if n == 0.0 { 0.0 } else { n };
                n.to_bits().hash(state);
            }
            Repr::String(_) => {
                3u8.hash(state);
                self.with_str(|text| text.hash(state));
            }
            Repr::Function(handle, _) => {
                4u8.hash(state);
                handle.hash(state);
            }
            Repr::Table(handle, _) => {
                5u8.hash(state);
                handle.hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.live_repr() {
            Repr::Nil => f.write_str("nil"),
            Repr::Boolean(b) => write!(f, "{}", b),
            Repr::Number(n) => f.write_str(&format_number(n)),
            Repr::String(_) => match self.with_str(|text| f.write_str(text)) {
                Some(result) => result,
                None => f.write_str("nil"),
            },
            Repr::Function(handle, _) => write!(f, "function: {}", handle),
            Repr::Table(handle, _) => write!(f, "table: {}", handle),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let weak = if self.is_weak() { " (weak)" } else { "" };
        match self.live_repr() {
            Repr::Nil => f.write_str("nil"),
            Repr::Boolean(b) => write!(f, "{}", b),
            Repr::Number(n) => f.write_str(&format_number(n)),
            Repr::String(_) => match self.with_str(|text| write!(f, "{:?}", text)) {
                Some(result) => result,
                None => f.write_str("nil"),
            },
            Repr::Function(handle, _) => write!(f, "function: {}{}", handle, weak),
            Repr::Table(handle, _) => write!(f, "table: {}{}", handle, weak),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value {
            repr: Repr::Boolean(value),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value {
            repr: Repr::Number(value),
        }
    }
}

macro_rules! from_lossless_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::from(f64::from(value))
                }
            }
        )*
    };
}

from_lossless_number!(f32, i8, i16, i32, u8, u16, u32);

macro_rules! from_wide_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::from(value as f64)
                }
            }
        )*
    };
}

from_wide_integer!(i64, u64, isize, usize);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::from(Box::<str>::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::from(value.into_boxed_str())
    }
}

impl From<Box<str>> for Value {
    fn from(value: Box<str>) -> Self {
        let handle = ledger::register(Payload::String(value));
        Value {
            repr: Repr::String(handle),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::nil()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Value::nil, Into::into)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl<const N: usize> From<[Value; N]> for Value {
    fn from(items: [Value; N]) -> Self {
        Value::list(items)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::list(iter)
    }
}
