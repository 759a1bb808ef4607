use crate::runtime::{
    error::{TypeError, TypeResult},
    ledger::TableMap,
    value::{Kind, TablePin, Value},
};

/// Proxy for one table slot, bound to `(table, key)`.
///
/// A `Ref` made by [`Value::index`] borrows the table value it came from, so
/// it cannot be kept past the expression that produced it. One made by
/// [`Ref::index`] owns a strong handle to the nested table instead. Nothing
/// is read when it is created; every access re-checks that the table is
/// still alive, which matters when the owning value is a weak handle.
pub struct Ref<'t> {
    table: Owner<'t>,
    key: Value,
}

enum Owner<'t> {
    Borrowed(&'t Value),
    Owned(Value),
}

impl<'t> Ref<'t> {
    pub(crate) fn new(table: &'t Value, key: Value) -> Self {
        Ref {
            table: Owner::Borrowed(table),
            key,
        }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn table(&self) -> &Value {
        match &self.table {
            Owner::Borrowed(table) => table,
            Owner::Owned(table) => table,
        }
    }

    fn pin(&self, op: &'static str) -> TypeResult<TablePin> {
        self.table().pin_table(op)
    }

    /// Ref to `key` inside the table stored in this slot, for chains like
    /// `t["a"]["b"] = v`.
    ///
    /// The nested table is held strongly by the returned ref, so it stays
    /// alive even if this slot is reassigned in the meantime.
    pub fn index(&self, key: impl Into<Value>) -> TypeResult<Ref<'static>> {
        let nested = self.value()?;
        match nested.kind() {
            Kind::Table => Ok(Ref {
                table: Owner::Owned(nested),
                key: key.into(),
            }),
            kind => Err(TypeError::mismatch("index", kind)),
        }
    }

    /// Copies the slot out, or `None` when the key is absent.
    pub fn get(&self) -> TypeResult<Option<Value>> {
        let pin = self.pin("index")?;
        let map = pin.map().read();
        Ok(map.get(&self.key).cloned().filter(|value| !value.is_nil()))
    }

    /// Copies the slot out; an absent key reads as nil.
    pub fn value(&self) -> TypeResult<Value> {
        Ok(self.get()?.unwrap_or_default())
    }

    /// Stores `value` in the slot, inserting or replacing.
    ///
    /// The value is stored with the ownership it arrives with, so assigning
    /// a weak handle records a back-reference. Assigning nil removes the
    /// entry. A nil or NaN key leaves the table unchanged.
    pub fn set(&self, value: impl Into<Value>) -> TypeResult<()> {
        let value = value.into();
        let pin = self.pin("assign into")?;
        if !is_storable_key(&self.key) {
            return Ok(());
        }

        // Whatever gets displaced is dropped after the table lock is released.
        let displaced = store(&mut pin.map().write(), &self.key, value);
        drop(displaced);
        Ok(())
    }

    /// Exchanges the contents of two slots, in the same table or not.
    ///
    /// A missing entry counts as nil, so swapping with an absent slot moves
    /// the value across. Stored values keep their ownership. If either key
    /// is nil or NaN nothing changes.
    pub fn swap(&self, other: &Ref<'_>) -> TypeResult<()> {
        let pin = self.pin("swap")?;
        let other_pin = other.pin("swap")?;
        if !is_storable_key(&self.key) || !is_storable_key(&other.key) {
            return Ok(());
        }

        if pin.same_table(&other_pin) {
            let displaced = {
                let mut map = pin.map().write();
                let mine = take_raw(&mut map, &self.key);
                let theirs = take_raw(&mut map, &other.key);
                [
                    store(&mut map, &self.key, theirs),
                    store(&mut map, &other.key, mine),
                ]
            };
            drop(displaced);
            return Ok(());
        }

        // Never hold two table locks at once.
        let mine = take_raw(&mut pin.map().write(), &self.key);
        let theirs = take_raw(&mut other_pin.map().write(), &other.key);
        let displaced = {
            let first = store(&mut pin.map().write(), &self.key, theirs);
            let second = store(&mut other_pin.map().write(), &other.key, mine);
            [first, second]
        };
        drop(displaced);
        Ok(())
    }

    /// Removes the entry, returning what it held.
    pub fn take(&self) -> TypeResult<Option<Value>> {
        let pin = self.pin("remove from")?;
        let removed = pin.map().write().remove_entry(&self.key);
        Ok(removed.map(|(_, value)| value).filter(|value| !value.is_nil()))
    }

    /// Flips the ownership of the value stored in this slot.
    ///
    /// Returns whether the stored value is weak afterwards. A value freed by
    /// going weak takes its entry with it.
    pub fn set_weak(&self, weak: bool) -> TypeResult<bool> {
        let pin = self.pin("set value ownership in")?;
        let (now_weak, displaced) = {
            let mut map = pin.map().write();
            match map.get_mut(&self.key) {
                Some(slot) => {
                    let now_weak = slot.set_weak(weak);
                    if slot.is_nil() {
                        (now_weak, map.remove_entry(&self.key))
                    } else {
                        (now_weak, None)
                    }
                }
                None => (false, None),
            }
        };
        drop(displaced);
        Ok(now_weak)
    }

    /// Flips the ownership of a key inside the table stored in this slot.
    pub fn set_key_weak(&self, key: &Value, weak: bool) -> TypeResult<bool> {
        self.value()?.set_key_weak(key, weak)
    }

    pub fn is_truthy(&self) -> bool {
        matches!(self.get(), Ok(Some(value)) if value.is_truthy())
    }

    pub fn kind(&self) -> TypeResult<Kind> {
        Ok(self.value()?.kind())
    }

    pub fn call(&self, arg: Value) -> TypeResult<Value> {
        self.value()?.call(arg)
    }
}

/// Writes `value` under `key`, removing the entry for nil, and hands back
/// whatever was there so the caller can drop it outside the lock.
fn store(map: &mut TableMap, key: &Value, value: Value) -> Option<Value> {
    if value.is_nil() {
        map.remove_entry(key).map(|(_, old)| old)
    } else if let Some(slot) = map.get_mut(key) {
        Some(std::mem::replace(slot, value))
    } else {
        map.insert(key.copy_preserving(), value);
        None
    }
}

fn take_raw(map: &mut TableMap, key: &Value) -> Value {
    map.remove_entry(key)
        .map(|(_, value)| value)
        .unwrap_or_default()
}

fn is_storable_key(key: &Value) -> bool {
    !key.is_nil() && !key.as_number().is_some_and(f64::is_nan)
}

impl std::fmt::Debug for Ref<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ref")
            .field("table", self.table())
            .field("key", &self.key)
            .finish()
    }
}
