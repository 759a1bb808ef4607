use crate::runtime::{table_ref::Ref, value::Value};

/// Iterator over a table's `(key, Ref)` pairs.
///
/// Built from a snapshot of the keys taken when iteration starts, so no
/// table lock is held between steps and the yielded refs can mutate the
/// table. Order follows the underlying map and is not stable across
/// mutation. Keys removed after the snapshot still show up; their refs
/// read `None`.
pub struct TableIter<'t> {
    table: &'t Value,
    keys: std::vec::IntoIter<Value>,
}

impl<'t> TableIter<'t> {
    pub(crate) fn new(table: &'t Value, keys: Vec<Value>) -> Self {
        TableIter {
            table,
            keys: keys.into_iter(),
        }
    }
}

impl<'t> Iterator for TableIter<'t> {
    type Item = (Value, Ref<'t>);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        let slot = Ref::new(self.table, key.clone());
        Some((key, slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl ExactSizeIterator for TableIter<'_> {}

impl std::fmt::Debug for TableIter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableIter")
            .field("table", self.table)
            .field("remaining", &self.keys.as_slice())
            .finish()
    }
}
