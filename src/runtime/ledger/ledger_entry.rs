use std::sync::Arc;

use crate::runtime::ledger::payload::Payload;

/// One ledger slot.
///
/// A slot is occupied while `payload` is `Some`; `strong` is then the number
/// of live strong handles. Freeing empties the payload and advances the
/// generation in the same critical section.
pub struct LedgerEntry {
    pub(crate) generation: u32,
    pub(crate) strong: usize,
    pub(crate) payload: Option<Arc<Payload>>,
}

impl LedgerEntry {
    pub(crate) fn occupied(generation: u32, payload: Payload) -> Self {
        Self {
            generation,
            strong: 1,
            payload: Some(Arc::new(payload)),
        }
    }

    pub(crate) fn is_live(&self, generation: u32) -> bool {
        self.generation == generation && self.payload.is_some()
    }
}
