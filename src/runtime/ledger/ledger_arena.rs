use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::runtime::{
    config::LedgerConfig,
    leak_detector,
    ledger::{
        ledger_entry::LedgerEntry, ledger_handle::LedgerHandle, payload::Payload, teardown,
    },
    value::Value,
};

/// The process-wide ledger every heap-backed value reports to.
static LEDGER: Mutex<Ledger> = Mutex::new(Ledger::new());

/// Point-in-time view of ledger occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Payloads currently registered with a positive strong count.
    pub live: usize,
    /// Slots allocated so far, live or free.
    pub slots: usize,
    pub total_registrations: usize,
    pub total_releases: usize,
    /// Slots taken out of circulation because their generation ran out.
    pub retired_slots: usize,
}

/// Slot arena mapping payload identity to its strong-reference count.
///
/// Occupied slots hold the payload and its count. A count reaching zero
/// empties the slot, bumps its generation and, when slot reuse is enabled,
/// puts it on the free list for the next registration. A slot whose
/// generation is already `u32::MAX` is retired instead, so a generation is
/// never handed out twice for the same slot.
pub struct Ledger {
    entries: Vec<LedgerEntry>,
    free_list: Vec<u32>,
    live: usize,
    reuse_slots: bool,
    total_registrations: usize,
    total_releases: usize,
    retired_slots: usize,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates an empty ledger that reuses freed slots.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            live: 0,
            reuse_slots: true,
            total_registrations: 0,
            total_releases: 0,
            retired_slots: 0,
        }
    }

    /// Applies capacity and slot-reuse settings.
    pub fn apply(&mut self, config: &LedgerConfig) {
        self.reuse_slots = config.reuse_slots;
        if !self.reuse_slots {
            self.free_list.clear();
        }
        let wanted = config.initial_capacity.saturating_sub(self.entries.len());
        self.entries.reserve(wanted);
    }

    /// Registers a payload with a strong count of one.
    ///
    /// Panics once the arena would need more than `u32::MAX` slots.
    pub fn register(&mut self, payload: Payload) -> LedgerHandle {
        self.live += 1;
        self.total_registrations += 1;

        if let Some(idx) = self.free_list.pop() {
            let entry = &mut self.entries[idx as usize];
            let generation = entry.generation;
            *entry = LedgerEntry::occupied(generation, payload);
            return LedgerHandle::new(idx, generation);
        }

        let idx = match u32::try_from(self.entries.len()) {
            Ok(idx) if idx < u32::MAX => idx,
            _ => panic!("reference ledger exhausted: no free slots left"),
        };
        self.entries.push(LedgerEntry::occupied(0, payload));
        LedgerHandle::new(idx, 0)
    }

    /// Adds one strong reference. Returns `false` when the payload is gone.
    pub fn retain(&mut self, handle: LedgerHandle) -> bool {
        match self.entry_mut(handle) {
            Some(entry) => {
                entry.strong += 1;
                true
            }
            None => false,
        }
    }

    /// Drops one strong reference.
    ///
    /// When the count reaches zero the slot is emptied and the payload is
    /// handed back, so the caller can drop it once the lock is released.
    pub fn release(&mut self, handle: LedgerHandle) -> Option<Arc<Payload>> {
        let entry = self.entry_mut(handle)?;
        entry.strong -= 1;
        if entry.strong > 0 {
            return None;
        }

        let payload = entry.payload.take();
        match entry.generation.checked_add(1) {
            Some(next) => {
                entry.generation = next;
                if self.reuse_slots {
                    self.free_list.push(handle.index);
                }
            }
            // The empty slot keeps its last generation and is never reused.
            None => self.retired_slots += 1,
        }
        self.live -= 1;
        self.total_releases += 1;
        payload
    }

    /// Borrows the payload for the duration of one operation.
    pub fn pin(&self, handle: LedgerHandle) -> Option<Arc<Payload>> {
        self.entry(handle).and_then(|entry| entry.payload.clone())
    }

    pub fn is_live(&self, handle: LedgerHandle) -> bool {
        self.entry(handle).is_some()
    }

    pub fn strong_count(&self, handle: LedgerHandle) -> Option<usize> {
        self.entry(handle).map(|entry| entry.strong)
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            live: self.live,
            slots: self.entries.len(),
            total_registrations: self.total_registrations,
            total_releases: self.total_releases,
            retired_slots: self.retired_slots,
        }
    }

    fn entry(&self, handle: LedgerHandle) -> Option<&LedgerEntry> {
        self.entries
            .get(handle.index as usize)
            .filter(|entry| entry.is_live(handle.generation))
    }

    fn entry_mut(&mut self, handle: LedgerHandle) -> Option<&mut LedgerEntry> {
        self.entries
            .get_mut(handle.index as usize)
            .filter(|entry| entry.is_live(handle.generation))
    }
}

/// Reconfigures the global ledger. Safe to call at any time; live payloads
/// are unaffected.
pub fn configure(config: &LedgerConfig) {
    LEDGER.lock().apply(config);
    debug!(
        initial_capacity = config.initial_capacity,
        reuse_slots = config.reuse_slots,
        "reference ledger configured"
    );
}

/// Returns occupancy counters of the global ledger.
pub fn stats() -> LedgerStats {
    LEDGER.lock().stats()
}

pub(crate) fn register(payload: Payload) -> LedgerHandle {
    let kind = payload.kind();
    let handle = LEDGER.lock().register(payload);
    leak_detector::record_register(kind);
    trace!(%handle, kind = kind.label(), "payload registered");
    handle
}

pub(crate) fn retain(handle: LedgerHandle) -> bool {
    LEDGER.lock().retain(handle)
}

/// Releases one strong reference; returns `true` when this freed the payload.
pub(crate) fn release(handle: LedgerHandle) -> bool {
    let freed = LEDGER.lock().release(handle);
    match freed {
        Some(payload) => {
            let kind = payload.kind();
            leak_detector::record_free(kind);
            trace!(%handle, kind = kind.label(), "payload freed");
            // Nested values release their own payloads here, outside the lock.
            teardown::dispose(payload);
            true
        }
        None => false,
    }
}

pub(crate) fn pin(handle: LedgerHandle) -> Option<Arc<Payload>> {
    LEDGER.lock().pin(handle)
}

pub(crate) fn is_live(handle: LedgerHandle) -> bool {
    LEDGER.lock().is_live(handle)
}

/// Strong count of the payload behind `value`, or `None` for scalars and
/// expired handles.
pub fn strong_count(value: &Value) -> Option<usize> {
    let handle = value.handle()?;
    LEDGER.lock().strong_count(handle)
}
