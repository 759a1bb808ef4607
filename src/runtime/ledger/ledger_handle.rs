use std::fmt;

/// Handle into the reference ledger.
///
/// A `LedgerHandle` is a copyable `(slot, generation)` pair naming one
/// registered payload. The generation is bumped every time its slot is freed,
/// so a handle that outlives its payload never resolves to whatever is
/// registered in the slot next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedgerHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl LedgerHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the raw ledger slot index backing this handle.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the slot generation this handle was issued for.
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// Packs slot and generation into one opaque identity number.
    pub fn identity(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }
}

impl fmt::Display for LedgerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.identity())
    }
}
