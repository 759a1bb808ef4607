//! Reference ledger: the registry of heap payloads and their strong counts.
//!
//! Every string, function and table payload is registered here on creation.
//! Strong handles retain and release through the ledger's single mutex; weak
//! handles only ever look a payload up. Freed payloads are dropped after the
//! lock is released, so tearing down nested tables re-enters the ledger
//! without a reentrant mutex, and they are drained from a per-thread
//! worklist so the depth of a structure never becomes stack depth.

pub mod ledger_arena;
pub mod ledger_entry;
pub mod ledger_handle;
pub mod payload;
mod teardown;

pub use ledger_arena::{Ledger, LedgerStats, configure, stats, strong_count};
pub use ledger_handle::LedgerHandle;
pub use payload::{Callable, Payload, TableMap};

pub(crate) use ledger_arena::{is_live, pin, register, release, retain};
