//! Iterative teardown of freed payloads.
//!
//! Dropping a table drops the values it holds, and each strong one may free
//! another payload. Doing that recursively costs stack in proportion to the
//! depth of the structure, so a long strong chain would overflow it. Instead
//! every freed payload goes onto a per-thread worklist, and only the
//! outermost release on a thread drains it.

use std::{cell::RefCell, sync::Arc};

use crate::runtime::ledger::payload::Payload;

#[derive(Default)]
struct Worklist {
    draining: bool,
    pending: Vec<Arc<Payload>>,
}

thread_local! {
    static WORKLIST: RefCell<Worklist> = RefCell::new(Worklist::default());
}

/// Resets the draining flag even if a payload's drop panics.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        // Leftovers are dropped after the borrow ends, since they may queue more.
        let leftover = WORKLIST.try_with(|list| {
            let mut list = list.borrow_mut();
            list.draining = false;
            std::mem::take(&mut list.pending)
        });
        drop(leftover);
    }
}

/// Drops `payload` and everything it transitively frees, in a loop.
///
/// Must be called without the ledger lock held.
pub(crate) fn dispose(payload: Arc<Payload>) {
    // During thread shutdown the worklist may already be gone; fall back to a
    // plain drop.
    let queued = WORKLIST.try_with(|list| {
        let mut list = list.borrow_mut();
        list.pending.push(payload);
        std::mem::replace(&mut list.draining, true)
    });

    match queued {
        // A drain further up this thread's stack picks it up.
        Ok(true) => {}
        Ok(false) => {
            let _guard = DrainGuard;
            while let Some(next) = WORKLIST.with(|list| list.borrow_mut().pending.pop()) {
                // No borrow of the worklist is held while this runs, so the
                // drop can queue more payloads.
                drop(next);
            }
        }
        Err(_) => {}
    }
}
