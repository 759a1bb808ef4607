use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use serde::Serialize;

/// Classification of ledger payloads for telemetry bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PayloadKind {
    String = 0,
    Function = 1,
    Table = 2,
}

impl PayloadKind {
    pub fn label(self) -> &'static str {
        match self {
            PayloadKind::String => "string",
            PayloadKind::Function => "function",
            PayloadKind::Table => "table",
        }
    }

    pub const ALL: [PayloadKind; 3] = [
        PayloadKind::String,
        PayloadKind::Function,
        PayloadKind::Table,
    ];
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub registered: usize,
    pub freed: usize,
}

impl KindCounts {
    /// Payloads of this kind registered but not yet freed.
    pub fn outstanding(&self) -> usize {
        self.registered.saturating_sub(self.freed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeakStats {
    pub strings: KindCounts,
    pub functions: KindCounts,
    pub tables: KindCounts,
}

impl LeakStats {
    pub fn get(&self, kind: PayloadKind) -> KindCounts {
        match kind {
            PayloadKind::String => self.strings,
            PayloadKind::Function => self.functions,
            PayloadKind::Table => self.tables,
        }
    }
}

static REGISTERED: [AtomicUsize; 3] = [
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
];
static FREED: [AtomicUsize; 3] = [
    AtomicUsize::new(0),
    AtomicUsize::new(0),
    AtomicUsize::new(0),
];

pub fn record_register(kind: PayloadKind) {
    REGISTERED[kind as usize].fetch_add(1, Ordering::Relaxed);
}

pub fn record_free(kind: PayloadKind) {
    FREED[kind as usize].fetch_add(1, Ordering::Relaxed);
}

fn counts(kind: PayloadKind) -> KindCounts {
    KindCounts {
        registered: REGISTERED[kind as usize].load(Ordering::Relaxed),
        freed: FREED[kind as usize].load(Ordering::Relaxed),
    }
}

pub fn snapshot() -> LeakStats {
    LeakStats {
        strings: counts(PayloadKind::String),
        functions: counts(PayloadKind::Function),
        tables: counts(PayloadKind::Table),
    }
}
