//! Ledger configuration.
//!
//! Settings only constrain how the ledger arena grows; they never change
//! reference-counting semantics.

use std::env;

pub const CAPACITY_ENV: &str = "DYNVAR_LEDGER_CAPACITY";
pub const REUSE_ENV: &str = "DYNVAR_LEDGER_REUSE";

const DEFAULT_INITIAL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Slots reserved up front.
    pub initial_capacity: usize,

    /// Recycle freed slots (with a bumped generation). Disabling it makes
    /// every registration take a fresh slot, which is handy when chasing a
    /// stale handle.
    pub reuse_slots: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            reuse_slots: true,
        }
    }
}

impl LedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads overrides from `DYNVAR_LEDGER_CAPACITY` and `DYNVAR_LEDGER_REUSE`.
    /// Unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(capacity) = lookup(CAPACITY_ENV).and_then(|v| v.trim().parse().ok()) {
            config.initial_capacity = capacity;
        }
        if let Some(reuse) = lookup(REUSE_ENV).and_then(|v| parse_flag(&v)) {
            config.reuse_slots = reuse;
        }
        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
