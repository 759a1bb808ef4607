//! Dynamic values with ledger-based reference counting.
//!
//! # Ownership Model
//! Heap payloads (strings, functions, tables) are registered in a
//! process-wide ledger that tracks how many strong handles each one has.
//! The payload is freed exactly once, when that count reaches zero.
//!
//! Functions and tables can also be held weakly. Weak handles are not
//! counted, so they are how cycles get expressed:
//! - a table may store a weak handle to itself or to its parent,
//! - a weak handle reads as nil once the payload is gone,
//! - copying a live weak handle produces a strong one.
//!
//! A cycle made only of strong handles is never reclaimed.

pub mod config;
pub mod convert;
pub mod error;
pub mod iter;
pub mod leak_detector;
pub mod ledger;
pub mod ops;
pub mod serialize;
pub mod table_ref;
pub mod value;
