pub mod runtime;

pub use runtime::{
    config::LedgerConfig,
    convert::{FromNumber, render_table, to_number, to_number_as, to_string},
    error::{TypeError, TypeResult},
    iter::TableIter,
    ledger,
    table_ref::Ref,
    value::{Kind, Ownership, Value},
};
