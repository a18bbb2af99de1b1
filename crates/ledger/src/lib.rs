//! Read-only derivations over the entity store: per-customer running-balance
//! statements and the dashboard business summary.
//!
//! Everything in this crate is a pure function of its inputs: no stored
//! entity is mutated, and identical inputs yield identical output.

pub mod statement;
pub mod summary;

pub use statement::{project_statement, LedgerEntry, LedgerStatement, StatementWindow};
pub use summary::{summarize, BusinessSummary, LOW_STOCK_THRESHOLD};
