//! `billbook-engine` — the entity store and mutation engine.
//!
//! A [`Store`] owns the five collections (customers, products, sales,
//! purchases, payments received) and exposes the only operations that may
//! mutate them. Each operation is a single atomic transition: it validates
//! fully, then commits, so a failed precondition leaves no partial effect.
//! Read-side derivations (ledger statements, business summary) are delegated
//! to `billbook-ledger`.

pub mod durable;
pub mod snapshot;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use durable::{DurableStore, MemoryStore};
pub use snapshot::Snapshot;
pub use store::{PaymentDraft, PurchaseDraft, SaleDraft, SaleLineDraft, Store};
