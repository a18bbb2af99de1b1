//! `billbook-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, PaymentId, ProductId, PurchaseId, SaleId};
pub use money::{gross, gst_component, line_gross};
