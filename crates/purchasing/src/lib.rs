//! Purchase records (stock intake).

pub mod purchase;

pub use purchase::{Purchase, PurchaseType};
