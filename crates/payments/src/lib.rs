//! Payments received against a customer's outstanding balance.

pub mod payment;

pub use payment::{PaymentReceived, ReceiptMethod};
