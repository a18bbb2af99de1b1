//! Sale records: line items, payment tags, and the credit/paid split.

pub mod sale;

pub use sale::{PaymentMethod, PaymentSplit, Sale, SaleItem, SalePayment};
