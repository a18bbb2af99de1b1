//! Customer records and their derived balances.

pub mod customer;

pub use customer::{Customer, NewCustomer};
