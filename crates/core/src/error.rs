//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, missing references). Infrastructure concerns belong elsewhere.
///
/// All preconditions fail fast with one of these variants and apply no
/// partial effect; none are retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, a payments list
    /// that does not sum to the sale total).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist; carries the entity kind
    /// (e.g. "product", "customer", "sale").
    #[error("{0} not found")]
    NotFound(String),

    /// A sale would drive a product's stock below zero.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// A sale carries an unpaid portion but no customer to attribute it to.
    #[error("credit sale requires a customer")]
    CreditRequiresCustomer,

    /// A restore snapshot is missing required collections.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: impl Into<String>) -> Self {
        Self::NotFound(kind.into())
    }

    pub fn insufficient_stock(requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
