use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billbook_core::{CustomerId, DomainError, DomainResult, PaymentId};

/// How a collection was received. Unlike a sale's payment tags there is no
/// credit pseudo-method here: a received payment is always real money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptMethod {
    Cash,
    #[serde(rename = "UPI")]
    Upi,
    Card,
}

impl core::fmt::Display for ReceiptMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            ReceiptMethod::Cash => "Cash",
            ReceiptMethod::Upi => "UPI",
            ReceiptMethod::Card => "Card",
        };
        f.write_str(label)
    }
}

/// An immutable payment-received record. Settles part of a customer's
/// outstanding balance; individually reversible using the stored amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceived {
    id: PaymentId,
    /// Engine-assigned insertion order; tie-breaks equal timestamps in
    /// ledger statements.
    seq: u64,
    customer_id: CustomerId,
    /// Amount in smallest currency unit (e.g., paise).
    amount: i64,
    method: ReceiptMethod,
    occurred_at: DateTime<Utc>,
    notes: Option<String>,
}

impl PaymentReceived {
    pub fn record(
        id: PaymentId,
        seq: u64,
        customer_id: CustomerId,
        amount: i64,
        method: ReceiptMethod,
        occurred_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> DomainResult<Self> {
        if amount <= 0 {
            return Err(DomainError::validation("payment amount must be positive"));
        }

        Ok(Self {
            id,
            seq,
            customer_id,
            amount,
            method,
            occurred_at,
            notes,
        })
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn method(&self) -> ReceiptMethod {
        self.method
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}
