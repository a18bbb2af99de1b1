use serde::{Deserialize, Serialize};

use billbook_core::{CustomerId, DomainError, DomainResult};

/// Input for registering a customer. Derived balances always start at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
}

/// A customer row.
///
/// `outstanding` (amount currently owed) and `total_paid` (cumulative amount
/// ever collected) are derived fields: they are adjusted only by the mutation
/// engine's operations, never computed ad hoc by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    phone: String,
    address: Option<String>,
    /// Amount in smallest currency unit (e.g., paise).
    outstanding: i64,
    /// Amount in smallest currency unit (e.g., paise).
    total_paid: i64,
}

/// Prefix bare local numbers with the default country code.
fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with("+91") {
        trimmed.to_string()
    } else {
        format!("+91{trimmed}")
    }
}

impl Customer {
    pub fn register(id: CustomerId, new: NewCustomer) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }

        Ok(Self {
            id,
            name: new.name,
            phone: normalize_phone(&new.phone),
            address: new.address,
            outstanding: 0,
            total_paid: 0,
        })
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn outstanding(&self) -> i64 {
        self.outstanding
    }

    pub fn total_paid(&self) -> i64 {
        self.total_paid
    }

    /// Apply a sale's financial impact: the unpaid portion raises
    /// `outstanding`, the collected portion raises `total_paid`.
    ///
    /// Callers validate first; this method only applies deltas.
    pub fn apply_sale(&mut self, credit: i64, collected: i64) {
        self.outstanding += credit;
        self.total_paid += collected;
    }

    /// Exact inverse of [`Customer::apply_sale`] for the same stored split.
    pub fn reverse_sale(&mut self, credit: i64, collected: i64) {
        self.outstanding -= credit;
        self.total_paid -= collected;
    }

    /// Apply a received payment: settles outstanding, counts as collected.
    pub fn apply_payment(&mut self, amount: i64) {
        self.outstanding -= amount;
        self.total_paid += amount;
    }

    /// Exact inverse of [`Customer::apply_payment`] for the stored amount.
    pub fn reverse_payment(&mut self, amount: i64) {
        self.outstanding += amount;
        self.total_paid -= amount;
    }
}
