use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billbook_core::{line_gross, DomainError, DomainResult, ProductId, PurchaseId};

/// How a purchase was settled with the supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseType {
    #[serde(rename = "Cash Purchase")]
    CashPurchase,
    #[serde(rename = "Credit Purchase")]
    CreditPurchase,
}

/// An immutable purchase record. Always increases the product's stock; has
/// no customer-side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    id: PurchaseId,
    product_id: ProductId,
    qty: i64,
    /// Unit buy price at purchase time, smallest currency unit.
    buy_price: i64,
    buy_gst: u32,
    total_amount: i64,
    payment_type: PurchaseType,
    occurred_at: DateTime<Utc>,
}

impl Purchase {
    /// Validate and record a purchase. `total_amount` is
    /// `qty * buy_price` plus GST at the captured rate.
    pub fn record(
        id: PurchaseId,
        product_id: ProductId,
        qty: i64,
        buy_price: i64,
        buy_gst: u32,
        payment_type: PurchaseType,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if qty <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if buy_price < 0 {
            return Err(DomainError::validation("buy price cannot be negative"));
        }

        Ok(Self {
            id,
            product_id,
            qty,
            buy_price,
            buy_gst,
            total_amount: line_gross(qty, buy_price, buy_gst),
            payment_type,
            occurred_at,
        })
    }

    pub fn id(&self) -> PurchaseId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn qty(&self) -> i64 {
        self.qty
    }

    pub fn buy_price(&self) -> i64 {
        self.buy_price
    }

    pub fn buy_gst(&self) -> u32 {
        self.buy_gst
    }

    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }

    pub fn payment_type(&self) -> PurchaseType {
        self.payment_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
