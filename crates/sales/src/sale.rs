use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billbook_core::{line_gross, CustomerId, DomainError, DomainResult, ProductId, SaleId};

/// Payment method tag on a sale.
///
/// `CreditSale` is a pseudo-payment: it marks the unpaid portion attributed
/// to the customer's outstanding balance, not a cash movement. It exists so
/// that the sum of a sale's payments always equals its total exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "UPI")]
    Upi,
    Card,
    #[serde(rename = "Credit Sale")]
    CreditSale,
}

impl PaymentMethod {
    pub fn is_credit(self) -> bool {
        matches!(self, PaymentMethod::CreditSale)
    }
}

/// One payment entry on a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePayment {
    pub method: PaymentMethod,
    /// Amount in smallest currency unit (e.g., paise).
    pub amount: i64,
}

/// One cart line, with prices and GST rate captured at sale time.
///
/// Capturing prices on the record makes deletion an exact inverse even after
/// the catalog price has drifted, and keeps margin reporting honest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub product_id: ProductId,
    pub qty: i64,
    /// Unit sell price at sale time, smallest currency unit.
    pub sell_price: i64,
    pub sell_gst: u32,
    /// Unit buy price at sale time, for margin reporting.
    pub buy_price_at_sale: i64,
}

impl SaleItem {
    /// Gross value of this line: `qty * sell_price` plus GST.
    pub fn gross(&self) -> i64 {
        line_gross(self.qty, self.sell_price, self.sell_gst)
    }
}

/// A sale's payments partitioned into the unpaid (credit) portion and the
/// cash-equivalent collected portion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaymentSplit {
    /// Sum of `CreditSale` entries: raises the customer's outstanding.
    pub credit: i64,
    /// Sum of everything else: raises the customer's total paid.
    pub collected: i64,
}

/// Partition payments by tag. Used both when applying a sale and when
/// reversing it — always over the *stored* payments array, never recomputed
/// from current catalog state.
pub fn split_payments(payments: &[SalePayment]) -> PaymentSplit {
    payments.iter().fold(PaymentSplit::default(), |mut acc, p| {
        if p.method.is_credit() {
            acc.credit += p.amount;
        } else {
            acc.collected += p.amount;
        }
        acc
    })
}

/// Gross total for a cart: sum of line grosses minus a flat discount
/// subtracted after tax.
pub fn total_amount(items: &[SaleItem], discount: i64) -> i64 {
    items.iter().map(SaleItem::gross).sum::<i64>() - discount
}

/// An immutable sale record.
///
/// Constructed only through [`Sale::record`], which enforces the balance
/// identity (`sum(payments) == total_amount`) and the credit-requires-customer
/// rule. Once recorded, a sale is never edited; only the customer and product
/// rows it affected are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    /// Engine-assigned insertion order; tie-breaks equal timestamps in
    /// ledger statements.
    seq: u64,
    bill_no: String,
    customer_id: Option<CustomerId>,
    items: Vec<SaleItem>,
    /// Flat amount subtracted after tax, smallest currency unit.
    discount: i64,
    payments: Vec<SalePayment>,
    total_amount: i64,
    occurred_at: DateTime<Utc>,
}

impl Sale {
    /// Validate and record a sale.
    ///
    /// Stock availability is the caller's concern (it needs the product
    /// rows); everything expressible from the record alone is checked here.
    pub fn record(
        id: SaleId,
        seq: u64,
        bill_no: String,
        customer_id: Option<CustomerId>,
        items: Vec<SaleItem>,
        discount: i64,
        payments: Vec<SalePayment>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("sale must have at least one item"));
        }
        for item in &items {
            if item.qty <= 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            if item.sell_price < 0 || item.buy_price_at_sale < 0 {
                return Err(DomainError::validation("prices cannot be negative"));
            }
        }
        if discount < 0 {
            return Err(DomainError::validation("discount cannot be negative"));
        }
        for payment in &payments {
            if payment.amount < 0 {
                return Err(DomainError::validation("payment amount cannot be negative"));
            }
        }

        let total = total_amount(&items, discount);
        if total < 0 {
            return Err(DomainError::validation("discount exceeds sale total"));
        }

        let paid: i64 = payments.iter().map(|p| p.amount).sum();
        if paid != total {
            return Err(DomainError::validation(format!(
                "payments ({paid}) must sum to sale total ({total})"
            )));
        }

        let split = split_payments(&payments);
        if split.credit > 0 && customer_id.is_none() {
            return Err(DomainError::CreditRequiresCustomer);
        }

        Ok(Self {
            id,
            seq,
            bill_no,
            customer_id,
            items,
            discount,
            payments,
            total_amount: total,
            occurred_at,
        })
    }

    pub fn id(&self) -> SaleId {
        self.id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn bill_no(&self) -> &str {
        &self.bill_no
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn discount(&self) -> i64 {
        self.discount
    }

    pub fn payments(&self) -> &[SalePayment] {
        &self.payments
    }

    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// Credit/collected split re-derived from the stored payments array.
    pub fn payment_split(&self) -> PaymentSplit {
        split_payments(&self.payments)
    }

    /// Cost of goods sold at captured buy prices (pre-tax).
    pub fn cost_of_goods(&self) -> i64 {
        self.items
            .iter()
            .map(|i| (i.qty as i128 * i.buy_price_at_sale as i128) as i64)
            .sum()
    }
}
