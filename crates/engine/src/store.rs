//! The entity store: five collections plus the atomic operations over them.
//!
//! Every mutation follows the same shape: resolve referenced entities,
//! validate every precondition, then commit all effects together. Nothing is
//! written until validation has fully passed, so an `Err` return guarantees
//! the store is exactly as it was.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use anyhow::Context as _;

use billbook_core::{
    CustomerId, DomainError, DomainResult, PaymentId, ProductId, PurchaseId, SaleId,
};
use billbook_customers::{Customer, NewCustomer};
use billbook_ledger::{
    project_statement, summarize, BusinessSummary, LedgerStatement, StatementWindow,
};
use billbook_payments::{PaymentReceived, ReceiptMethod};
use billbook_products::{NewProduct, Product, ProductPatch};
use billbook_purchasing::{Purchase, PurchaseType};
use billbook_sales::{Sale, SaleItem, SalePayment};

use crate::durable::{keys, DurableStore};
use crate::snapshot::Snapshot;

/// One cart line of a sale request. Prices and GST are looked up from the
/// current catalog at commit time, not supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLineDraft {
    pub product_id: ProductId,
    pub qty: i64,
}

/// A sale request as entered at the counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub customer_id: Option<CustomerId>,
    pub items: Vec<SaleLineDraft>,
    /// Flat amount subtracted after tax, smallest currency unit.
    pub discount: i64,
    pub payments: Vec<SalePayment>,
    pub occurred_at: DateTime<Utc>,
}

/// A stock purchase request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseDraft {
    pub product_id: ProductId,
    pub qty: i64,
    /// Unit buy price, smallest currency unit.
    pub buy_price: i64,
    pub buy_gst: u32,
    pub payment_type: PurchaseType,
    pub occurred_at: DateTime<Utc>,
}

/// A payment-received request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    pub customer_id: CustomerId,
    /// Amount in smallest currency unit (e.g., paise).
    pub amount: i64,
    pub method: ReceiptMethod,
    pub occurred_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Customers,
    Products,
    Sales,
    Purchases,
    PaymentsReceived,
}

const ALL_COLLECTIONS: [Collection; 5] = [
    Collection::Customers,
    Collection::Products,
    Collection::Sales,
    Collection::Purchases,
    Collection::PaymentsReceived,
];

/// The single-writer entity store.
pub struct Store {
    customers: Vec<Customer>,
    products: Vec<Product>,
    sales: Vec<Sale>,
    purchases: Vec<Purchase>,
    payments_received: Vec<PaymentReceived>,
    /// Next insertion sequence number; drives bill numbering and ledger
    /// tie-breaks.
    next_seq: u64,
    durable: Option<Box<dyn DurableStore>>,
}

fn next_seq_after(sales: &[Sale], payments: &[PaymentReceived]) -> u64 {
    sales
        .iter()
        .map(Sale::seq)
        .chain(payments.iter().map(PaymentReceived::seq))
        .max()
        .map_or(1, |max| max + 1)
}

fn read_collection<T: DeserializeOwned>(
    durable: &dyn DurableStore,
    key: &str,
) -> anyhow::Result<Vec<T>> {
    match durable.get(key)? {
        Some(value) => serde_json::from_value(value)
            .with_context(|| format!("malformed collection at key {key}")),
        None => Ok(Vec::new()),
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// An empty store with no persistence attached.
    pub fn new() -> Self {
        Self {
            customers: Vec::new(),
            products: Vec::new(),
            sales: Vec::new(),
            purchases: Vec::new(),
            payments_received: Vec::new(),
            next_seq: 1,
            durable: None,
        }
    }

    /// An empty store that writes through to `durable` after each commit.
    pub fn with_durable(durable: Box<dyn DurableStore>) -> Self {
        Self {
            durable: Some(durable),
            ..Self::new()
        }
    }

    /// Hydrate a store from its durable backing. Missing keys hydrate as
    /// empty collections; malformed ones are a hard error.
    pub fn load(durable: Box<dyn DurableStore>) -> anyhow::Result<Self> {
        let customers = read_collection(&*durable, keys::CUSTOMERS)?;
        let products = read_collection(&*durable, keys::PRODUCTS)?;
        let sales: Vec<Sale> = read_collection(&*durable, keys::SALES)?;
        let purchases = read_collection(&*durable, keys::PURCHASES)?;
        let payments_received: Vec<PaymentReceived> =
            read_collection(&*durable, keys::PAYMENTS_RECEIVED)?;

        let next_seq = next_seq_after(&sales, &payments_received);
        Ok(Self {
            customers,
            products,
            sales,
            purchases,
            payments_received,
            next_seq,
            durable: Some(durable),
        })
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    pub fn payments_received(&self) -> &[PaymentReceived] {
        &self.payments_received
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id() == id)
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id() == id)
    }

    pub fn sale(&self, id: SaleId) -> Option<&Sale> {
        self.sales.iter().find(|s| s.id() == id)
    }

    pub fn purchase(&self, id: PurchaseId) -> Option<&Purchase> {
        self.purchases.iter().find(|p| p.id() == id)
    }

    pub fn payment_received(&self, id: PaymentId) -> Option<&PaymentReceived> {
        self.payments_received.iter().find(|p| p.id() == id)
    }

    /// A customer's sales in insertion order.
    pub fn sales_by_customer(&self, id: CustomerId) -> Vec<&Sale> {
        self.sales
            .iter()
            .filter(|s| s.customer_id() == Some(id))
            .collect()
    }

    /// A customer's received payments in insertion order.
    pub fn payments_by_customer(&self, id: CustomerId) -> Vec<&PaymentReceived> {
        self.payments_received
            .iter()
            .filter(|p| p.customer_id() == id)
            .collect()
    }

    fn customer_mut(&mut self, id: CustomerId) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| c.id() == id)
    }

    fn product_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id() == id)
    }

    pub fn add_customer(&mut self, new: NewCustomer) -> DomainResult<CustomerId> {
        let id = CustomerId::new();
        let customer = Customer::register(id, new)?;
        tracing::debug!(customer_id = %id, name = customer.name(), "customer registered");
        self.customers.push(customer);
        self.persist(&[Collection::Customers]);
        Ok(id)
    }

    pub fn add_product(&mut self, new: NewProduct) -> DomainResult<ProductId> {
        let id = ProductId::new();
        let product = Product::create(id, new)?;
        tracing::debug!(product_id = %id, name = product.name(), "product created");
        self.products.push(product);
        self.persist(&[Collection::Products]);
        Ok(id)
    }

    /// Create many products at once. All-or-nothing: one invalid entry
    /// rejects the whole batch.
    pub fn add_bulk_products(&mut self, batch: Vec<NewProduct>) -> DomainResult<Vec<ProductId>> {
        let mut created = Vec::with_capacity(batch.len());
        for new in batch {
            created.push(Product::create(ProductId::new(), new)?);
        }

        let ids: Vec<ProductId> = created.iter().map(Product::id).collect();
        tracing::debug!(count = ids.len(), "bulk products created");
        self.products.extend(created);
        self.persist(&[Collection::Products]);
        Ok(ids)
    }

    /// Edit a product's catalog fields. Stock is not editable here; it moves
    /// only through sales and purchases.
    pub fn update_product(&mut self, id: ProductId, patch: ProductPatch) -> DomainResult<()> {
        let product = self
            .product_mut(id)
            .ok_or_else(|| DomainError::not_found("product"))?;
        product.apply_patch(patch)?;
        self.persist(&[Collection::Products]);
        Ok(())
    }

    /// Record a sale: captures current catalog prices onto the record,
    /// deducts stock, and applies the payment split to the customer.
    pub fn create_sale(&mut self, draft: SaleDraft) -> DomainResult<SaleId> {
        if let Some(customer_id) = draft.customer_id {
            self.customer(customer_id)
                .ok_or_else(|| DomainError::not_found("customer"))?;
        }

        let mut items = Vec::with_capacity(draft.items.len());
        for line in &draft.items {
            if line.qty <= 0 {
                return Err(DomainError::validation("quantity must be positive"));
            }
            let product = self
                .product(line.product_id)
                .ok_or_else(|| DomainError::not_found("product"))?;
            items.push(SaleItem {
                product_id: product.id(),
                qty: line.qty,
                sell_price: product.sell_price(),
                sell_gst: product.sell_gst(),
                buy_price_at_sale: product.buy_price(),
            });
        }

        // Stock is checked per product over the whole cart, so two lines of
        // the same product cannot slip past the availability check.
        let mut required: Vec<(ProductId, i64)> = Vec::new();
        for item in &items {
            match required.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, qty)) => *qty += item.qty,
                None => required.push((item.product_id, item.qty)),
            }
        }
        for &(product_id, qty) in &required {
            let available = self.product(product_id).map_or(0, Product::stock);
            if qty > available {
                return Err(DomainError::insufficient_stock(qty, available));
            }
        }

        let seq = self.next_seq;
        let id = SaleId::new();
        let sale = Sale::record(
            id,
            seq,
            format!("INV-{seq:06}"),
            draft.customer_id,
            items,
            draft.discount,
            draft.payments,
            draft.occurred_at,
        )?;

        // Commit.
        self.next_seq += 1;
        for (product_id, qty) in required {
            if let Some(product) = self.product_mut(product_id) {
                product.deduct_stock(qty);
            }
        }
        let split = sale.payment_split();
        if let Some(customer_id) = sale.customer_id() {
            if let Some(customer) = self.customer_mut(customer_id) {
                customer.apply_sale(split.credit, split.collected);
            }
        }
        tracing::debug!(
            sale_id = %id,
            bill_no = sale.bill_no(),
            total = sale.total_amount(),
            credit = split.credit,
            "sale recorded"
        );
        self.sales.push(sale);
        self.persist(&[
            Collection::Sales,
            Collection::Products,
            Collection::Customers,
        ]);
        Ok(id)
    }

    /// Delete a sale, reversing its exact stored effects: stock comes back
    /// and the customer's balances drop by the stored payment split.
    ///
    /// Rejected when later operations have already settled the balances the
    /// reversal would deduct, since that would drive them negative.
    pub fn delete_sale(&mut self, id: SaleId) -> DomainResult<()> {
        let position = self
            .sales
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| DomainError::not_found("sale"))?;

        let split = self.sales[position].payment_split();
        if let Some(customer_id) = self.sales[position].customer_id() {
            let customer = self
                .customer(customer_id)
                .ok_or_else(|| DomainError::not_found("customer"))?;
            if customer.outstanding() < split.credit || customer.total_paid() < split.collected {
                return Err(DomainError::validation(
                    "cannot reverse sale: balances were already settled by later operations",
                ));
            }
        }

        let sale = self.sales.remove(position);
        for item in sale.items() {
            if let Some(product) = self.product_mut(item.product_id) {
                product.replenish_stock(item.qty);
            }
        }
        if let Some(customer_id) = sale.customer_id() {
            if let Some(customer) = self.customer_mut(customer_id) {
                customer.reverse_sale(split.credit, split.collected);
            }
        }
        tracing::debug!(sale_id = %id, bill_no = sale.bill_no(), "sale deleted");
        self.persist(&[
            Collection::Sales,
            Collection::Products,
            Collection::Customers,
        ]);
        Ok(())
    }

    /// Record a stock purchase. Increases the product's stock; never touches
    /// customer balances.
    pub fn create_purchase(&mut self, draft: PurchaseDraft) -> DomainResult<PurchaseId> {
        self.product(draft.product_id)
            .ok_or_else(|| DomainError::not_found("product"))?;

        let id = PurchaseId::new();
        let purchase = Purchase::record(
            id,
            draft.product_id,
            draft.qty,
            draft.buy_price,
            draft.buy_gst,
            draft.payment_type,
            draft.occurred_at,
        )?;

        if let Some(product) = self.product_mut(draft.product_id) {
            product.replenish_stock(purchase.qty());
        }
        tracing::debug!(purchase_id = %id, qty = purchase.qty(), "purchase recorded");
        self.purchases.push(purchase);
        self.persist(&[Collection::Purchases, Collection::Products]);
        Ok(id)
    }

    /// Record a collection against a customer's outstanding balance.
    ///
    /// Overpayment is rejected rather than clamped, so every payment remains
    /// individually reversible by its stored amount.
    pub fn create_payment_received(&mut self, draft: PaymentDraft) -> DomainResult<PaymentId> {
        let customer = self
            .customer(draft.customer_id)
            .ok_or_else(|| DomainError::not_found("customer"))?;
        if draft.amount > customer.outstanding() {
            return Err(DomainError::validation(format!(
                "payment ({}) exceeds outstanding balance ({})",
                draft.amount,
                customer.outstanding()
            )));
        }

        let seq = self.next_seq;
        let id = PaymentId::new();
        let payment = PaymentReceived::record(
            id,
            seq,
            draft.customer_id,
            draft.amount,
            draft.method,
            draft.occurred_at,
            draft.notes,
        )?;

        self.next_seq += 1;
        if let Some(customer) = self.customer_mut(draft.customer_id) {
            customer.apply_payment(payment.amount());
        }
        tracing::debug!(payment_id = %id, amount = payment.amount(), "payment received");
        self.payments_received.push(payment);
        self.persist(&[Collection::PaymentsReceived, Collection::Customers]);
        Ok(id)
    }

    /// Delete a received payment, restoring the customer's balances by the
    /// stored amount. Rejected when the reversal would drive total paid
    /// negative.
    pub fn delete_payment_received(&mut self, id: PaymentId) -> DomainResult<()> {
        let position = self
            .payments_received
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| DomainError::not_found("payment"))?;

        let customer_id = self.payments_received[position].customer_id();
        let amount = self.payments_received[position].amount();
        let customer = self
            .customer(customer_id)
            .ok_or_else(|| DomainError::not_found("customer"))?;
        if customer.total_paid() < amount {
            return Err(DomainError::validation(
                "cannot reverse payment: balances were already settled by later operations",
            ));
        }

        self.payments_received.remove(position);
        if let Some(customer) = self.customer_mut(customer_id) {
            customer.reverse_payment(amount);
        }
        tracing::debug!(payment_id = %id, amount, "payment deleted");
        self.persist(&[Collection::PaymentsReceived, Collection::Customers]);
        Ok(())
    }

    /// Export all collections as a snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            customers: self.customers.clone(),
            products: self.products.clone(),
            sales: self.sales.clone(),
            purchases: self.purchases.clone(),
            payments_received: self.payments_received.clone(),
        }
    }

    /// Replace all collections from an imported snapshot value. Validation
    /// happens before anything is replaced, so a bad snapshot leaves the
    /// current state untouched.
    pub fn restore(&mut self, value: &Value) -> DomainResult<()> {
        let snapshot = Snapshot::from_value(value)?;

        self.next_seq = next_seq_after(&snapshot.sales, &snapshot.payments_received);
        self.customers = snapshot.customers;
        self.products = snapshot.products;
        self.sales = snapshot.sales;
        self.purchases = snapshot.purchases;
        self.payments_received = snapshot.payments_received;
        tracing::info!(
            customers = self.customers.len(),
            sales = self.sales.len(),
            "snapshot restored"
        );
        self.persist(&ALL_COLLECTIONS);
        Ok(())
    }

    /// Wipe every collection and reset sequence numbering.
    pub fn clear(&mut self) {
        self.customers.clear();
        self.products.clear();
        self.sales.clear();
        self.purchases.clear();
        self.payments_received.clear();
        self.next_seq = 1;
        tracing::info!("all data cleared");
        self.persist(&ALL_COLLECTIONS);
    }

    /// Project a customer's ledger statement over a date window.
    pub fn ledger(
        &self,
        customer_id: CustomerId,
        window: StatementWindow,
        now: DateTime<Utc>,
    ) -> DomainResult<LedgerStatement> {
        self.customer(customer_id)
            .ok_or_else(|| DomainError::not_found("customer"))?;
        Ok(project_statement(
            customer_id,
            &self.sales,
            &self.payments_received,
            window,
            now,
        ))
    }

    /// Dashboard aggregates over the current state.
    pub fn summary(&self, now: DateTime<Utc>) -> BusinessSummary {
        summarize(&self.customers, &self.products, &self.sales, now)
    }

    /// Write the given collections through to the durable backing, if any.
    ///
    /// Persistence failures are logged and swallowed: the committed
    /// in-memory state stays authoritative for the session.
    fn persist(&mut self, collections: &[Collection]) {
        if self.durable.is_none() {
            return;
        }

        let mut payloads = Vec::with_capacity(collections.len());
        for collection in collections {
            let (key, serialized) = match collection {
                Collection::Customers => {
                    (keys::CUSTOMERS, serde_json::to_value(&self.customers))
                }
                Collection::Products => (keys::PRODUCTS, serde_json::to_value(&self.products)),
                Collection::Sales => (keys::SALES, serde_json::to_value(&self.sales)),
                Collection::Purchases => (keys::PURCHASES, serde_json::to_value(&self.purchases)),
                Collection::PaymentsReceived => (
                    keys::PAYMENTS_RECEIVED,
                    serde_json::to_value(&self.payments_received),
                ),
            };
            payloads.push((key, serialized));
        }

        let Some(durable) = self.durable.as_mut() else {
            return;
        };
        for (key, serialized) in payloads {
            match serialized {
                Ok(value) => {
                    if let Err(error) = durable.set(key, value) {
                        tracing::warn!(key, %error, "failed to persist collection");
                    }
                }
                Err(error) => {
                    tracing::warn!(key, %error, "failed to serialize collection");
                }
            }
        }
    }
}
