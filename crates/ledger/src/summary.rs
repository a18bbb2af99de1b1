use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billbook_core::ProductId;
use billbook_customers::Customer;
use billbook_products::Product;
use billbook_sales::Sale;

/// Stock level at or below which a product counts as low-stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Aggregates feeding the dashboard and the insight prompt. Pure read-only
/// derivation; the text generation that consumes it lives outside this
/// system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessSummary {
    /// Sum of all sale totals, all time.
    pub total_sales: i64,
    /// Sum of sale totals dated today (UTC day of `now`).
    pub sales_today: i64,
    /// Pending credit to collect: sum of customer outstanding balances.
    pub total_outstanding: i64,
    /// Products with stock at or below [`LOW_STOCK_THRESHOLD`].
    pub low_stock_count: usize,
    /// Product with the highest summed sold quantity, if any units sold.
    pub top_product: Option<ProductId>,
}

pub fn summarize(
    customers: &[Customer],
    products: &[Product],
    sales: &[Sale],
    now: DateTime<Utc>,
) -> BusinessSummary {
    let today = now.date_naive();

    let total_sales = sales.iter().map(Sale::total_amount).sum();
    let sales_today = sales
        .iter()
        .filter(|s| s.occurred_at().date_naive() == today)
        .map(Sale::total_amount)
        .sum();
    let total_outstanding = customers.iter().map(Customer::outstanding).sum();
    let low_stock_count = products
        .iter()
        .filter(|p| p.stock() <= LOW_STOCK_THRESHOLD)
        .count();

    let mut sold_qty: HashMap<ProductId, i64> = HashMap::new();
    for sale in sales {
        for item in sale.items() {
            *sold_qty.entry(item.product_id).or_insert(0) += item.qty;
        }
    }
    // Resolve ties by catalog order so the result is deterministic.
    let mut top_product = None;
    let mut top_qty = 0;
    for product in products {
        let qty = sold_qty.get(&product.id()).copied().unwrap_or(0);
        if qty > top_qty {
            top_qty = qty;
            top_product = Some(product.id());
        }
    }

    BusinessSummary {
        total_sales,
        sales_today,
        total_outstanding,
        low_stock_count,
        top_product,
    }
}
