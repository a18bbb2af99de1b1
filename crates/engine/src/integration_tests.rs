//! End-to-end tests driving the store through full business flows.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;

use billbook_core::{CustomerId, DomainError, PaymentId, ProductId, PurchaseId};
use billbook_customers::NewCustomer;
use billbook_ledger::StatementWindow;
use billbook_payments::ReceiptMethod;
use billbook_products::{NewProduct, ProductPatch};
use billbook_purchasing::PurchaseType;
use billbook_sales::{PaymentMethod, SalePayment};

use crate::durable::{keys, DurableStore, MemoryStore};
use crate::store::{PaymentDraft, PurchaseDraft, SaleDraft, SaleLineDraft, Store};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn soap() -> NewProduct {
    NewProduct {
        name: "Soap".to_string(),
        buy_price: 8_000,
        buy_gst: 18,
        sell_price: 10_000,
        sell_gst: 18,
        stock: 10,
        category: Some("FMCG".to_string()),
        is_active: true,
    }
}

fn aarav() -> NewCustomer {
    NewCustomer {
        name: "Aarav".to_string(),
        phone: "9876543210".to_string(),
        address: None,
    }
}

/// A store seeded with one customer and one product (stock 10, sell 100.00
/// at 18% GST).
fn seeded_store() -> (Store, CustomerId, ProductId) {
    let mut store = Store::new();
    let customer_id = store.add_customer(aarav()).unwrap();
    let product_id = store.add_product(soap()).unwrap();
    (store, customer_id, product_id)
}

fn cash_sale_draft(product_id: ProductId, qty: i64, amount: i64) -> SaleDraft {
    SaleDraft {
        customer_id: None,
        items: vec![SaleLineDraft { product_id, qty }],
        discount: 0,
        payments: vec![SalePayment {
            method: PaymentMethod::Cash,
            amount,
        }],
        occurred_at: at(2024, 8, 10),
    }
}

#[test]
fn cash_sale_totals_and_deducts_stock() {
    let (mut store, _, product_id) = seeded_store();

    // 2 x 100.00 at 18% GST = 236.00.
    let sale_id = store
        .create_sale(cash_sale_draft(product_id, 2, 23_600))
        .unwrap();

    let sale = store.sale(sale_id).unwrap();
    assert_eq!(sale.total_amount(), 23_600);
    assert_eq!(sale.bill_no(), "INV-000001");
    assert_eq!(store.product(product_id).unwrap().stock(), 8);
}

#[test]
fn bill_numbers_increase_with_every_sale() {
    let (mut store, _, product_id) = seeded_store();

    let first = store
        .create_sale(cash_sale_draft(product_id, 1, 11_800))
        .unwrap();
    let second = store
        .create_sale(cash_sale_draft(product_id, 1, 11_800))
        .unwrap();

    assert_eq!(store.sale(first).unwrap().bill_no(), "INV-000001");
    assert_eq!(store.sale(second).unwrap().bill_no(), "INV-000002");
}

#[test]
fn credit_sale_splits_between_outstanding_and_paid() {
    let (mut store, customer_id, product_id) = seeded_store();

    let sale_id = store
        .create_sale(SaleDraft {
            customer_id: Some(customer_id),
            items: vec![SaleLineDraft { product_id, qty: 2 }],
            discount: 0,
            payments: vec![
                SalePayment {
                    method: PaymentMethod::Cash,
                    amount: 10_000,
                },
                SalePayment {
                    method: PaymentMethod::CreditSale,
                    amount: 13_600,
                },
            ],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap();

    let customer = store.customer(customer_id).unwrap();
    assert_eq!(customer.outstanding(), 13_600);
    assert_eq!(customer.total_paid(), 10_000);

    // Deleting reverses the exact stored split and restores stock.
    store.delete_sale(sale_id).unwrap();
    let customer = store.customer(customer_id).unwrap();
    assert_eq!(customer.outstanding(), 0);
    assert_eq!(customer.total_paid(), 0);
    assert_eq!(store.product(product_id).unwrap().stock(), 10);
    assert!(store.sales().is_empty());
}

#[test]
fn insufficient_stock_leaves_no_partial_effect() {
    let (mut store, customer_id, product_id) = seeded_store();

    let err = store
        .create_sale(SaleDraft {
            customer_id: Some(customer_id),
            items: vec![SaleLineDraft {
                product_id,
                qty: 20,
            }],
            discount: 0,
            payments: vec![SalePayment {
                method: PaymentMethod::CreditSale,
                amount: 236_000,
            }],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap_err();

    assert_eq!(
        err,
        DomainError::InsufficientStock {
            requested: 20,
            available: 10
        }
    );
    assert_eq!(store.product(product_id).unwrap().stock(), 10);
    assert_eq!(store.customer(customer_id).unwrap().outstanding(), 0);
    assert!(store.sales().is_empty());

    // The failed attempt consumed no bill number.
    let sale_id = store
        .create_sale(cash_sale_draft(product_id, 1, 11_800))
        .unwrap();
    assert_eq!(store.sale(sale_id).unwrap().bill_no(), "INV-000001");
}

#[test]
fn repeated_cart_lines_are_checked_against_combined_stock() {
    let (mut store, _, product_id) = seeded_store();

    let err = store
        .create_sale(SaleDraft {
            customer_id: None,
            items: vec![
                SaleLineDraft { product_id, qty: 6 },
                SaleLineDraft { product_id, qty: 6 },
            ],
            discount: 0,
            payments: vec![SalePayment {
                method: PaymentMethod::Cash,
                amount: 141_600,
            }],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap_err();

    assert_eq!(
        err,
        DomainError::InsufficientStock {
            requested: 12,
            available: 10
        }
    );
}

#[test]
fn credit_without_customer_is_rejected() {
    let (mut store, _, product_id) = seeded_store();

    let err = store
        .create_sale(SaleDraft {
            customer_id: None,
            items: vec![SaleLineDraft { product_id, qty: 1 }],
            discount: 0,
            payments: vec![SalePayment {
                method: PaymentMethod::CreditSale,
                amount: 11_800,
            }],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap_err();

    assert_eq!(err, DomainError::CreditRequiresCustomer);
    assert_eq!(store.product(product_id).unwrap().stock(), 10);
}

#[test]
fn mismatched_payments_leave_stock_untouched() {
    let (mut store, _, product_id) = seeded_store();

    let err = store
        .create_sale(cash_sale_draft(product_id, 2, 20_000))
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(store.product(product_id).unwrap().stock(), 10);
}

#[test]
fn unknown_references_are_not_found() {
    let (mut store, _, product_id) = seeded_store();

    let err = store
        .create_sale(SaleDraft {
            customer_id: Some(CustomerId::new()),
            items: vec![SaleLineDraft { product_id, qty: 1 }],
            discount: 0,
            payments: vec![],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let err = store
        .create_sale(cash_sale_draft(ProductId::new(), 1, 11_800))
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[test]
fn purchase_replenishes_stock_with_gst_total() {
    let (mut store, _, product_id) = seeded_store();

    let purchase_id = store
        .create_purchase(PurchaseDraft {
            product_id,
            qty: 5,
            buy_price: 8_000,
            buy_gst: 18,
            payment_type: PurchaseType::CashPurchase,
            occurred_at: at(2024, 8, 10),
        })
        .unwrap();

    let purchase = store
        .purchases()
        .iter()
        .find(|p| p.id() == purchase_id)
        .unwrap();
    assert_eq!(purchase.total_amount(), 47_200);
    assert_eq!(store.product(product_id).unwrap().stock(), 15);
}

#[test]
fn update_product_edits_catalog_but_never_stock() {
    let (mut store, _, product_id) = seeded_store();

    store
        .update_product(
            product_id,
            ProductPatch {
                sell_price: Some(12_000),
                ..ProductPatch::default()
            },
        )
        .unwrap();

    let product = store.product(product_id).unwrap();
    assert_eq!(product.sell_price(), 12_000);
    assert_eq!(product.stock(), 10);

    let err = store
        .update_product(ProductId::new(), ProductPatch::default())
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[test]
fn bulk_products_are_all_or_nothing() {
    let mut store = Store::new();

    let err = store
        .add_bulk_products(vec![
            soap(),
            NewProduct {
                name: " ".to_string(),
                ..soap()
            },
        ])
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert!(store.products().is_empty());

    let ids = store
        .add_bulk_products(vec![
            soap(),
            NewProduct {
                name: "Oil".to_string(),
                ..soap()
            },
        ])
        .unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(store.products().len(), 2);
}

#[test]
fn per_customer_filters_and_record_lookups() {
    let (mut store, customer_id, product_id) = seeded_store();
    let other_id = store
        .add_customer(NewCustomer {
            name: "Meera".to_string(),
            phone: "9000000001".to_string(),
            address: None,
        })
        .unwrap();

    let credit_draft = |cid| SaleDraft {
        customer_id: Some(cid),
        items: vec![SaleLineDraft { product_id, qty: 1 }],
        discount: 0,
        payments: vec![SalePayment {
            method: PaymentMethod::CreditSale,
            amount: 11_800,
        }],
        occurred_at: at(2024, 8, 10),
    };
    let sale_id = store.create_sale(credit_draft(customer_id)).unwrap();
    store.create_sale(credit_draft(other_id)).unwrap();
    // Anonymous sale: attributed to no customer at all.
    store
        .create_sale(cash_sale_draft(product_id, 1, 11_800))
        .unwrap();

    let payment_id = store
        .create_payment_received(PaymentDraft {
            customer_id,
            amount: 5_000,
            method: ReceiptMethod::Cash,
            occurred_at: at(2024, 8, 11),
            notes: None,
        })
        .unwrap();

    let sales = store.sales_by_customer(customer_id);
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].id(), sale_id);

    let payments = store.payments_by_customer(customer_id);
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].id(), payment_id);
    assert!(store.payments_by_customer(other_id).is_empty());

    assert_eq!(store.payment_received(payment_id).unwrap().amount(), 5_000);
    assert!(store.payment_received(PaymentId::new()).is_none());

    let purchase_id = store
        .create_purchase(PurchaseDraft {
            product_id,
            qty: 5,
            buy_price: 8_000,
            buy_gst: 18,
            payment_type: PurchaseType::CashPurchase,
            occurred_at: at(2024, 8, 12),
        })
        .unwrap();
    assert_eq!(store.purchase(purchase_id).unwrap().qty(), 5);
    assert!(store.purchase(PurchaseId::new()).is_none());
}

#[test]
fn payment_lifecycle_settles_and_reverses() {
    let (mut store, customer_id, product_id) = seeded_store();

    store
        .create_sale(SaleDraft {
            customer_id: Some(customer_id),
            items: vec![SaleLineDraft { product_id, qty: 2 }],
            discount: 0,
            payments: vec![SalePayment {
                method: PaymentMethod::CreditSale,
                amount: 23_600,
            }],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap();

    let payment_id = store
        .create_payment_received(PaymentDraft {
            customer_id,
            amount: 10_000,
            method: ReceiptMethod::Upi,
            occurred_at: at(2024, 8, 11),
            notes: None,
        })
        .unwrap();

    let customer = store.customer(customer_id).unwrap();
    assert_eq!(customer.outstanding(), 13_600);
    assert_eq!(customer.total_paid(), 10_000);

    store.delete_payment_received(payment_id).unwrap();
    let customer = store.customer(customer_id).unwrap();
    assert_eq!(customer.outstanding(), 23_600);
    assert_eq!(customer.total_paid(), 0);
}

#[test]
fn overpayment_is_rejected() {
    let (mut store, customer_id, product_id) = seeded_store();

    store
        .create_sale(SaleDraft {
            customer_id: Some(customer_id),
            items: vec![SaleLineDraft { product_id, qty: 1 }],
            discount: 0,
            payments: vec![SalePayment {
                method: PaymentMethod::CreditSale,
                amount: 11_800,
            }],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap();

    let err = store
        .create_payment_received(PaymentDraft {
            customer_id,
            amount: 11_801,
            method: ReceiptMethod::Cash,
            occurred_at: at(2024, 8, 11),
            notes: None,
        })
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(store.customer(customer_id).unwrap().outstanding(), 11_800);
}

#[test]
fn deleting_a_settled_credit_sale_is_rejected() {
    let (mut store, customer_id, product_id) = seeded_store();

    let sale_id = store
        .create_sale(SaleDraft {
            customer_id: Some(customer_id),
            items: vec![SaleLineDraft { product_id, qty: 1 }],
            discount: 0,
            payments: vec![SalePayment {
                method: PaymentMethod::CreditSale,
                amount: 11_800,
            }],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap();

    store
        .create_payment_received(PaymentDraft {
            customer_id,
            amount: 11_800,
            method: ReceiptMethod::Cash,
            occurred_at: at(2024, 8, 11),
            notes: None,
        })
        .unwrap();

    // The credit was settled; reversing the sale would drive outstanding
    // negative.
    let err = store.delete_sale(sale_id).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(store.sales().len(), 1);
    assert_eq!(store.product(product_id).unwrap().stock(), 9);
}

#[test]
fn deleting_a_payment_the_balances_cannot_cover_is_rejected() {
    // A drifted backup can carry a payment the customer's balances no
    // longer cover; reversing it would drive total paid negative.
    let customer_id = CustomerId::new();
    let payment_id = PaymentId::new();
    let snapshot = json!({
        "customers": [{
            "id": customer_id,
            "name": "Aarav",
            "phone": "+919876543210",
            "address": null,
            "outstanding": 10_000,
            "total_paid": 0,
        }],
        "products": [],
        "sales": [],
        "purchases": [],
        "paymentsReceived": [{
            "id": payment_id,
            "seq": 1,
            "customer_id": customer_id,
            "amount": 10_000,
            "method": "Cash",
            "occurred_at": "2024-08-10T12:00:00Z",
            "notes": null,
        }],
    });

    let mut store = Store::new();
    store.restore(&snapshot).unwrap();

    let err = store.delete_payment_received(payment_id).unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert!(store.payment_received(payment_id).is_some());
    assert_eq!(store.customer(customer_id).unwrap().total_paid(), 0);
    assert_eq!(store.customer(customer_id).unwrap().outstanding(), 10_000);
}

#[test]
fn ledger_statement_through_the_store() {
    let mut store = Store::new();
    let customer_id = store.add_customer(aarav()).unwrap();
    let product_id = store
        .add_product(NewProduct {
            name: "Rice Bag".to_string(),
            buy_price: 20_000,
            buy_gst: 0,
            sell_price: 25_000,
            sell_gst: 0,
            stock: 100,
            category: None,
            is_active: true,
        })
        .unwrap();

    store
        .create_sale(SaleDraft {
            customer_id: Some(customer_id),
            items: vec![SaleLineDraft { product_id, qty: 2 }],
            discount: 0,
            payments: vec![SalePayment {
                method: PaymentMethod::CreditSale,
                amount: 50_000,
            }],
            occurred_at: at(2024, 8, 5),
        })
        .unwrap();
    store
        .create_payment_received(PaymentDraft {
            customer_id,
            amount: 20_000,
            method: ReceiptMethod::Cash,
            occurred_at: at(2024, 8, 8),
            notes: None,
        })
        .unwrap();

    let statement = store
        .ledger(customer_id, StatementWindow::AllTime, at(2024, 8, 10))
        .unwrap();
    assert_eq!(statement.opening_balance, 0);
    assert_eq!(statement.entries.len(), 2);
    assert_eq!(statement.closing_balance, 30_000);
    assert_eq!(
        statement.closing_balance,
        store.customer(customer_id).unwrap().outstanding()
    );

    let err = store
        .ledger(CustomerId::new(), StatementWindow::AllTime, at(2024, 8, 10))
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}

#[test]
fn summary_reflects_store_state() {
    let (mut store, customer_id, product_id) = seeded_store();

    store
        .create_sale(SaleDraft {
            customer_id: Some(customer_id),
            items: vec![SaleLineDraft { product_id, qty: 6 }],
            discount: 0,
            payments: vec![SalePayment {
                method: PaymentMethod::CreditSale,
                amount: 70_800,
            }],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap();

    let summary = store.summary(at(2024, 8, 10));
    assert_eq!(summary.total_sales, 70_800);
    assert_eq!(summary.sales_today, 70_800);
    assert_eq!(summary.total_outstanding, 70_800);
    // Stock dropped to 4, under the low-stock threshold.
    assert_eq!(summary.low_stock_count, 1);
    assert_eq!(summary.top_product, Some(product_id));
}

#[test]
fn restore_replaces_state_and_bad_snapshots_leave_it_untouched() {
    let (mut store, customer_id, product_id) = seeded_store();
    store
        .create_sale(cash_sale_draft(product_id, 2, 23_600))
        .unwrap();

    let exported = serde_json::to_value(store.snapshot()).unwrap();

    let mut replica = Store::new();
    replica.restore(&exported).unwrap();
    assert_eq!(replica.customers(), store.customers());
    assert_eq!(replica.products(), store.products());
    assert_eq!(replica.sales(), store.sales());

    // Sequence numbering resumes after the imported history.
    let sale_id = replica
        .create_sale(cash_sale_draft(product_id, 1, 11_800))
        .unwrap();
    assert_eq!(replica.sale(sale_id).unwrap().bill_no(), "INV-000002");

    let err = store
        .restore(&json!({ "customers": [], "products": [] }))
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidSnapshot(_)));
    assert_eq!(store.customer(customer_id).unwrap().name(), "Aarav");
    assert_eq!(store.sales().len(), 1);
}

#[test]
fn clear_wipes_everything_and_resets_numbering() {
    let (mut store, _, product_id) = seeded_store();
    store
        .create_sale(cash_sale_draft(product_id, 1, 11_800))
        .unwrap();

    store.clear();
    assert!(store.customers().is_empty());
    assert!(store.sales().is_empty());

    let product_id = store.add_product(soap()).unwrap();
    let sale_id = store
        .create_sale(cash_sale_draft(product_id, 1, 11_800))
        .unwrap();
    assert_eq!(store.sale(sale_id).unwrap().bill_no(), "INV-000001");
}

#[test]
fn commits_write_through_to_the_durable_store() {
    let durable = MemoryStore::new();
    let handle = durable.clone();

    let mut store = Store::with_durable(Box::new(durable));
    let customer_id = store.add_customer(aarav()).unwrap();
    let product_id = store.add_product(soap()).unwrap();
    store
        .create_sale(SaleDraft {
            customer_id: Some(customer_id),
            items: vec![SaleLineDraft { product_id, qty: 2 }],
            discount: 0,
            payments: vec![SalePayment {
                method: PaymentMethod::CreditSale,
                amount: 23_600,
            }],
            occurred_at: at(2024, 8, 10),
        })
        .unwrap();

    let persisted_sales = handle.get(keys::SALES).unwrap().unwrap();
    assert_eq!(persisted_sales.as_array().unwrap().len(), 1);

    // A fresh store hydrated from the same backing picks up where this one
    // left off.
    let reloaded = Store::load(Box::new(handle)).unwrap();
    assert_eq!(reloaded.customers(), store.customers());
    assert_eq!(reloaded.products(), store.products());
    assert_eq!(reloaded.sales(), store.sales());
    assert_eq!(
        reloaded.customer(customer_id).unwrap().outstanding(),
        23_600
    );
}

#[test]
fn loading_missing_keys_yields_an_empty_store() {
    let store = Store::load(Box::new(MemoryStore::new())).unwrap();
    assert!(store.customers().is_empty());
    assert!(store.products().is_empty());
}

#[test]
fn persistence_failure_does_not_fail_the_transaction() {
    struct FailingStore;

    impl DurableStore for FailingStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<serde_json::Value>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: serde_json::Value) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }
    }

    let mut store = Store::with_durable(Box::new(FailingStore));
    let product_id = store.add_product(soap()).unwrap();
    store
        .create_sale(cash_sale_draft(product_id, 2, 23_600))
        .unwrap();

    // The commit stands even though nothing could be persisted.
    assert_eq!(store.product(product_id).unwrap().stock(), 8);
    assert_eq!(store.sales().len(), 1);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Property: recording any run of valid sales and then deleting them in
    /// reverse order returns stock and customer balances to baseline.
    #[test]
    fn sales_and_their_deletions_cancel_exactly(
        carts in prop::collection::vec((1i64..4, 0u32..=100), 1..8),
    ) {
        let mut store = Store::new();
        let customer_id = store.add_customer(aarav()).unwrap();
        let product_id = store
            .add_product(NewProduct {
                stock: 1_000,
                ..soap()
            })
            .unwrap();

        let mut sale_ids = Vec::new();
        for (qty, credit_fraction) in carts {
            let total = billbook_core::line_gross(qty, 10_000, 18);
            let credit = (total as i128 * credit_fraction as i128 / 100) as i64;
            let collected = total - credit;

            let mut payments = Vec::new();
            if collected > 0 {
                payments.push(SalePayment { method: PaymentMethod::Cash, amount: collected });
            }
            if credit > 0 {
                payments.push(SalePayment { method: PaymentMethod::CreditSale, amount: credit });
            }

            let id = store
                .create_sale(SaleDraft {
                    customer_id: Some(customer_id),
                    items: vec![SaleLineDraft { product_id, qty }],
                    discount: 0,
                    payments,
                    occurred_at: at(2024, 8, 10),
                })
                .unwrap();
            sale_ids.push(id);
        }

        for id in sale_ids.into_iter().rev() {
            store.delete_sale(id).unwrap();
        }

        prop_assert_eq!(store.product(product_id).unwrap().stock(), 1_000);
        prop_assert_eq!(store.customer(customer_id).unwrap().outstanding(), 0);
        prop_assert_eq!(store.customer(customer_id).unwrap().total_paid(), 0);
        prop_assert!(store.sales().is_empty());
    }
}
