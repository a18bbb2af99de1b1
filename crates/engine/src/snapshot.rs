//! Bulk export/restore snapshots.
//!
//! A snapshot carries all five collections. Restore validates the presence
//! of every collection before anything is applied: partial or malformed
//! snapshots are rejected wholesale, never partially applied.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use billbook_core::{DomainError, DomainResult};
use billbook_customers::Customer;
use billbook_payments::PaymentReceived;
use billbook_products::Product;
use billbook_purchasing::Purchase;
use billbook_sales::Sale;

/// Collection keys a snapshot must carry. `paymentsReceived` keeps the
/// export file spelling for backup compatibility.
pub const REQUIRED_COLLECTIONS: [&str; 5] =
    ["customers", "products", "sales", "purchases", "paymentsReceived"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    pub purchases: Vec<Purchase>,
    #[serde(rename = "paymentsReceived")]
    pub payments_received: Vec<PaymentReceived>,
}

impl Snapshot {
    /// Parse a snapshot from untrusted JSON (e.g. an imported backup file).
    ///
    /// Unknown extra keys (like an export timestamp) are ignored; missing
    /// collections are reported together in one error.
    pub fn from_value(value: &Value) -> DomainResult<Self> {
        let Some(object) = value.as_object() else {
            return Err(DomainError::invalid_snapshot("expected a JSON object"));
        };

        let missing: Vec<&str> = REQUIRED_COLLECTIONS
            .iter()
            .filter(|key| !object.contains_key(**key))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::invalid_snapshot(format!(
                "missing collections: {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(value.clone())
            .map_err(|e| DomainError::invalid_snapshot(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_but_complete_snapshot_parses() {
        let value = json!({
            "customers": [],
            "products": [],
            "sales": [],
            "purchases": [],
            "paymentsReceived": [],
            "exportDate": "2024-08-10T00:00:00Z",
        });
        let snapshot = Snapshot::from_value(&value).unwrap();
        assert!(snapshot.customers.is_empty());
    }

    #[test]
    fn missing_collections_are_reported_together() {
        let value = json!({
            "customers": [],
            "sales": [],
        });
        let err = Snapshot::from_value(&value).unwrap_err();
        match err {
            DomainError::InvalidSnapshot(msg) => {
                assert!(msg.contains("products"));
                assert!(msg.contains("purchases"));
                assert!(msg.contains("paymentsReceived"));
            }
            other => panic!("expected InvalidSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn non_object_is_rejected() {
        let err = Snapshot::from_value(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, DomainError::InvalidSnapshot(_)));
    }
}
