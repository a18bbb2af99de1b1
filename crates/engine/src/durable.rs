//! Durable key-value port.
//!
//! Persistence is an opaque get/set-by-key contract over JSON values: the
//! store hydrates from it at startup and rewrites the affected keys after
//! every committed mutation. A failure to persist is logged by the caller,
//! never surfaced as a transaction failure — the in-memory state is the
//! source of truth for the running session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

/// Keys under which the five collections are persisted.
pub mod keys {
    pub const CUSTOMERS: &str = "data_customers";
    pub const PRODUCTS: &str = "data_products";
    pub const SALES: &str = "data_sales";
    pub const PURCHASES: &str = "data_purchases";
    pub const PAYMENTS_RECEIVED: &str = "data_payments_received";
}

/// The persistence boundary. Implementations are synchronous; errors use
/// `anyhow` since this is an infrastructure concern, not a domain failure.
pub trait DurableStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> anyhow::Result<()>;
}

/// In-memory durable store.
///
/// Cloning yields a handle onto the same underlying map, so tests can keep
/// one handle and hand the other to a [`crate::Store`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
