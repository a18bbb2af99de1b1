use serde::{Deserialize, Serialize};

use billbook_core::{DomainError, DomainResult, ProductId};

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    /// Price in smallest currency unit (e.g., paise).
    pub buy_price: i64,
    pub buy_gst: u32,
    /// Price in smallest currency unit (e.g., paise).
    pub sell_price: i64,
    pub sell_gst: u32,
    pub stock: i64,
    pub category: Option<String>,
    pub is_active: bool,
}

/// Catalog fields that may change after creation.
///
/// Stock is deliberately absent: it moves only through sales and purchases,
/// otherwise the stock invariants would be unenforceable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub buy_price: Option<i64>,
    pub buy_gst: Option<u32>,
    pub sell_price: Option<i64>,
    pub sell_gst: Option<u32>,
    pub category: Option<Option<String>>,
    pub is_active: Option<bool>,
}

/// A product row.
///
/// Prices and GST rates here are the *current* catalog values; sales capture
/// their own copies at sale time, so editing these never rewrites history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    buy_price: i64,
    buy_gst: u32,
    sell_price: i64,
    sell_gst: u32,
    /// Units on hand. Never persisted negative; sales that would drive it
    /// below zero are rejected before any mutation.
    stock: i64,
    category: Option<String>,
    is_active: bool,
}

impl Product {
    pub fn create(id: ProductId, new: NewProduct) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if new.buy_price < 0 || new.sell_price < 0 {
            return Err(DomainError::validation("prices cannot be negative"));
        }
        if new.stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }

        Ok(Self {
            id,
            name: new.name,
            buy_price: new.buy_price,
            buy_gst: new.buy_gst,
            sell_price: new.sell_price,
            sell_gst: new.sell_gst,
            stock: new.stock,
            category: new.category,
            is_active: new.is_active,
        })
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buy_price(&self) -> i64 {
        self.buy_price
    }

    pub fn buy_gst(&self) -> u32 {
        self.buy_gst
    }

    pub fn sell_price(&self) -> i64 {
        self.sell_price
    }

    pub fn sell_gst(&self) -> u32 {
        self.sell_gst
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Apply catalog edits. Absent fields keep their current value.
    pub fn apply_patch(&mut self, patch: ProductPatch) -> DomainResult<()> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("product name cannot be empty"));
            }
        }
        if patch.buy_price.is_some_and(|p| p < 0) || patch.sell_price.is_some_and(|p| p < 0) {
            return Err(DomainError::validation("prices cannot be negative"));
        }

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(buy_price) = patch.buy_price {
            self.buy_price = buy_price;
        }
        if let Some(buy_gst) = patch.buy_gst {
            self.buy_gst = buy_gst;
        }
        if let Some(sell_price) = patch.sell_price {
            self.sell_price = sell_price;
        }
        if let Some(sell_gst) = patch.sell_gst {
            self.sell_gst = sell_gst;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        Ok(())
    }

    /// Deduct sold units. Callers check availability first.
    pub fn deduct_stock(&mut self, qty: i64) {
        self.stock -= qty;
    }

    /// Add purchased (or replenished on sale reversal) units.
    pub fn replenish_stock(&mut self, qty: i64) {
        self.stock += qty;
    }
}
