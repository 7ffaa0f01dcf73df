//! Product snapshot
//!
//! Products are never managed entities here. Every wishlist entry, cart entry
//! and order line carries its own copy, so later catalog edits do not reach
//! past orders.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::domain::value_objects::{Money, ProductId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Money>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub seller: String,
    #[serde(default)]
    pub availability: u32,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_time: Option<String>,
}

impl ProductSnapshot {
    pub fn new(id: u64, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: ProductId(id), name: name.into(), description: String::new(), price,
            original_price: None, image: String::new(), seller: String::new(), availability: 0,
            rating: 0.0, reviews: 0, category: String::new(), tags: vec![], delivery_time: None,
        }
    }

    /// Percentage off the original price, rounded down.
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price.as_ref()?;
        if original.currency() != self.price.currency() || original.amount() <= self.price.amount() {
            return None;
        }
        let off = (original.amount() - self.price.amount()) * Decimal::from(100) / original.amount();
        off.trunc().to_u32()
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.description.to_lowercase().contains(&term)
    }
}
