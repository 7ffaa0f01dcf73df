//! Cart Aggregate

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::domain::aggregates::product::ProductSnapshot;
use crate::domain::value_objects::{Money, MoneyError, ProductId, Quantity};

/// Cart keyed by product id. Stored as a plain list of entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CartEntry>", into = "Vec<CartEntry>")]
pub struct Cart {
    entries: BTreeMap<ProductId, CartEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    #[serde(flatten)]
    pub product: ProductSnapshot,
    pub quantity: Quantity,
}

impl CartEntry {
    pub fn new(product: ProductSnapshot, quantity: u32) -> Self { Self { product, quantity: Quantity::new(quantity) } }
    pub fn id(&self) -> ProductId { self.product.id }
    pub fn line_total(&self) -> Money { self.product.price.multiply(self.quantity.value()) }
}

impl Cart {
    pub fn entries(&self) -> impl Iterator<Item = &CartEntry> { self.entries.values() }
    pub fn get(&self, id: ProductId) -> Option<&CartEntry> { self.entries.get(&id) }
    pub fn item_count(&self) -> usize { self.entries.len() }
    pub fn total_quantity(&self) -> u64 { self.entries.values().map(|e| u64::from(e.quantity.value())).sum() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn to_vec(&self) -> Vec<CartEntry> { self.entries.values().cloned().collect() }

    /// Increments an existing entry by one, otherwise adds it with quantity one.
    pub fn add_item(&mut self, product: ProductSnapshot) -> Quantity {
        let entry = self.entries.entry(product.id).or_insert_with(|| CartEntry { product, quantity: Quantity::default() });
        entry.quantity = entry.quantity.add(1);
        entry.quantity
    }

    /// Zero removes the entry. No upper bound and no availability check.
    pub fn update_quantity(&mut self, id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            self.remove_item(id);
            return Ok(());
        }
        let entry = self.entries.get_mut(&id).ok_or(CartError::ItemNotFound(id))?;
        entry.quantity = Quantity::new(quantity);
        Ok(())
    }

    pub fn remove_item(&mut self, id: ProductId) -> bool { self.entries.remove(&id).is_some() }

    pub fn clear(&mut self) { self.entries.clear(); }

    /// Takes checked-out quantities off the cart. Entries that reach zero go.
    pub fn deduct<'a>(&mut self, checked_out: impl IntoIterator<Item = &'a CartEntry>) {
        for taken in checked_out {
            let id = taken.id();
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.quantity = Quantity::new(entry.quantity.value().saturating_sub(taken.quantity.value()));
                if entry.quantity.is_zero() { self.entries.remove(&id); }
            }
        }
    }

    pub fn subtotal(&self, currency: &str) -> Result<Money, CartError> {
        subtotal(self.entries.values(), currency)
    }
}

/// Sum of price times quantity over any set of entries.
pub fn subtotal<'a>(entries: impl IntoIterator<Item = &'a CartEntry>, currency: &str) -> Result<Money, CartError> {
    entries.into_iter().try_fold(Money::zero(currency), |acc, e| acc.add(&e.line_total()).map_err(CartError::from))
}

impl From<Vec<CartEntry>> for Cart {
    fn from(list: Vec<CartEntry>) -> Self {
        let mut entries: BTreeMap<ProductId, CartEntry> = BTreeMap::new();
        for item in list {
            match entries.get_mut(&item.id()) {
                Some(existing) => existing.quantity = existing.quantity.add(item.quantity.value()),
                None => { entries.insert(item.id(), item); }
            }
        }
        entries.retain(|_, e| !e.quantity.is_zero());
        Self { entries }
    }
}

impl From<Cart> for Vec<CartEntry> {
    fn from(cart: Cart) -> Self { cart.entries.into_values().collect() }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),
    #[error(transparent)]
    Money(#[from] MoneyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn plates() -> ProductSnapshot { ProductSnapshot::new(1, "Areca Plates", Money::inr(299)) }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::default();
        cart.add_item(plates());
        assert_eq!(cart.item_count(), 1);
        cart.add_item(plates());
        assert_eq!(cart.get(ProductId(1)).unwrap().quantity.value(), 2); // Merged
        assert_eq!(cart.subtotal("INR").unwrap().amount(), Decimal::new(598, 0));
        cart.update_quantity(ProductId(1), 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_quantity_does_not_overflow() {
        let mut cart = Cart::default();
        cart.add_item(plates());
        cart.add_item(ProductSnapshot::new(2, "Areca Bowls", Money::inr(545)));
        cart.update_quantity(ProductId(1), u32::MAX).unwrap();
        assert_eq!(cart.total_quantity(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_deduct_keeps_what_was_not_checked_out() {
        let mut cart = Cart::default();
        cart.add_item(plates());
        cart.update_quantity(ProductId(1), 3).unwrap();
        cart.add_item(ProductSnapshot::new(6, "Areca Spoons", Money::inr(149)));
        cart.deduct(&[CartEntry::new(plates(), 2), CartEntry::new(ProductSnapshot::new(6, "Areca Spoons", Money::inr(149)), 1)]);
        assert_eq!(cart.get(ProductId(1)).unwrap().quantity.value(), 1);
        assert!(cart.get(ProductId(6)).is_none());
    }

    #[test]
    fn test_update_missing_item() {
        let mut cart = Cart::default();
        assert_eq!(cart.update_quantity(ProductId(9), 3), Err(CartError::ItemNotFound(ProductId(9))));
        assert!(cart.update_quantity(ProductId(9), 0).is_ok());
        assert!(!cart.remove_item(ProductId(9)));
    }

    #[test]
    fn test_stored_duplicates_are_merged() {
        let json = serde_json::json!([
            {"id": 1, "name": "Areca Plates", "price": {"amount": 299, "currency": "INR"}, "quantity": 1},
            {"id": 1, "name": "Areca Plates", "price": {"amount": 299, "currency": "INR"}, "quantity": 2},
        ]);
        let cart: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 3);
    }
}
