//! Wishlist Aggregate

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::product::ProductSnapshot;
use crate::domain::value_objects::ProductId;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<ProductSnapshot>", into = "Vec<ProductSnapshot>")]
pub struct Wishlist {
    items: BTreeMap<ProductId, ProductSnapshot>,
}

/// Adding a product that is already present is a normal outcome, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WishlistOutcome { Added, AlreadyPresent }

impl Wishlist {
    pub fn items(&self) -> impl Iterator<Item = &ProductSnapshot> { self.items.values() }
    pub fn contains(&self, id: ProductId) -> bool { self.items.contains_key(&id) }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn to_vec(&self) -> Vec<ProductSnapshot> { self.items.values().cloned().collect() }

    pub fn add(&mut self, product: ProductSnapshot) -> WishlistOutcome {
        if self.items.contains_key(&product.id) { return WishlistOutcome::AlreadyPresent; }
        self.items.insert(product.id, product);
        WishlistOutcome::Added
    }

    pub fn remove(&mut self, id: ProductId) -> bool { self.items.remove(&id).is_some() }
}

impl From<Vec<ProductSnapshot>> for Wishlist {
    fn from(list: Vec<ProductSnapshot>) -> Self {
        let mut wishlist = Self::default();
        for product in list { wishlist.add(product); }
        wishlist
    }
}

impl From<Wishlist> for Vec<ProductSnapshot> {
    fn from(wishlist: Wishlist) -> Self { wishlist.items.into_values().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Money;

    #[test]
    fn test_add_is_idempotent() {
        let mut w = Wishlist::default();
        let p = ProductSnapshot::new(3, "Storage Basket", Money::inr(1299));
        assert_eq!(w.add(p.clone()), WishlistOutcome::Added);
        assert_eq!(w.add(p), WishlistOutcome::AlreadyPresent);
        assert_eq!(w.len(), 1);
        assert!(w.remove(ProductId(3)));
        assert!(!w.remove(ProductId(3)));
    }
}
