//! Static product catalog
//!
//! The storefront sells a fixed set of products. Queries filter by a search
//! term and a category and then sort; they never touch persisted state.

use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use crate::domain::aggregates::ProductSnapshot;
use crate::domain::value_objects::{Money, ProductId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Most reviewed first.
    #[default]
    Popularity,
    PriceLow,
    PriceHigh,
    Rating,
    /// Highest id first.
    Newest,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogQuery {
    pub search: Option<String>,
    /// `all` or absent means every category.
    pub category: Option<String>,
    pub sort: SortOrder,
}

#[derive(Clone, Debug)]
pub struct Catalog {
    products: Vec<ProductSnapshot>,
}

impl Catalog {
    pub fn new(products: Vec<ProductSnapshot>) -> Self { Self { products } }

    pub fn standard() -> Self { Self::new(standard_products()) }

    pub fn products(&self) -> &[ProductSnapshot] { &self.products }

    pub fn get(&self, id: ProductId) -> Option<&ProductSnapshot> { self.products.iter().find(|p| p.id == id) }

    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = self.products.iter().map(|p| p.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }

    pub fn query(&self, query: &CatalogQuery) -> Vec<ProductSnapshot> {
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let category = query.category.as_deref().filter(|c| !c.eq_ignore_ascii_case("all"));
        let mut matches: Vec<ProductSnapshot> = self.products.iter()
            .filter(|p| search.map_or(true, |term| p.matches_search(term)))
            .filter(|p| category.map_or(true, |c| p.category.eq_ignore_ascii_case(c)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| compare(query.sort, a, b));
        matches
    }
}

fn compare(sort: SortOrder, a: &ProductSnapshot, b: &ProductSnapshot) -> Ordering {
    match sort {
        SortOrder::Popularity => b.reviews.cmp(&a.reviews),
        SortOrder::PriceLow => a.price.amount().cmp(&b.price.amount()),
        SortOrder::PriceHigh => b.price.amount().cmp(&a.price.amount()),
        SortOrder::Rating => b.rating.total_cmp(&a.rating),
        SortOrder::Newest => b.id.cmp(&a.id),
    }
}

#[allow(clippy::too_many_arguments)]
fn product(
    id: u64, name: &str, description: &str, price: i64, original: i64, category: &str, seller: &str,
    image: &str, availability: u32, rating: f32, reviews: u32, delivery: &str, tags: [&str; 3],
) -> ProductSnapshot {
    let mut p = ProductSnapshot::new(id, name, Money::inr(price));
    p.description = description.into();
    p.original_price = Some(Money::inr(original));
    p.category = category.into();
    p.seller = seller.into();
    p.image = format!("/assets/{image}.jpg");
    p.availability = availability;
    p.rating = rating;
    p.reviews = reviews;
    p.delivery_time = Some(delivery.into());
    p.tags = tags.iter().map(|t| t.to_string()).collect();
    p
}

fn standard_products() -> Vec<ProductSnapshot> {
    vec![
        product(1, "Premium Areca Leaf Plates - Pack of 25",
            "100% biodegradable dinner plates perfect for eco-friendly dining and events",
            299, 399, "tableware", "EcoLife Artisans", "areca-plates", 156, 4.3, 2847, "2-3 days",
            ["Biodegradable", "Premium Quality", "Party Essential"]),
        product(2, "Handcrafted Areca Bowl Set (6 pieces)",
            "Elegant set of 6 natural bowls handmade by skilled artisans for sustainable dining",
            545, 699, "tableware", "Artisan Craft Co.", "areca-bowls", 89, 4.5, 1256, "3-4 days",
            ["Handmade", "Artisan Crafted", "Durable"]),
        product(3, "Designer Areca Storage Baskets",
            "Beautiful handwoven storage baskets perfect for organizing and home decoration",
            1299, 1599, "handicrafts", "Heritage Crafts", "areca-baskets", 34, 4.6, 567, "4-5 days",
            ["Home Decor", "Storage Solution", "Traditional"]),
        product(4, "Eco-Friendly Areca Food Containers",
            "Leak-proof food containers made from pressed areca leaves, microwave safe",
            179, 229, "packaging", "GreenPack Solutions", "areca-containers", 200, 4.2, 3421, "1-2 days",
            ["Microwave Safe", "Leak Proof", "Eco-Friendly"]),
        product(5, "Areca Leaf Wall Art - Nature Collection",
            "Stunning wall art pieces crafted from natural areca leaves for modern homes",
            899, 1199, "decor", "Modern Eco Arts", "areca-baskets", 45, 4.7, 234, "5-6 days",
            ["Wall Decor", "Modern Art", "Nature Inspired"]),
        product(6, "Disposable Areca Leaf Cups - Pack of 50",
            "Perfect for tea, coffee and beverages. 100% compostable and plastic-free",
            149, 199, "tableware", "Sustainable Living", "areca-plates", 167, 4.1, 1890, "2-3 days",
            ["Compostable", "Plastic-Free", "Party Cups"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(products: &[ProductSnapshot]) -> Vec<u64> { products.iter().map(|p| p.id.0).collect() }

    #[test]
    fn test_default_sort_is_popularity() {
        let all = Catalog::standard().query(&CatalogQuery::default());
        assert_eq!(ids(&all), vec![4, 1, 6, 2, 3, 5]);
    }

    #[test]
    fn test_category_and_price_sort() {
        let query = CatalogQuery { category: Some("tableware".into()), sort: SortOrder::PriceLow, ..Default::default() };
        assert_eq!(ids(&Catalog::standard().query(&query)), vec![6, 1, 2]);
        let query = CatalogQuery { category: Some("all".into()), sort: SortOrder::PriceHigh, ..Default::default() };
        assert_eq!(ids(&Catalog::standard().query(&query))[0], 3);
    }

    #[test]
    fn test_search_matches_description() {
        let query = CatalogQuery { search: Some("MICROWAVE".into()), ..Default::default() };
        assert_eq!(ids(&Catalog::standard().query(&query)), vec![4]);
    }

    #[test]
    fn test_rating_and_newest() {
        let catalog = Catalog::standard();
        let by_rating = catalog.query(&CatalogQuery { sort: SortOrder::Rating, ..Default::default() });
        assert_eq!(by_rating[0].id, ProductId(5));
        let newest = catalog.query(&CatalogQuery { sort: SortOrder::Newest, ..Default::default() });
        assert_eq!(newest[0].id, ProductId(6));
    }

    #[test]
    fn test_lookup_and_discount() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.get(ProductId(1)).unwrap().discount_percent(), Some(25));
        assert!(catalog.get(ProductId(42)).is_none());
        assert_eq!(catalog.categories(), vec!["decor", "handicrafts", "packaging", "tableware"]);
        assert_eq!(serde_json::from_str::<SortOrder>("\"price-low\"").unwrap(), SortOrder::PriceLow);
    }
}
