//! Stores bound to one session namespace.
//!
//! Each store owns one kind of document and performs every change as a
//! versioned read-modify-write through [`crate::storage::Document`].

pub mod cart;
pub mod listings;
pub mod orders;
pub mod profiles;
pub mod wishlist;

pub use cart::{CartStore, CartSummary};
pub use listings::ListingStore;
pub use orders::{OrderListing, OrderStore};
pub use profiles::ProfileStore;
pub use wishlist::WishlistStore;
