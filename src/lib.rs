//! Areca Market
//!
//! State service for a marketplace of areca byproducts and handicrafts
//! shared by farmers, artisans, industry buyers and shoppers.
//!
//! ## Features
//! - Static product catalog with search, category filter and sorting
//! - Wishlist and cart keyed by product id
//! - Checkout with shipping rules and order history
//! - Order status tracking and cancellation
//! - Per-role profiles with two-step registration
//! - Seller listings for farmers and artisans
//!
//! Every collection is a versioned JSON document inside a namespace, so
//! concurrent writers are retried instead of overwritten.

pub mod api;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod events;
pub mod session;
pub mod storage;
pub mod stores;

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::aggregates::{CartError, ListingError, OrderError, Role};
use crate::domain::value_objects::{MoneyError, ProductId};
use crate::storage::StorageError;

pub use crate::config::Config;
pub use crate::session::{Marketplace, Session};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum MarketplaceError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("{0} profile required")]
    ProfileRequired(Role),

    #[error("{0} registration has not been started")]
    RegistrationNotStarted(Role),

    #[error("nothing to check out")]
    EmptyCheckout,

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Listing(#[from] ListingError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl MarketplaceError {
    /// Single-field validation failure.
    pub fn invalid(field: &'static str, code: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, validator::ValidationError::new(code));
        Self::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, MarketplaceError>;
