//! Key names inside a namespace.

use crate::domain::aggregates::profile::Role;

pub const WISHLIST: &str = "wishlist";
pub const CART: &str = "cart";
pub const ORDERS: &str = "orders";
pub const LAST_PLACED_ORDER: &str = "orders.last_placed";

pub fn profile(role: Role) -> String { format!("profile.{role}") }
pub fn registration(role: Role) -> String { format!("registration.{role}") }
pub fn user_counter(role: Role) -> String { format!("counter.{role}") }

pub fn listings(kind: &str) -> String { format!("listings.{kind}") }
pub fn listing_counter(kind: &str) -> String { format!("counter.{kind}") }
