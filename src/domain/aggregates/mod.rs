//! Aggregates module
pub mod product;
pub mod wishlist;
pub mod cart;
pub mod order;
pub mod profile;
pub mod listing;

pub use product::ProductSnapshot;
pub use wishlist::{Wishlist, WishlistOutcome};
pub use cart::{Cart, CartEntry, CartError};
pub use order::{CustomerDetails, LineItem, NewOrder, Order, OrderBook, OrderError, OrderStatus, OrderTotals, PaymentMethod, ShippingAddress, ShippingPolicy, TrackingStep};
pub use profile::{
    ArtisanContact, ArtisanDetails, ArtisanProfile, ArtisanRegistration, FarmerContact, FarmerDetails, FarmerProfile,
    FarmerRegistration, IndustryContact, IndustryDetails, IndustryProfile, IndustryRegistration, Role, RoleProfile,
    UserDetails, UserProfile, UserRegistration,
};
pub use listing::{ArtisanProduct, ArtisanProductDraft, Batch, BatchDraft, HuskOrder, HuskOrderDraft, Ledger, Listing, ListingError};
