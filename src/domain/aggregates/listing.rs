//! Seller listings: farmer husk batches, artisan products and the husk
//! purchase orders artisans raise.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;
use crate::domain::aggregates::order::OrderStatus;
use crate::domain::aggregates::profile::{ArtisanProfile, FarmerProfile, RoleProfile};

pub trait Listing: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Form payload used for both create and edit.
    type Draft: Validate + DeserializeOwned + Clone + Send + Sync + 'static;
    const KIND: &'static str;
    /// Profile that must exist before a listing can be created.
    type Owner: RoleProfile;
    /// Marker in generated ids, `AMF_1_b3` for batches.
    const ID_MARKER: &'static str;

    fn id(&self) -> &str;
    fn create(id: String, draft: Self::Draft, now: DateTime<Utc>) -> Self;
    fn apply(&mut self, draft: Self::Draft);

    /// Fills blanks in a new draft from the owner's profile.
    fn prefill(_draft: &mut Self::Draft, _owner: &Self::Owner) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus { #[default] Listed, Sold, Withdrawn }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus { #[default] Pending, Paid }

// =============================================================================
// Farmer batches
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct BatchDraft {
    #[validate(length(min = 1, message = "quantity is required"))]
    pub quantity: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "husk type is required"))]
    pub husk_type: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    pub harvest_date: Option<chrono::NaiveDate>,
    pub pickup_date: Option<chrono::NaiveDate>,
    pub photo: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    #[serde(flatten)]
    pub draft: BatchDraft,
    pub status: ListingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Listing for Batch {
    type Draft = BatchDraft;
    const KIND: &'static str = "batch";
    type Owner = FarmerProfile;
    const ID_MARKER: &'static str = "b";

    fn id(&self) -> &str { &self.id }
    fn create(id: String, draft: BatchDraft, now: DateTime<Utc>) -> Self {
        Self { id, draft, status: ListingStatus::Listed, payment_status: PaymentStatus::Pending, created_at: now }
    }
    fn apply(&mut self, draft: BatchDraft) { self.draft = draft; }
}

// =============================================================================
// Artisan products
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ArtisanProductDraft {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(max = 5, message = "at most 5 images"))]
    pub images: Vec<String>,
    #[validate(length(min = 1, message = "cost is required"))]
    pub cost: String,
    pub description: String,
    pub pickup_address: String,
    pub contact_details: String,
    pub account_number: String,
    pub ifsc_code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtisanProduct {
    pub id: String,
    #[serde(flatten)]
    pub draft: ArtisanProductDraft,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

impl Listing for ArtisanProduct {
    type Draft = ArtisanProductDraft;
    const KIND: &'static str = "artisan_product";
    type Owner = ArtisanProfile;
    const ID_MARKER: &'static str = "p";

    fn id(&self) -> &str { &self.id }
    fn create(id: String, draft: ArtisanProductDraft, now: DateTime<Utc>) -> Self {
        Self { id, draft, status: ListingStatus::Listed, created_at: now }
    }
    fn apply(&mut self, draft: ArtisanProductDraft) { self.draft = draft; }

    fn prefill(draft: &mut ArtisanProductDraft, owner: &ArtisanProfile) {
        let fill = |field: &mut String, value: String| if field.trim().is_empty() { *field = value };
        fill(&mut draft.pickup_address, owner.pickup_address());
        fill(&mut draft.contact_details, owner.contact.contact_value.clone());
        fill(&mut draft.account_number, owner.details.account_number.clone());
        fill(&mut draft.ifsc_code, owner.details.ifsc_code.clone());
    }
}

// =============================================================================
// Artisan husk purchase orders
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct HuskOrderDraft {
    #[validate(length(min = 1, message = "quantity is required"))]
    pub quantity: String,
    #[validate(length(min = 1, message = "husk type is required"))]
    pub husk_type: String,
    pub harvest_date: Option<chrono::NaiveDate>,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    pub payment_method: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HuskOrder {
    pub id: String,
    #[serde(flatten)]
    pub draft: HuskOrderDraft,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Listing for HuskOrder {
    type Draft = HuskOrderDraft;
    const KIND: &'static str = "husk_order";
    type Owner = ArtisanProfile;
    const ID_MARKER: &'static str = "h";

    fn id(&self) -> &str { &self.id }
    fn create(id: String, draft: HuskOrderDraft, now: DateTime<Utc>) -> Self {
        Self { id, draft, status: OrderStatus::Processing, created_at: now }
    }
    fn apply(&mut self, draft: HuskOrderDraft) { self.draft = draft; }
}

/// Listings of one kind in creation order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger<T> { items: Vec<T> }

impl<T> Default for Ledger<T> {
    fn default() -> Self { Self { items: vec![] } }
}

impl<T: Listing> Ledger<T> {
    pub fn items(&self) -> &[T] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn get(&self, id: &str) -> Option<&T> { self.items.iter().find(|i| i.id() == id) }

    pub fn insert(&mut self, item: T) -> Result<(), ListingError> {
        if self.get(item.id()).is_some() { return Err(ListingError::DuplicateId(item.id().to_string())); }
        self.items.push(item);
        Ok(())
    }

    pub fn update(&mut self, id: &str, draft: T::Draft) -> Result<T, ListingError> {
        let item = self.items.iter_mut().find(|i| i.id() == id).ok_or_else(|| ListingError::NotFound(id.to_string()))?;
        item.apply(draft);
        Ok(item.clone())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id() != id);
        self.items.len() != before
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("listing {0} not found")]
    NotFound(String),
    #[error("listing {0} already exists")]
    DuplicateId(String),
}
