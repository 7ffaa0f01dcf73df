//! Marketplace handle and per-namespace sessions.
//!
//! A [`Session`] is one persisted namespace, the equivalent of a single
//! browser profile. Every store handed out by a session reads and writes
//! documents inside that namespace only.

use std::sync::Arc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::checkout::Checkout;
use crate::config::Config;
use crate::domain::aggregates::{Listing, ShippingPolicy};
use crate::domain::events::DomainEvent;
use crate::events::EventPublisher;
use crate::storage::{Document, KeyValueStore};
use crate::stores::{CartStore, ListingStore, OrderStore, ProfileStore, WishlistStore};
use crate::{MarketplaceError, Result};

/// Knobs shared by every session.
#[derive(Clone, Debug)]
pub struct StoreSettings {
    pub max_attempts: u32,
    pub shipping: ShippingPolicy,
    pub delivery_days: i64,
}

impl Default for StoreSettings {
    fn default() -> Self { Self { max_attempts: 5, shipping: ShippingPolicy::default(), delivery_days: 3 } }
}

impl From<&Config> for StoreSettings {
    fn from(config: &Config) -> Self {
        Self { max_attempts: config.store_max_attempts, shipping: config.shipping_policy(), delivery_days: config.delivery_estimate_days }
    }
}

#[derive(Clone)]
pub struct Marketplace {
    store: Arc<dyn KeyValueStore>,
    settings: Arc<StoreSettings>,
    events: EventPublisher,
    catalog: Arc<Catalog>,
}

impl Marketplace {
    pub fn new(store: Arc<dyn KeyValueStore>, settings: StoreSettings, events: EventPublisher) -> Self {
        Self { store, settings: Arc::new(settings), events, catalog: Arc::new(Catalog::standard()) }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &Config, events: EventPublisher) -> Self {
        Self::new(store, StoreSettings::from(config), events)
    }

    pub fn session(&self, namespace: impl AsRef<str>) -> Session {
        Session {
            namespace: Arc::from(namespace.as_ref()),
            store: self.store.clone(),
            settings: self.settings.clone(),
            events: self.events.clone(),
            catalog: self.catalog.clone(),
        }
    }

    /// Fresh namespace id for a new visitor.
    pub fn new_session_id() -> String { Uuid::now_v7().to_string() }

    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn settings(&self) -> &StoreSettings { &self.settings }

    pub async fn health_check(&self) -> bool { self.store.health_check().await }
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace").field("settings", &self.settings).finish()
    }
}

#[derive(Clone)]
pub struct Session {
    namespace: Arc<str>,
    store: Arc<dyn KeyValueStore>,
    settings: Arc<StoreSettings>,
    events: EventPublisher,
    catalog: Arc<Catalog>,
}

impl Session {
    pub fn namespace(&self) -> &str { &self.namespace }
    pub fn settings(&self) -> &StoreSettings { &self.settings }
    pub fn catalog(&self) -> &Catalog { &self.catalog }

    pub fn document<T>(&self, key: impl Into<String>) -> Document<T>
    where
        T: Serialize + DeserializeOwned + Default + Send + Sync,
    {
        Document::new(self.store.clone(), self.namespace.clone(), key, self.settings.max_attempts)
    }

    pub fn wishlist(&self) -> WishlistStore { WishlistStore::new(self.clone()) }
    pub fn cart(&self) -> CartStore { CartStore::new(self.clone()) }
    pub fn orders(&self) -> OrderStore { OrderStore::new(self.clone()) }
    pub fn profiles(&self) -> ProfileStore { ProfileStore::new(self.clone()) }
    pub fn listings<T: Listing>(&self) -> ListingStore<T> { ListingStore::new(self.clone()) }
    pub fn checkout(&self) -> Checkout { Checkout::new(self.clone()) }

    /// Next value of a per-namespace counter, starting at 1.
    pub(crate) async fn next_sequence(&self, key: &str) -> Result<u64> {
        let (value, ()) = self.document::<u64>(key).update::<_, MarketplaceError, _>(|n| { *n += 1; Ok(()) }).await?;
        debug!(namespace = %self.namespace, key, value, "sequence advanced");
        Ok(value)
    }

    pub(crate) async fn publish(&self, events: Vec<DomainEvent>) {
        if !events.is_empty() { self.events.publish(&self.namespace, events).await; }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("namespace", &self.namespace).finish()
    }
}
