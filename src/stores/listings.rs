use std::marker::PhantomData;
use chrono::Utc;
use tracing::info;
use validator::Validate;
use crate::domain::aggregates::{Ledger, Listing, ListingError, RoleProfile};
use crate::domain::events::{DomainEvent, ListingEvent};
use crate::session::Session;
use crate::storage::{keys, Document};
use crate::{MarketplaceError, Result};

/// Seller listings of one kind, owned by the session's profile for that role.
pub struct ListingStore<T> {
    session: Session,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Clone for ListingStore<T> {
    fn clone(&self) -> Self { Self { session: self.session.clone(), _kind: PhantomData } }
}

impl<T> std::fmt::Debug for ListingStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingStore").field("session", &self.session).finish()
    }
}

impl<T: Listing> ListingStore<T> {
    pub fn new(session: Session) -> Self { Self { session, _kind: PhantomData } }

    fn document(&self) -> Document<Ledger<T>> { self.session.document(keys::listings(T::KIND)) }

    pub async fn list(&self) -> Result<Vec<T>> {
        Ok(self.document().load().await?.items().to_vec())
    }

    pub async fn get(&self, id: &str) -> Result<T> {
        let ledger = self.document().load().await?;
        ledger.get(id).cloned().ok_or_else(|| ListingError::NotFound(id.to_string()).into())
    }

    /// Ids read `<owner id>_<marker><n>`, e.g. `AMF_1_b2`.
    pub async fn create(&self, mut draft: T::Draft) -> Result<T> {
        let owner = self.session.profiles().require::<T::Owner>().await?;
        T::prefill(&mut draft, &owner);
        draft.validate()?;
        let owner_id = owner.user_id().to_string();
        let sequence = self.session.next_sequence(&keys::listing_counter(T::KIND)).await?;
        let listing = T::create(format!("{owner_id}_{}{sequence}", T::ID_MARKER), draft, Utc::now());
        self.document()
            .update::<_, MarketplaceError, _>(|ledger| Ok(ledger.insert(listing.clone())?))
            .await?;
        info!(namespace = self.session.namespace(), kind = T::KIND, id = listing.id(), "listing created");
        let event = ListingEvent::Created { owner: owner_id, listing_id: listing.id().to_string(), kind: T::KIND };
        self.session.publish(vec![DomainEvent::Listing(event)]).await;
        Ok(listing)
    }

    /// Applies an edited form to an existing listing. Status fields are kept.
    pub async fn update(&self, id: &str, draft: T::Draft) -> Result<T> {
        draft.validate()?;
        let (_, listing) = self.document()
            .update::<_, MarketplaceError, _>(|ledger| Ok(ledger.update(id, draft.clone())?))
            .await?;
        Ok(listing)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let (_, removed) = self.document()
            .update::<_, MarketplaceError, _>(|ledger| Ok(ledger.remove(id)))
            .await?;
        if removed {
            info!(namespace = self.session.namespace(), kind = T::KIND, id, "listing deleted");
            let event = ListingEvent::Deleted { listing_id: id.to_string(), kind: T::KIND };
            self.session.publish(vec![DomainEvent::Listing(event)]).await;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use crate::domain::aggregates::profile::{ArtisanDetails, ArtisanRegistration, FarmerContact, FarmerDetails, FarmerRegistration};
    use crate::domain::aggregates::{ArtisanProduct, ArtisanProductDraft, Batch, BatchDraft, HuskOrder, HuskOrderDraft, OrderStatus, Role};
    use crate::domain::value_objects::ContactType;
    use crate::events::EventPublisher;
    use crate::session::{Marketplace, StoreSettings};
    use crate::storage::MemoryStore;
    use super::*;

    fn session() -> Session {
        Marketplace::new(Arc::new(MemoryStore::new()), StoreSettings::default(), EventPublisher::disabled()).session("s1")
    }

    fn batch(quantity: &str) -> BatchDraft {
        BatchDraft { quantity: quantity.into(), husk_type: "dry".into(), location: "Sirsi".into(), ..Default::default() }
    }

    async fn register_farmer(session: &Session) {
        let profiles = session.profiles();
        let contact = FarmerContact {
            name: "Ravi".into(), date_of_birth: None, phone: "9876543210".into(), alternate_phone: None,
            pin_code: "581401".into(), city: "Sirsi".into(), state: "Karnataka".into(), address: "Main road".into(),
        };
        profiles.start_farmer_registration(FarmerRegistration { contact, otp: "123456".into() }).await.unwrap();
        let details = FarmerDetails { account_number: "1".into(), ifsc_code: "SBIN0000001".into(), ..Default::default() };
        profiles.complete_farmer_registration(details).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_requires_owner_profile() {
        let err = session().listings::<Batch>().create(batch("1 tonne")).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::ProfileRequired(Role::Farmer)));
    }

    #[tokio::test]
    async fn test_batch_lifecycle() {
        let session = session();
        register_farmer(&session).await;
        let batches = session.listings::<Batch>();

        let first = batches.create(batch("1 tonne")).await.unwrap();
        let second = batches.create(batch("2 tonnes")).await.unwrap();
        assert_eq!(first.id, "AMF_1_b1");
        assert_eq!(second.id, "AMF_1_b2");

        let edited = batches.update(&first.id, batch("3 tonnes")).await.unwrap();
        assert_eq!(edited.draft.quantity, "3 tonnes");
        assert_eq!(batches.get(&first.id).await.unwrap().draft.quantity, "3 tonnes");

        assert!(batches.delete(&first.id).await.unwrap());
        assert!(!batches.delete(&first.id).await.unwrap());
        assert_eq!(batches.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_rejected() {
        let session = session();
        register_farmer(&session).await;
        let err = session.listings::<Batch>().create(batch("")).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Validation(_)));
        assert!(session.listings::<Batch>().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_artisan_product_prefills_from_profile() {
        let session = session();
        let profiles = session.profiles();
        let reg = ArtisanRegistration {
            name: "Meera".into(), password: "secret1".into(), confirm_password: "secret1".into(),
            contact_method: ContactType::Email, contact_value: "meera@example.com".into(), otp: "123456".into(),
        };
        profiles.start_artisan_registration(reg).await.unwrap();
        let details = ArtisanDetails {
            brand_name: "Meera Crafts".into(), address: "Temple road".into(), city: "Udupi".into(), state: "Karnataka".into(),
            pin: "576101".into(), account_number: "42".into(), ifsc_code: "CNRB0000001".into(), ..Default::default()
        };
        profiles.complete_artisan_registration(details).await.unwrap();

        let draft = ArtisanProductDraft { name: "Leaf bowl".into(), cost: "120".into(), ..Default::default() };
        let product = session.listings::<ArtisanProduct>().create(draft).await.unwrap();
        assert_eq!(product.id, "AMA_1_p1");
        assert_eq!(product.draft.pickup_address, "Temple road, Udupi, Karnataka - 576101");
        assert_eq!(product.draft.contact_details, "meera@example.com");
        assert_eq!(product.draft.account_number, "42");
    }

    #[tokio::test]
    async fn test_husk_orders_need_an_artisan() {
        let session = session();
        let draft = HuskOrderDraft { quantity: "500 kg".into(), husk_type: "dry".into(), address: "Udupi".into(), ..Default::default() };
        let err = session.listings::<HuskOrder>().create(draft).await.unwrap_err();
        assert!(matches!(err, MarketplaceError::ProfileRequired(Role::Artisan)));
        assert_eq!(HuskOrder::create("x".into(), HuskOrderDraft::default(), Utc::now()).status, OrderStatus::Processing);
    }
}
