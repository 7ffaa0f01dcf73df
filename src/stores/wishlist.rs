use tracing::debug;
use crate::domain::aggregates::{ProductSnapshot, Wishlist, WishlistOutcome};
use crate::domain::value_objects::ProductId;
use crate::session::Session;
use crate::storage::{keys, Document};
use crate::{MarketplaceError, Result};

#[derive(Clone, Debug)]
pub struct WishlistStore {
    session: Session,
}

impl WishlistStore {
    pub fn new(session: Session) -> Self { Self { session } }

    fn document(&self) -> Document<Wishlist> { self.session.document(keys::WISHLIST) }

    pub async fn list(&self) -> Result<Vec<ProductSnapshot>> {
        Ok(self.document().load().await?.to_vec())
    }

    pub async fn contains(&self, id: ProductId) -> Result<bool> {
        Ok(self.document().load().await?.contains(id))
    }

    /// Adding a product that is already saved leaves the wishlist as it is.
    pub async fn add(&self, product: ProductSnapshot) -> Result<WishlistOutcome> {
        let id = product.id;
        let (_, outcome) = self.document()
            .update::<_, MarketplaceError, _>(|wishlist| Ok(wishlist.add(product.clone())))
            .await?;
        debug!(namespace = self.session.namespace(), %id, ?outcome, "wishlist add");
        Ok(outcome)
    }

    pub async fn remove(&self, id: ProductId) -> Result<bool> {
        let (_, removed) = self.document()
            .update::<_, MarketplaceError, _>(|wishlist| Ok(wishlist.remove(id)))
            .await?;
        Ok(removed)
    }
}
