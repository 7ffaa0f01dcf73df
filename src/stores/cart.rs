use serde::Serialize;
use tracing::debug;
use crate::domain::aggregates::{Cart, CartEntry, OrderTotals, ProductSnapshot};
use crate::domain::value_objects::{ProductId, Quantity};
use crate::session::Session;
use crate::storage::{keys, Document};
use crate::{MarketplaceError, Result};

#[derive(Clone, Debug)]
pub struct CartStore {
    session: Session,
}

/// Cart contents with the totals checkout would charge for them.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartEntry>,
    pub item_count: usize,
    pub total_quantity: u64,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

impl CartStore {
    pub fn new(session: Session) -> Self { Self { session } }

    fn document(&self) -> Document<Cart> { self.session.document(keys::CART) }

    pub async fn load(&self) -> Result<Cart> { Ok(self.document().load().await?) }

    pub async fn entries(&self) -> Result<Vec<CartEntry>> { Ok(self.load().await?.to_vec()) }

    pub async fn add(&self, product: ProductSnapshot) -> Result<Quantity> {
        let id = product.id;
        let (_, quantity) = self.document()
            .update::<_, MarketplaceError, _>(|cart| Ok(cart.add_item(product.clone())))
            .await?;
        debug!(namespace = self.session.namespace(), %id, quantity = quantity.value(), "cart add");
        Ok(quantity)
    }

    /// Zero removes the entry.
    pub async fn update_quantity(&self, id: ProductId, quantity: u32) -> Result<()> {
        self.document()
            .update::<_, MarketplaceError, _>(|cart| Ok(cart.update_quantity(id, quantity)?))
            .await?;
        Ok(())
    }

    pub async fn remove(&self, id: ProductId) -> Result<bool> {
        let (_, removed) = self.document()
            .update::<_, MarketplaceError, _>(|cart| Ok(cart.remove_item(id)))
            .await?;
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<()> {
        self.document().update::<_, MarketplaceError, _>(|cart| { cart.clear(); Ok(()) }).await?;
        Ok(())
    }

    /// Removes what an order took, keeping anything added since it was read.
    pub async fn deduct(&self, checked_out: &[CartEntry]) -> Result<()> {
        self.document()
            .update::<_, MarketplaceError, _>(|cart| { cart.deduct(checked_out); Ok(()) })
            .await?;
        Ok(())
    }

    pub async fn summary(&self) -> Result<CartSummary> {
        let cart = self.load().await?;
        let totals = self.session.settings().shipping.quote(cart.entries())?;
        Ok(CartSummary { items: cart.to_vec(), item_count: cart.item_count(), total_quantity: cart.total_quantity(), totals })
    }
}
