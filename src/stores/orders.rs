use serde::Serialize;
use tracing::info;
use crate::domain::aggregates::{Order, OrderBook, OrderError, OrderStatus};
use crate::domain::value_objects::OrderId;
use crate::session::Session;
use crate::storage::{keys, Document};
use crate::{MarketplaceError, Result};

#[derive(Clone, Debug)]
pub struct OrderStore {
    session: Session,
}

/// Order history, newest first, with the order a caller asked to highlight.
#[derive(Clone, Debug, Serialize)]
pub struct OrderListing {
    pub orders: Vec<Order>,
    pub highlighted: Option<Order>,
}

impl OrderStore {
    pub fn new(session: Session) -> Self { Self { session } }

    fn document(&self) -> Document<OrderBook> { self.session.document(keys::ORDERS) }
    fn last_placed_document(&self) -> Document<Option<Order>> { self.session.document(keys::LAST_PLACED_ORDER) }

    pub async fn list(&self) -> Result<Vec<Order>> {
        Ok(self.document().load().await?.orders().to_vec())
    }

    /// An unknown highlight id is ignored.
    pub async fn list_with_highlight(&self, highlight: Option<&OrderId>) -> Result<OrderListing> {
        let book = self.document().load().await?;
        let highlighted = highlight.and_then(|id| book.get(id)).cloned();
        Ok(OrderListing { orders: book.orders().to_vec(), highlighted })
    }

    pub async fn get(&self, id: &OrderId) -> Result<Order> {
        let book = self.document().load().await?;
        book.get(id).cloned().ok_or_else(|| OrderError::NotFound(id.clone()).into())
    }

    pub async fn last_placed(&self) -> Result<Option<Order>> {
        Ok(self.last_placed_document().load().await?)
    }

    /// Prepends a freshly created order and records it as the last one placed.
    pub(crate) async fn place(&self, order: Order) -> Result<Order> {
        let (_, mut order) = self.document()
            .update::<_, MarketplaceError, _>(|book| {
                let mut order = order.clone();
                while book.get(order.id()).is_some() { order.renumber(); }
                book.place(order.clone())?;
                Ok(order)
            })
            .await?;
        let events = order.take_events();
        self.last_placed_document().replace(&Some(order.clone())).await?;
        info!(namespace = self.session.namespace(), order_id = %order.id(), total = %order.total(), "order placed");
        self.session.publish(events).await;
        Ok(order)
    }

    pub async fn cancel(&self, id: &OrderId) -> Result<Order> {
        let order = self.modify(id, |order| order.cancel()).await?;
        info!(namespace = self.session.namespace(), order_id = %id, "order cancelled");
        Ok(order)
    }

    /// Moves an order one step along its fulfilment workflow.
    pub async fn advance(&self, id: &OrderId, to: OrderStatus) -> Result<Order> {
        let order = self.modify(id, |order| order.transition(to)).await?;
        info!(namespace = self.session.namespace(), order_id = %id, status = %to, "order status changed");
        Ok(order)
    }

    async fn modify<F>(&self, id: &OrderId, change: F) -> Result<Order>
    where
        F: Fn(&mut Order) -> std::result::Result<(), OrderError> + Send + Sync,
    {
        let (_, (order, events)) = self.document()
            .update::<_, MarketplaceError, _>(|book| {
                let order = book.get_mut(id).ok_or_else(|| OrderError::NotFound(id.clone()))?;
                change(order)?;
                let events = order.take_events();
                Ok((order.clone(), events))
            })
            .await?;
        self.session.publish(events).await;
        Ok(order)
    }
}
