//! Order Aggregate

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;
use crate::domain::aggregates::cart::{self, CartEntry, CartError};
use crate::domain::aggregates::product::ProductSnapshot;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Money, OrderId, Quantity};

/// Seller shown on a line when the snapshot carries none.
pub const MARKETPLACE_NAME: &str = "AdikeMart";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    items: Vec<LineItem>,
    address: ShippingAddress,
    payment: PaymentMethod,
    subtotal: Money,
    shipping: Money,
    total: Money,
    status: OrderStatus,
    order_date: DateTime<Utc>,
    #[serde(default)]
    estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default)]
    delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    tracking_steps: Vec<TrackingStep>,
    #[serde(default)]
    customer: CustomerDetails,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(flatten)]
    pub product: ProductSnapshot,
    pub quantity: Quantity,
    pub ordered_at: DateTime<Utc>,
}

impl LineItem {
    pub fn from_entry(entry: CartEntry, ordered_at: DateTime<Utc>) -> Self {
        let mut product = entry.product;
        if product.seller.trim().is_empty() { product.seller = MARKETPLACE_NAME.to_string(); }
        Self { product, quantity: entry.quantity, ordered_at }
    }
    pub fn line_total(&self) -> Money { self.product.price.multiply(self.quantity.value()) }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "pincode is required"))]
    pub pincode: String,
}

impl ShippingAddress {
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(), phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(), city: self.city.trim().to_string(),
            state: self.state.trim().to_string(), pincode: self.pincode.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentMethod {
    Upi { upi_id: String },
    #[serde(alias = "cash_on_delivery")]
    Cod,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails { pub name: String, pub phone: String, pub user_id: String }

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStep { pub status: OrderStatus, pub date: DateTime<Utc>, pub description: String }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[serde(alias = "Confirmed")] Confirmed,
    #[serde(alias = "Processing")] Processing,
    #[serde(alias = "Packed")] Packed,
    #[serde(alias = "Shipped")] Shipped,
    #[serde(alias = "Delivered")] Delivered,
    #[serde(alias = "Cancelled")] Cancelled,
}

impl OrderStatus {
    /// Forward step in confirmed → processing → packed → shipped → delivered.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Confirmed => Some(Self::Processing),
            Self::Processing => Some(Self::Packed),
            Self::Packed => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }
    pub fn is_cancellable(self) -> bool { matches!(self, Self::Confirmed | Self::Processing) }
    pub fn can_transition_to(self, to: Self) -> bool {
        if to == Self::Cancelled { self.is_cancellable() } else { self.next() == Some(to) }
    }
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed", Self::Processing => "processing", Self::Packed => "packed",
            Self::Shipped => "shipped", Self::Delivered => "delivered", Self::Cancelled => "cancelled",
        }
    }
    fn step_description(self) -> &'static str {
        match self {
            Self::Confirmed => "Order confirmed and being processed",
            Self::Processing => "Order is being prepared by the seller",
            Self::Packed => "Order packed and ready for dispatch",
            Self::Shipped => "Order handed over to the courier",
            Self::Delivered => "Order delivered",
            Self::Cancelled => "Order cancelled by the customer",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Subtotal, shipping and total for one checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderTotals { pub subtotal: Money, pub shipping: Money, pub total: Money }

/// Shipping is free strictly above the threshold, otherwise a flat fee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShippingPolicy { pub free_above: Decimal, pub flat_fee: Decimal, pub currency: String }

impl Default for ShippingPolicy {
    fn default() -> Self { Self { free_above: Decimal::new(500, 0), flat_fee: Decimal::new(40, 0), currency: "INR".into() } }
}

impl ShippingPolicy {
    pub fn shipping_for(&self, subtotal: &Money) -> Money {
        if subtotal.amount() > self.free_above { Money::zero(subtotal.currency()) } else { Money::new(self.flat_fee, subtotal.currency()) }
    }

    pub fn quote<'a>(&self, entries: impl IntoIterator<Item = &'a CartEntry>) -> Result<OrderTotals, CartError> {
        let subtotal = cart::subtotal(entries, &self.currency)?;
        let shipping = self.shipping_for(&subtotal);
        let total = subtotal.add(&shipping)?;
        Ok(OrderTotals { subtotal, shipping, total })
    }
}

/// Everything checkout collects before an order exists.
#[derive(Clone, Debug)]
pub struct NewOrder {
    pub items: Vec<CartEntry>,
    pub address: ShippingAddress,
    pub payment: PaymentMethod,
    pub totals: OrderTotals,
    pub customer: CustomerDetails,
    pub delivery_days: i64,
}

impl Order {
    pub fn create(new: NewOrder) -> Self {
        let now = Utc::now();
        let id = OrderId::generate();
        let items: Vec<LineItem> = new.items.into_iter().map(|e| LineItem::from_entry(e, now)).collect();
        let mut order = Self {
            id: id.clone(), items, address: new.address, payment: new.payment,
            subtotal: new.totals.subtotal, shipping: new.totals.shipping, total: new.totals.total,
            status: OrderStatus::Confirmed, order_date: now,
            estimated_delivery: Some(now + Duration::days(new.delivery_days)), delivered_at: None,
            tracking_steps: vec![TrackingStep { status: OrderStatus::Confirmed, date: now, description: OrderStatus::Confirmed.step_description().into() }],
            customer: new.customer, events: vec![],
        };
        let placed = OrderEvent::Placed { order_id: id, total: order.total.amount(), items: order.items.len() };
        order.raise_event(DomainEvent::Order(placed));
        order
    }

    pub fn id(&self) -> &OrderId { &self.id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn items(&self) -> &[LineItem] { &self.items }
    pub fn address(&self) -> &ShippingAddress { &self.address }
    pub fn payment(&self) -> &PaymentMethod { &self.payment }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn shipping(&self) -> &Money { &self.shipping }
    pub fn total(&self) -> &Money { &self.total }
    pub fn order_date(&self) -> DateTime<Utc> { self.order_date }
    pub fn estimated_delivery(&self) -> Option<DateTime<Utc>> { self.estimated_delivery }
    pub fn delivered_at(&self) -> Option<DateTime<Utc>> { self.delivered_at }
    pub fn tracking_steps(&self) -> &[TrackingStep] { &self.tracking_steps }
    pub fn customer(&self) -> &CustomerDetails { &self.customer }

    /// Moves along the transition table, recording a tracking step.
    pub fn transition(&mut self, to: OrderStatus) -> Result<(), OrderError> {
        let from = self.status;
        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }
        self.record(to);
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id.clone(), from, to }));
        Ok(())
    }

    /// Raises only `Cancelled`, not a status change as well.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.status.is_cancellable() {
            return Err(OrderError::CannotCancel { id: self.id.clone(), status: self.status });
        }
        self.record(OrderStatus::Cancelled);
        self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_id: self.id.clone() }));
        Ok(())
    }

    fn record(&mut self, to: OrderStatus) {
        let now = Utc::now();
        self.status = to;
        if to == OrderStatus::Delivered { self.delivered_at = Some(now); }
        self.tracking_steps.push(TrackingStep { status: to, date: now, description: to.step_description().into() });
    }

    /// Draws a fresh id for an order that has not been stored yet.
    pub fn renumber(&mut self) {
        let id = OrderId::generate();
        for event in &mut self.events {
            if let DomainEvent::Order(OrderEvent::Placed { order_id, .. }) = event { *order_id = id.clone(); }
        }
        self.id = id;
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

/// Orders as stored for one customer, newest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<StoredOrder>", into = "Vec<Order>")]
pub struct OrderBook { orders: Vec<Order> }

impl OrderBook {
    pub fn orders(&self) -> &[Order] { &self.orders }
    pub fn len(&self) -> usize { self.orders.len() }
    pub fn is_empty(&self) -> bool { self.orders.is_empty() }
    pub fn get(&self, id: &OrderId) -> Option<&Order> { self.orders.iter().find(|o| &o.id == id) }
    pub fn get_mut(&mut self, id: &OrderId) -> Option<&mut Order> { self.orders.iter_mut().find(|o| &o.id == id) }

    pub fn place(&mut self, order: Order) -> Result<(), OrderError> {
        if self.get(&order.id).is_some() { return Err(OrderError::DuplicateId(order.id)); }
        self.orders.insert(0, order);
        Ok(())
    }
}

impl From<Vec<StoredOrder>> for OrderBook {
    fn from(list: Vec<StoredOrder>) -> Self { Self { orders: list.into_iter().map(Order::from).collect() } }
}

impl From<OrderBook> for Vec<Order> {
    fn from(book: OrderBook) -> Self { book.orders }
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum StoredOrder {
    Current(Box<Order>),
    Legacy(LegacyOrder),
}

/// Demo records that embed one product directly in the order.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOrder { id: String, name: String, price: Decimal, status: OrderStatus, order_date: NaiveDate }

impl From<StoredOrder> for Order {
    fn from(stored: StoredOrder) -> Self {
        let legacy = match stored {
            StoredOrder::Current(order) => return *order,
            StoredOrder::Legacy(legacy) => legacy,
        };
        let date = Utc.from_utc_datetime(&legacy.order_date.and_time(NaiveTime::MIN));
        let price = Money::new(legacy.price, "INR");
        let mut product = ProductSnapshot::new(0, legacy.name, price.clone());
        product.seller = MARKETPLACE_NAME.to_string();
        Self {
            id: OrderId::from(legacy.id),
            items: vec![LineItem { product, quantity: Quantity::ONE, ordered_at: date }],
            address: ShippingAddress::default(), payment: PaymentMethod::Cod,
            subtotal: price.clone(), shipping: Money::zero("INR"), total: price,
            status: legacy.status, order_date: date, estimated_delivery: None, delivered_at: None,
            tracking_steps: vec![], customer: CustomerDetails::default(), events: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order {0} not found")]
    NotFound(OrderId),
    #[error("order {id} cannot be cancelled while {status}")]
    CannotCancel { id: OrderId, status: OrderStatus },
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("order {0} already exists")]
    DuplicateId(OrderId),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, price: i64, qty: u32) -> CartEntry {
        CartEntry::new(ProductSnapshot::new(id, format!("Item {id}"), Money::inr(price)), qty)
    }

    fn new_order(items: Vec<CartEntry>) -> NewOrder {
        let totals = ShippingPolicy::default().quote(&items).unwrap();
        NewOrder { items, address: ShippingAddress::default(), payment: PaymentMethod::Cod, totals, customer: CustomerDetails::default(), delivery_days: 3 }
    }

    #[test]
    fn test_shipping_threshold() {
        let policy = ShippingPolicy::default();
        let small = policy.quote(&[entry(1, 500, 1)]).unwrap();
        assert_eq!(small.shipping, Money::inr(40));
        assert_eq!(small.total, Money::inr(540));
        let large = policy.quote(&[entry(1, 200, 3)]).unwrap();
        assert_eq!(large.subtotal, Money::inr(600));
        assert!(large.shipping.is_zero());
        assert_eq!(large.total, Money::inr(600));
    }

    #[test]
    fn test_order_workflow() {
        let mut order = Order::create(new_order(vec![entry(1, 299, 2)]));
        assert_eq!(order.status(), OrderStatus::Confirmed);
        assert_eq!(order.items()[0].product.seller, MARKETPLACE_NAME);
        assert_eq!(order.tracking_steps().len(), 1);
        for next in [OrderStatus::Processing, OrderStatus::Packed, OrderStatus::Shipped, OrderStatus::Delivered] {
            order.transition(next).unwrap();
        }
        assert!(order.delivered_at().is_some());
        assert_eq!(order.tracking_steps().len(), 5);
        assert_eq!(order.take_events().len(), 5);
    }

    #[test]
    fn test_transition_table_rejects_skips() {
        let mut order = Order::create(new_order(vec![entry(1, 100, 1)]));
        let err = order.transition(OrderStatus::Shipped).unwrap_err();
        assert_eq!(err, OrderError::InvalidTransition { from: OrderStatus::Confirmed, to: OrderStatus::Shipped });
    }

    #[test]
    fn test_cancel_only_before_packing() {
        let mut order = Order::create(new_order(vec![entry(1, 100, 1)]));
        order.transition(OrderStatus::Processing).unwrap();
        order.take_events();
        order.cancel().unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.tracking_steps().last().map(|s| s.status), Some(OrderStatus::Cancelled));
        match order.take_events().as_slice() {
            [DomainEvent::Order(OrderEvent::Cancelled { order_id })] => assert_eq!(order_id, order.id()),
            other => panic!("unexpected events {other:?}"),
        }

        let mut shipped = Order::create(new_order(vec![entry(1, 100, 1)]));
        for next in [OrderStatus::Processing, OrderStatus::Packed, OrderStatus::Shipped] { shipped.transition(next).unwrap(); }
        assert!(matches!(shipped.cancel(), Err(OrderError::CannotCancel { status: OrderStatus::Shipped, .. })));
        assert_eq!(shipped.status(), OrderStatus::Shipped);
    }

    #[test]
    fn test_renumber_updates_placed_event() {
        let mut order = Order::create(new_order(vec![entry(1, 100, 1)]));
        let before = order.id().clone();
        while order.id() == &before { order.renumber(); }
        match order.take_events().as_slice() {
            [DomainEvent::Order(OrderEvent::Placed { order_id, .. })] => assert_eq!(order_id, order.id()),
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn test_legacy_orders_are_read_back() {
        let json = serde_json::json!([
            {"id": "ORD001", "name": "Premium Areca Leaf Plates", "price": 299, "status": "delivered", "orderDate": "2024-01-15"},
            {"id": "ORD002", "name": "Handcrafted Areca Bowl Set", "price": 545, "status": "Shipped", "orderDate": "2024-01-20"},
        ]);
        let book: OrderBook = serde_json::from_value(json).unwrap();
        assert_eq!(book.len(), 2);
        let first = book.get(&OrderId::from("ORD001")).unwrap();
        assert_eq!(first.total(), &Money::inr(299));
        assert_eq!(first.items().len(), 1);
        assert_eq!(book.get(&OrderId::from("ORD002")).unwrap().status(), OrderStatus::Shipped);
    }

    #[test]
    fn test_order_book_round_trip_keeps_current_orders() {
        let mut book = OrderBook::default();
        let order = Order::create(new_order(vec![entry(4, 179, 2)]));
        let id = order.id().clone();
        book.place(order).unwrap();
        let restored: OrderBook = serde_json::from_value(serde_json::to_value(&book).unwrap()).unwrap();
        assert_eq!(restored.get(&id).unwrap().subtotal(), &Money::inr(358));
    }
}
