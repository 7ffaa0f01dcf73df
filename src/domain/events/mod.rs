//! Domain events
use crate::domain::aggregates::order::OrderStatus;
use crate::domain::aggregates::profile::Role;
use crate::domain::value_objects::OrderId;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Profile(ProfileEvent),
    Listing(ListingEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: OrderId, total: Decimal, items: usize },
    StatusChanged { order_id: OrderId, from: OrderStatus, to: OrderStatus },
    Cancelled { order_id: OrderId },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProfileEvent {
    Registered { role: Role, user_id: String },
    Removed { role: Role },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListingEvent {
    Created { owner: String, listing_id: String, kind: &'static str },
    Deleted { listing_id: String, kind: &'static str },
}

impl DomainEvent {
    /// Subject suffix, e.g. `order.placed`.
    pub fn subject(&self) -> String {
        let (aggregate, name) = match self {
            Self::Order(OrderEvent::Placed { .. }) => ("order", "placed"),
            Self::Order(OrderEvent::StatusChanged { .. }) => ("order", "status_changed"),
            Self::Order(OrderEvent::Cancelled { .. }) => ("order", "cancelled"),
            Self::Profile(ProfileEvent::Registered { .. }) => ("profile", "registered"),
            Self::Profile(ProfileEvent::Removed { .. }) => ("profile", "removed"),
            Self::Listing(ListingEvent::Created { .. }) => ("listing", "created"),
            Self::Listing(ListingEvent::Deleted { .. }) => ("listing", "deleted"),
        };
        format!("{aggregate}.{name}")
    }
}
