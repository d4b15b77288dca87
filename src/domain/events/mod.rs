//! Domain events
use crate::domain::aggregates::{OrderStatus, PaymentStatus};
use crate::domain::value_objects::Money;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", rename_all = "snake_case")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::Created { .. }) => "storefront.products.created",
            Self::Product(ProductEvent::Updated { .. }) => "storefront.products.updated",
            Self::Product(ProductEvent::Deleted { .. }) => "storefront.products.deleted",
            Self::Order(OrderEvent::Placed { .. }) => "storefront.orders.placed",
            Self::Order(OrderEvent::PaymentUpdated { .. }) => "storefront.orders.payment",
            Self::Order(OrderEvent::StatusChanged { .. }) => "storefront.orders.status",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProductEvent {
    Created { product_id: String },
    Updated { product_id: String },
    Deleted { product_id: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Placed { order_id: Uuid, user_id: String, total: Money },
    PaymentUpdated { order_id: Uuid, status: PaymentStatus, utr: Option<String> },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
}
