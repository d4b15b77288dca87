//! Order handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AdminUser, ApiError, ApiResult, AppState};
use crate::domain::aggregates::{NewOrder, Order, OrderStatus, PaymentStatus};
use crate::domain::value_objects::Utr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utr_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub order_status: OrderStatus,
}

pub(crate) fn parse_order_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::not_found("Order"))
}

async fn load(s: &AppState, id: Uuid) -> ApiResult<Order> {
    s.orders.get_order(id).await?.ok_or_else(|| ApiError::not_found("Order"))
}

/// Blank references are ignored; anything else must be a well-formed UTR.
pub(crate) fn parse_utr(utr: Option<&str>) -> ApiResult<Option<Utr>> {
    match utr.map(str::trim).filter(|u| !u.is_empty()) {
        None => Ok(None),
        Some(u) => Utr::parse(u).map(Some).map_err(|e| ApiError::BadRequest(e.to_string())),
    }
}

/// Apply a payment status change and persist it. Shared by the client route and the webhook.
pub(crate) async fn settle_payment(s: &AppState, id: Uuid, update: PaymentUpdate) -> ApiResult<Order> {
    let utr = parse_utr(update.utr_number.as_deref())?;
    let mut order = load(s, id).await?;
    let from = order.payment_status();
    order.update_payment(update.payment_status, utr)?;
    s.orders.save_order(&order).await?;
    tracing::info!(order_id = %id, from = %from, to = %order.payment_status(), "payment status updated");
    s.events.publish(order.take_events()).await;
    Ok(order)
}

pub async fn create(State(s): State<AppState>, Json(new): Json<NewOrder>) -> ApiResult<(StatusCode, Json<Order>)> {
    new.customer_info.check(&s.config.customer_rules)?;
    let mut order = Order::place(new)?;
    s.orders.insert_order(&order).await?;
    tracing::info!(order_id = %order.id(), user_id = order.user_id(), total = %order.total_amount(), method = order.payment_method().label(), "order placed");
    s.events.publish(order.take_events()).await;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(State(s): State<AppState>, _admin: AdminUser) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(s.orders.list_orders().await?))
}

pub async fn for_user(State(s): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(s.orders.orders_for_user(&user_id).await?))
}

pub async fn get(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Order>> {
    Ok(Json(load(&s, parse_order_id(&id)?).await?))
}

pub async fn update_payment(State(s): State<AppState>, Path(id): Path<String>, Json(update): Json<PaymentUpdate>) -> ApiResult<Json<Order>> {
    Ok(Json(settle_payment(&s, parse_order_id(&id)?, update).await?))
}

pub async fn update_status(State(s): State<AppState>, AdminUser(admin): AdminUser, Path(id): Path<String>, Json(update): Json<StatusUpdate>) -> ApiResult<Json<Order>> {
    let mut order = load(&s, parse_order_id(&id)?).await?;
    order.update_status(update.order_status)?;
    s.orders.save_order(&order).await?;
    tracing::info!(order_id = %order.id(), status = %order.order_status(), admin = admin.uid(), "order status updated");
    s.events.publish(order.take_events()).await;
    Ok(Json(order))
}
