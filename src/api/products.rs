//! Catalog handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use super::{AdminUser, ApiError, ApiResult, AppState};
use crate::domain::aggregates::{self, Product, ProductDraft, ProductQuery};

pub const DEFAULT_FEATURED_LIMIT: usize = 6;

#[derive(Debug, Deserialize)]
pub struct FeaturedParams { pub limit: Option<usize> }

pub async fn list(State(s): State<AppState>, Query(q): Query<ProductQuery>) -> ApiResult<Json<Vec<Product>>> {
    let products = s.catalog.list_products().await?;
    Ok(Json(q.apply(products)))
}

pub async fn featured(State(s): State<AppState>, Query(p): Query<FeaturedParams>) -> ApiResult<Json<Vec<Product>>> {
    let limit = p.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_FEATURED_LIMIT);
    let products = s.catalog.list_products().await?;
    Ok(Json(products.into_iter().filter(Product::is_featured).take(limit).collect()))
}

pub async fn categories(State(s): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let products = s.catalog.list_products().await?;
    Ok(Json(aggregates::categories(&products)))
}

pub async fn by_category(State(s): State<AppState>, Path(category): Path<String>) -> ApiResult<Json<Vec<Product>>> {
    let products = s.catalog.list_products().await?;
    Ok(Json(products.into_iter().filter(|p| p.category() == category).collect()))
}

pub async fn get(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    s.catalog.get_product(&id).await?.map(Json).ok_or_else(|| ApiError::not_found("Product"))
}

pub async fn create(State(s): State<AppState>, AdminUser(admin): AdminUser, Json(draft): Json<ProductDraft>) -> ApiResult<(StatusCode, Json<Product>)> {
    draft.validate()?;
    let mut product = Product::create(draft)?;
    s.catalog.insert_product(&product).await.map_err(|e| match e {
        crate::store::StoreError::Conflict(_) => ApiError::Conflict("Product already exists".into()),
        other => other.into(),
    })?;
    tracing::info!(product_id = product.id(), admin = admin.uid(), "product created");
    s.events.publish(product.take_events()).await;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(State(s): State<AppState>, AdminUser(admin): AdminUser, Path(id): Path<String>, Json(draft): Json<ProductDraft>) -> ApiResult<Json<Product>> {
    draft.validate()?;
    let mut product = s.catalog.get_product(&id).await?.ok_or_else(|| ApiError::not_found("Product"))?;
    product.apply(draft);
    s.catalog.save_product(&product).await?;
    tracing::info!(product_id = product.id(), admin = admin.uid(), "product updated");
    s.events.publish(product.take_events()).await;
    Ok(Json(product))
}

pub async fn delete(State(s): State<AppState>, AdminUser(admin): AdminUser, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let mut product = s.catalog.get_product(&id).await?.ok_or_else(|| ApiError::not_found("Product"))?;
    if !s.catalog.delete_product(&id).await? { return Err(ApiError::not_found("Product")); }
    product.mark_deleted();
    tracing::info!(product_id = %id, admin = admin.uid(), "product deleted");
    s.events.publish(product.take_events()).await;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
