//! Account handlers: upsert, address book and wishlist.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApiError, ApiResult, AppState};
use crate::domain::aggregates::{AddressInput, AddressPatch, NewUser, Role, User, WishlistEntry};
use crate::store::StoreError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistResponse {
    pub uid: String,
    pub wishlist: Vec<WishlistEntry>,
}

impl From<&User> for WishlistResponse {
    fn from(u: &User) -> Self { Self { uid: u.uid().to_string(), wishlist: u.wishlist().to_vec() } }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WishlistRequest {
    #[validate(length(min = 1, message = "productId is required"))]
    pub product_id: String,
}

async fn load(s: &AppState, uid: &str) -> ApiResult<User> {
    s.users.find_user(uid).await?.ok_or_else(|| ApiError::not_found("User"))
}

async fn existing(s: &AppState, new: &NewUser) -> ApiResult<Option<User>> {
    if let Some(u) = s.users.find_user(&new.uid).await? { return Ok(Some(u)); }
    Ok(s.users.find_user_by_email(&new.email).await?)
}

/// Idempotent sign-in upsert keyed by uid or email. 201 when created, 200 when the account already exists.
pub async fn upsert(State(s): State<AppState>, Json(new): Json<NewUser>) -> ApiResult<(StatusCode, Json<User>)> {
    new.validate()?;
    let admin = s.config.is_admin_email(&new.email);
    if let Some(mut user) = existing(&s, &new).await? {
        if admin && !user.is_admin() {
            user.set_role(Role::Admin);
            s.users.save_user(&user).await?;
            tracing::info!(uid = user.uid(), "promoted to admin");
        }
        return Ok((StatusCode::OK, Json(user)));
    }
    let user = User::register(new.clone(), if admin { Role::Admin } else { Role::Customer });
    match s.users.insert_user(&user).await {
        Ok(()) => {
            tracing::info!(uid = user.uid(), role = ?user.role(), "account created");
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(StoreError::Conflict(_)) => match existing(&s, &new).await? {
            Some(user) => Ok((StatusCode::OK, Json(user))),
            None => Err(ApiError::Conflict("User already exists".into())),
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn get(State(s): State<AppState>, Path(uid): Path<String>) -> ApiResult<Json<User>> {
    Ok(Json(load(&s, &uid).await?))
}

pub async fn add_address(State(s): State<AppState>, Path(uid): Path<String>, Json(input): Json<AddressInput>) -> ApiResult<(StatusCode, Json<User>)> {
    input.validate()?;
    let mut user = load(&s, &uid).await?;
    let address_id = user.add_address(input)?.id.clone();
    s.users.save_user(&user).await?;
    tracing::info!(uid = %uid, address_id = %address_id, "address added");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_address(State(s): State<AppState>, Path((uid, address_id)): Path<(String, String)>, Json(patch): Json<AddressPatch>) -> ApiResult<Json<User>> {
    let mut user = load(&s, &uid).await?;
    user.update_address(&address_id, patch)?;
    s.users.save_user(&user).await?;
    Ok(Json(user))
}

pub async fn delete_address(State(s): State<AppState>, Path((uid, address_id)): Path<(String, String)>) -> ApiResult<Json<User>> {
    let mut user = load(&s, &uid).await?;
    user.remove_address(&address_id)?;
    s.users.save_user(&user).await?;
    Ok(Json(user))
}

pub async fn set_default_address(State(s): State<AppState>, Path((uid, address_id)): Path<(String, String)>) -> ApiResult<Json<User>> {
    let mut user = load(&s, &uid).await?;
    user.set_default_address(&address_id)?;
    s.users.save_user(&user).await?;
    Ok(Json(user))
}

pub async fn wishlist(State(s): State<AppState>, Path(uid): Path<String>) -> ApiResult<Json<WishlistResponse>> {
    Ok(Json(WishlistResponse::from(&load(&s, &uid).await?)))
}

pub async fn add_to_wishlist(State(s): State<AppState>, Path(uid): Path<String>, Json(req): Json<WishlistRequest>) -> ApiResult<Json<WishlistResponse>> {
    req.validate()?;
    let mut user = load(&s, &uid).await?;
    user.add_to_wishlist(&req.product_id)?;
    s.users.save_user(&user).await?;
    Ok(Json(WishlistResponse::from(&user)))
}

pub async fn remove_from_wishlist(State(s): State<AppState>, Path((uid, product_id)): Path<(String, String)>) -> ApiResult<Json<WishlistResponse>> {
    let mut user = load(&s, &uid).await?;
    user.remove_from_wishlist(&product_id)?;
    s.users.save_user(&user).await?;
    Ok(Json(WishlistResponse::from(&user)))
}
