//! Request extractors.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::{ApiError, AppState};
use crate::domain::aggregates::User;

/// Header carrying the signed-in account's uid.
pub const USER_ID_HEADER: &str = "x-user-id";

/// An account with the admin role. Rejects with 401 when the caller is
/// unknown and 403 when the account is a customer.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let uid = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Sign in required".into()))?;
        let user = state.users.find_user(uid).await?.ok_or_else(|| ApiError::Unauthorized("Unknown user".into()))?;
        if !user.is_admin() {
            tracing::warn!(uid, "admin route refused");
            return Err(ApiError::Forbidden("Admin access required".into()));
        }
        Ok(Self(user))
    }
}
