//! Bearer credential extraction for request handlers.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::auth::Claims;

use super::AppState;
use super::error::ApiError;

/// The authenticated caller, extracted from the `Authorization` header.
///
/// Accepts access tokens only; refresh tokens are rejected even though they
/// carry the same claim shape.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Authentication("Token de autorización requerido".to_string()))?;

        let claims = state
            .jwt
            .validate(token)
            .map_err(|_| ApiError::Authentication("Token inválido".to_string()))?;

        if !claims.is_access() {
            return Err(ApiError::Authentication("Token inválido".to_string()));
        }

        Ok(Self(claims))
    }
}
