//! REST surface for the `CertiPortal` server.

pub mod auth;
pub mod certificates;
pub mod documents;
pub mod error;
pub mod extract;
pub mod notifications;
pub mod profile;
pub mod stats;

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
mod documents_tests;
#[cfg(test)]
mod profile_tests;
#[cfg(test)]
mod stats_tests;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use serde::Serialize;

use crate::auth::JwtManager;
use crate::blob::BlobStore;
use crate::notify::NotificationEmitter;
use crate::storage::PortalDatabase;

use error::ApiError;

/// Request body cap. Inline uploads are base64-encoded, so this sits above
/// the 10 MiB blob limit to leave room for encoding overhead and envelope.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PortalDatabase,
    pub jwt: Arc<JwtManager>,
    pub blobs: Arc<BlobStore>,
    pub notifier: NotificationEmitter,
}

impl AppState {
    pub fn new(db: PortalDatabase, jwt: Arc<JwtManager>, blobs: Arc<BlobStore>) -> Self {
        let notifier = NotificationEmitter::new(db.clone());
        Self {
            db,
            jwt,
            blobs,
            notifier,
        }
    }
}

/// `{"data": ...}` success envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// `{"data": [...], "count": n}` list envelope. `count` is the total number
/// of matching rows, ignoring pagination.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub count: i64,
}

/// `{"message": ..., "data": ...}` mutation envelope.
#[derive(Debug, Serialize)]
pub struct ItemResponse<T> {
    pub message: String,
    pub data: T,
}

/// `{"message": ...}` envelope for mutations with no payload.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

/// Build the portal router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route(
            "/certificates",
            get(certificates::list).post(certificates::create),
        )
        .route("/certificates/types", get(certificates::list_types))
        .route(
            "/certificates/{id}",
            get(certificates::get_one)
                .put(certificates::update)
                .delete(certificates::delete),
        )
        .route("/documents", get(documents::list).post(documents::create))
        .route("/documents/categories", get(documents::list_categories))
        .route(
            "/documents/{id}",
            get(documents::get_one)
                .put(documents::update)
                .delete(documents::delete),
        )
        .route("/notifications", get(notifications::list))
        .route("/notifications/read-all", put(notifications::read_all))
        .route(
            "/notifications/{id}",
            put(notifications::mark_read).delete(notifications::delete),
        )
        .route("/profile", get(profile::get_profile).put(profile::update))
        .route("/profile/change-password", post(profile::change_password))
        .route("/stats", get(stats::stats))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Recurso no encontrado".to_string())
}
