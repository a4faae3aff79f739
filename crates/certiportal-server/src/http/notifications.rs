//! Notification endpoints.
//!
//! Notifications belong to their recipient: reading, acknowledging, and
//! deleting them is recipient-only, with no staff override.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::storage::Notification;

use super::error::ApiError;
use super::extract::AuthUser;
use super::{AppState, ItemResponse, StatusResponse};

const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// List envelope carrying the recipient's unread count alongside the page.
#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub data: Vec<Notification>,
    pub count: i64,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadAllResponse {
    pub message: String,
    pub count: u64,
}

/// `GET /notifications`
#[instrument(skip_all, fields(endpoint = "list_notifications"))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let unread_only = query.unread_only.unwrap_or(false);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let data = state
        .db
        .list_notifications(&claims.sub, unread_only, limit, offset)
        .await?;
    let count = state.db.count_notifications(&claims.sub, unread_only).await?;
    let unread_count = state.db.count_notifications(&claims.sub, true).await?;

    Ok(Json(NotificationListResponse {
        data,
        count,
        unread_count,
    }))
}

/// `PUT /notifications/{id}`
#[instrument(skip_all, fields(endpoint = "mark_notification_read"))]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse<Notification>>, ApiError> {
    let notification = state
        .db
        .get_notification(&id)
        .await
        .map_err(|_| ApiError::NotFound("Notificación no encontrada".to_string()))?;

    if notification.user_id != claims.sub {
        return Err(ApiError::Authorization("No autorizado".to_string()));
    }

    let updated = state.db.mark_notification_read(&id).await?;

    Ok(Json(ItemResponse {
        message: "Notificación marcada como leída".to_string(),
        data: updated,
    }))
}

/// `PUT /notifications/read-all`
///
/// Idempotent; reports how many notifications were flipped.
#[instrument(skip_all, fields(endpoint = "read_all_notifications"))]
pub async fn read_all(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ReadAllResponse>, ApiError> {
    let count = state.db.mark_all_notifications_read(&claims.sub).await?;

    info!(user_id = %claims.sub, count, "All notifications marked as read");

    Ok(Json(ReadAllResponse {
        message: "Todas las notificaciones marcadas como leídas".to_string(),
        count,
    }))
}

/// `DELETE /notifications/{id}`
#[instrument(skip_all, fields(endpoint = "delete_notification"))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let notification = state
        .db
        .get_notification(&id)
        .await
        .map_err(|_| ApiError::NotFound("Notificación no encontrada".to_string()))?;

    if notification.user_id != claims.sub {
        return Err(ApiError::Authorization("No autorizado".to_string()));
    }

    state.db.delete_notification(&id).await?;

    Ok(Json(StatusResponse {
        message: "Notificación eliminada".to_string(),
    }))
}
