//! Dashboard statistics endpoint.
//!
//! Counts are scoped to the caller for regular users and global for staff,
//! mirroring the visibility rules of the list endpoints.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::instrument;

use crate::authz;
use crate::lifecycle::CertificateState;
use crate::storage::CertificateDetail;

use super::error::ApiError;
use super::extract::AuthUser;
use super::{AppState, DataResponse};

const RECENT_ACTIVITY_LIMIT: u32 = 5;

#[derive(Debug, Serialize)]
pub struct CertificateCounts {
    pub total: i64,
    pub pending: i64,
    pub in_process: i64,
    pub completed: i64,
}

#[derive(Debug, Serialize)]
pub struct DocumentCounts {
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct NotificationCounts {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct StaffStats {
    pub total_users: i64,
}

#[derive(Debug, Serialize)]
pub struct RecentRequest {
    pub id: String,
    pub estado: String,
    pub fecha_solicitud: i64,
    pub tipo_nombre: Option<String>,
}

impl From<CertificateDetail> for RecentRequest {
    fn from(c: CertificateDetail) -> Self {
        Self {
            id: c.id,
            estado: c.estado,
            fecha_solicitud: c.fecha_solicitud,
            tipo_nombre: c.tipo_nombre,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub certificates: CertificateCounts,
    pub documents: DocumentCounts,
    pub notifications: NotificationCounts,
    pub recent_activity: Vec<RecentRequest>,
    pub staff_stats: Option<StaffStats>,
    pub user_role: String,
}

/// `GET /stats`
#[instrument(skip_all, fields(endpoint = "stats"))]
pub async fn stats(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<DataResponse<StatsData>>, ApiError> {
    let role = authz::resolve_role(&state.db, &claims.sub).await?;
    let owner = (!role.is_staff()).then_some(claims.sub.as_str());

    let certificates = CertificateCounts {
        total: state.db.count_certificates(owner, None).await?,
        pending: state
            .db
            .count_certificates(owner, Some(CertificateState::Pendiente.as_str()))
            .await?,
        in_process: state
            .db
            .count_certificates(owner, Some(CertificateState::EnProceso.as_str()))
            .await?,
        completed: state
            .db
            .count_certificates(owner, Some(CertificateState::Completado.as_str()))
            .await?,
    };

    let documents = DocumentCounts {
        total: state.db.count_documents(owner, None, None).await?,
    };

    let notifications = NotificationCounts {
        unread: state.db.count_notifications(&claims.sub, true).await?,
    };

    let recent_activity = state
        .db
        .list_certificates(owner, None, RECENT_ACTIVITY_LIMIT, 0)
        .await?
        .into_iter()
        .map(RecentRequest::from)
        .collect();

    let staff_stats = if role.is_staff() {
        Some(StaffStats {
            total_users: state.db.count_profiles().await?,
        })
    } else {
        None
    };

    Ok(Json(DataResponse {
        data: StatsData {
            certificates,
            documents,
            notifications,
            recent_activity,
            staff_stats,
            user_role: role.as_str().to_string(),
        },
    }))
}
