//! Certificate request endpoints.
//!
//! Creation is open to every authenticated user; lifecycle transitions are
//! staff-only and emit a notification to the request owner.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use certiportal_core::db::unix_timestamp;
use certiportal_core::encoding::base64_decode;

use crate::authz::{self, Role};
use crate::blob::BUCKET_CERTIFICATES;
use crate::lifecycle::{self, CertificateState, CertificateUpdate};
use crate::notify::NotificationKind;
use crate::storage::{CertificateDetail, CertificateType};

use super::error::ApiError;
use super::extract::AuthUser;
use super::{AppState, DataResponse, ItemResponse, ListResponse, StatusResponse};

const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub estado: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub certificate_type_id: String,
    #[serde(default)]
    pub observaciones: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub archivo_url: Option<String>,
    #[serde(default)]
    pub fecha_procesamiento: Option<i64>,
    #[serde(default)]
    pub fecha_entrega: Option<i64>,
    /// Inline certificate file, base64-encoded. Stored through the blob
    /// store; overrides `archivo_url` when present.
    #[serde(default)]
    pub archivo_base64: Option<String>,
}

/// `GET /certificates/types`
#[instrument(skip_all, fields(endpoint = "certificate_types"))]
pub async fn list_types(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
) -> Result<Json<DataResponse<Vec<CertificateType>>>, ApiError> {
    let types = state.db.list_certificate_types(true).await?;
    Ok(Json(DataResponse { data: types }))
}

/// `GET /certificates`
///
/// Non-staff callers are forcibly restricted to their own requests, whatever
/// filters they ask for.
#[instrument(skip_all, fields(endpoint = "list_certificates"))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<CertificateDetail>>, ApiError> {
    let role = authz::resolve_role(&state.db, &claims.sub).await?;
    let owner = (!role.is_staff()).then_some(claims.sub.as_str());

    let estado = match query.estado.as_deref() {
        Some(s) => Some(
            CertificateState::parse(s)
                .ok_or_else(|| ApiError::Validation(format!("Estado inválido: {s}")))?,
        ),
        None => None,
    };
    let estado = estado.map(CertificateState::as_str);

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let data = state
        .db
        .list_certificates(owner, estado, limit, offset)
        .await?;
    let count = state.db.count_certificates(owner, estado).await?;

    Ok(Json(ListResponse { data, count }))
}

/// `GET /certificates/{id}`
#[instrument(skip_all, fields(endpoint = "get_certificate"))]
pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<CertificateDetail>>, ApiError> {
    let detail = state
        .db
        .get_certificate_detail(&id)
        .await
        .map_err(|_| ApiError::NotFound("Certificado no encontrado".to_string()))?;

    let role = authz::resolve_role(&state.db, &claims.sub).await?;
    if !authz::can_view_request(role, &detail.user_id, &claims.sub) {
        return Err(ApiError::Authorization("No autorizado".to_string()));
    }

    Ok(Json(DataResponse { data: detail }))
}

/// `POST /certificates`
#[instrument(skip_all, fields(endpoint = "create_certificate"))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<ItemResponse<CertificateDetail>>), ApiError> {
    if req.certificate_type_id.trim().is_empty() {
        return Err(ApiError::Validation("certificate_type_id es requerido".to_string()));
    }

    let cert_type = state
        .db
        .get_certificate_type(&req.certificate_type_id)
        .await
        .map_err(|_| ApiError::Validation("Tipo de certificado inválido".to_string()))?;
    if cert_type.activo == 0 {
        return Err(ApiError::Validation("Tipo de certificado inválido".to_string()));
    }

    let id = uuid::Uuid::new_v4().to_string();
    state
        .db
        .create_certificate(&id, &claims.sub, &cert_type.id, req.observaciones.as_deref())
        .await?;

    // Best-effort side effect: a failed notification must not undo the
    // committed request.
    state
        .notifier
        .emit_best_effort(
            &claims.sub,
            NotificationKind::Info,
            "Solicitud Creada",
            &format!("Tu solicitud de {} ha sido registrada.", cert_type.nombre),
        )
        .await;

    let detail = state.db.get_certificate_detail(&id).await?;

    info!(certificate_id = %id, user_id = %claims.sub, "Certificate request created");

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            message: "Solicitud creada exitosamente".to_string(),
            data: detail,
        }),
    ))
}

/// `PUT /certificates/{id}` (staff only)
#[instrument(skip_all, fields(endpoint = "update_certificate"))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<ItemResponse<CertificateDetail>>, ApiError> {
    let role = authz::resolve_role(&state.db, &claims.sub).await?;
    if !authz::can_mutate_request_state(role) {
        return Err(ApiError::Authorization(
            "No autorizado para actualizar certificados".to_string(),
        ));
    }

    let current = state
        .db
        .get_certificate(&id)
        .await
        .map_err(|_| ApiError::NotFound("Certificado no encontrado".to_string()))?;

    let update = CertificateUpdate {
        estado: req.estado,
        observaciones: req.observaciones,
        archivo_url: req.archivo_url,
        fecha_procesamiento: req.fecha_procesamiento,
        fecha_entrega: req.fecha_entrega,
    };

    // Validate the transition before touching the blob store.
    let (mut patch, announced) = lifecycle::plan_update(&current, &update, unix_timestamp())?;

    let mut stored_key = None;
    if let Some(encoded) = &req.archivo_base64 {
        let bytes = base64_decode(encoded)
            .map_err(|e| ApiError::Validation(format!("Archivo inválido: {e}")))?;
        let key = format!("{id}-{}.pdf", uuid::Uuid::new_v4());
        state.blobs.put(BUCKET_CERTIFICATES, &key, &bytes).await?;
        patch.archivo_url = Some(state.blobs.public_url(BUCKET_CERTIFICATES, &key));
        stored_key = Some(key);
    }

    if let Err(e) = state.db.update_certificate(&id, &patch).await {
        // The blob was written before the row: remove the orphan, best-effort.
        if let Some(key) = stored_key {
            if let Err(cleanup) = state.blobs.remove(BUCKET_CERTIFICATES, &key).await {
                warn!(error = %cleanup, key, "Failed to remove orphaned blob");
            }
        }
        return Err(e.into());
    }

    let detail = state.db.get_certificate_detail(&id).await?;

    if let Some(next) = announced {
        let tipo = detail.tipo_nombre.as_deref().unwrap_or("certificado");
        state
            .notifier
            .emit_best_effort(
                &detail.user_id,
                next.notification_kind(),
                "Actualización de Solicitud",
                &format!("Tu solicitud de {tipo} {}.", next.notification_phrase()),
            )
            .await;
    }

    info!(certificate_id = %id, estado = %detail.estado, "Certificate request updated");

    Ok(Json(ItemResponse {
        message: "Certificado actualizado".to_string(),
        data: detail,
    }))
}

/// `DELETE /certificates/{id}`
///
/// Owners may delete only while the request is still pending; admins may
/// delete at any state. Notifications already emitted are kept.
#[instrument(skip_all, fields(endpoint = "delete_certificate"))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let cert = state
        .db
        .get_certificate(&id)
        .await
        .map_err(|_| ApiError::NotFound("Certificado no encontrado".to_string()))?;

    let role = authz::resolve_role(&state.db, &claims.sub).await?;
    let estado = CertificateState::parse(&cert.estado)
        .ok_or_else(|| ApiError::Internal(format!("unknown stored state '{}'", cert.estado)))?;
    let is_owner = cert.user_id == claims.sub;

    if !authz::can_delete_request(role, estado, is_owner) {
        let message = if is_owner && role != Role::Admin {
            "Solo se pueden eliminar solicitudes pendientes"
        } else {
            "No autorizado"
        };
        warn!(certificate_id = %id, user_id = %claims.sub, "Certificate delete denied");
        return Err(ApiError::Authorization(message.to_string()));
    }

    state.db.delete_certificate(&id).await?;

    info!(certificate_id = %id, user_id = %claims.sub, "Certificate request deleted");

    Ok(Json(StatusResponse {
        message: "Certificado eliminado".to_string(),
    }))
}
