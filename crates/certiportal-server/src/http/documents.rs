//! Document endpoints.
//!
//! Documents carry no lifecycle: they exist until their owner (or an admin)
//! deletes them. Files arrive either as an external URL or inline as base64,
//! in which case they are stored through the blob store.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use certiportal_core::encoding::base64_decode;

use crate::authz::{self, Role};
use crate::blob::BUCKET_DOCUMENTS;
use crate::storage::{DocumentCategory, DocumentDetail, DocumentPatch};

use super::error::ApiError;
use super::extract::AuthUser;
use super::{AppState, DataResponse, ItemResponse, ListResponse, StatusResponse};

const DEFAULT_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub archivo_url: Option<String>,
    /// Inline file content, base64-encoded. Stored through the blob store;
    /// mutually exclusive with `archivo_url`.
    #[serde(default)]
    pub archivo_base64: Option<String>,
    #[serde(default)]
    pub tipo_mime: Option<String>,
    #[serde(default)]
    pub tamano_bytes: Option<i64>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub etiquetas: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub etiquetas: Option<Vec<String>>,
}

/// Wire shape of a document: `etiquetas` decoded from its stored JSON text.
#[derive(Debug, Serialize)]
pub struct DocumentPayload {
    pub id: String,
    pub user_id: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub archivo_url: String,
    pub tipo_mime: Option<String>,
    pub tamano_bytes: Option<i64>,
    pub category_id: Option<String>,
    pub etiquetas: Vec<String>,
    pub categoria_nombre: Option<String>,
    pub categoria_descripcion: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<DocumentDetail> for DocumentPayload {
    fn from(d: DocumentDetail) -> Self {
        let etiquetas = serde_json::from_str(&d.etiquetas).unwrap_or_default();
        Self {
            id: d.id,
            user_id: d.user_id,
            nombre: d.nombre,
            descripcion: d.descripcion,
            archivo_url: d.archivo_url,
            tipo_mime: d.tipo_mime,
            tamano_bytes: d.tamano_bytes,
            category_id: d.category_id,
            etiquetas,
            categoria_nombre: d.categoria_nombre,
            categoria_descripcion: d.categoria_descripcion,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

fn encode_tags(tags: &[String]) -> Result<String, ApiError> {
    serde_json::to_string(tags).map_err(|e| ApiError::Internal(format!("Tag encoding failed: {e}")))
}

/// `GET /documents/categories`
#[instrument(skip_all, fields(endpoint = "document_categories"))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
) -> Result<Json<DataResponse<Vec<DocumentCategory>>>, ApiError> {
    let categories = state.db.list_document_categories().await?;
    Ok(Json(DataResponse { data: categories }))
}

/// `GET /documents`
///
/// Non-staff callers are forcibly restricted to their own documents.
#[instrument(skip_all, fields(endpoint = "list_documents"))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<DocumentPayload>>, ApiError> {
    let role = authz::resolve_role(&state.db, &claims.sub).await?;
    let owner = (!role.is_staff()).then_some(claims.sub.as_str());

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let data = state
        .db
        .list_documents(
            owner,
            query.category_id.as_deref(),
            query.search.as_deref(),
            limit,
            offset,
        )
        .await?;
    let count = state
        .db
        .count_documents(owner, query.category_id.as_deref(), query.search.as_deref())
        .await?;

    Ok(Json(ListResponse {
        data: data.into_iter().map(DocumentPayload::from).collect(),
        count,
    }))
}

/// `GET /documents/{id}`
#[instrument(skip_all, fields(endpoint = "get_document"))]
pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<DocumentPayload>>, ApiError> {
    let detail = state
        .db
        .get_document_detail(&id)
        .await
        .map_err(|_| ApiError::NotFound("Documento no encontrado".to_string()))?;

    let role = authz::resolve_role(&state.db, &claims.sub).await?;
    if detail.user_id != claims.sub && !role.is_staff() {
        return Err(ApiError::Authorization("No autorizado".to_string()));
    }

    Ok(Json(DataResponse {
        data: DocumentPayload::from(detail),
    }))
}

/// `POST /documents`
#[instrument(skip_all, fields(endpoint = "create_document"))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<CreateRequest>,
) -> Result<(StatusCode, Json<ItemResponse<DocumentPayload>>), ApiError> {
    if req.nombre.trim().is_empty() {
        return Err(ApiError::Validation("nombre y archivo_url son requeridos".to_string()));
    }

    // Resolve the file reference: inline content wins, otherwise an external
    // URL must have been supplied.
    let mut stored_key = None;
    let mut tamano_bytes = req.tamano_bytes;
    let archivo_url = if let Some(encoded) = &req.archivo_base64 {
        let bytes = base64_decode(encoded)
            .map_err(|e| ApiError::Validation(format!("Archivo inválido: {e}")))?;
        let key = format!("{}-{}", uuid::Uuid::new_v4(), sanitize_key(&req.nombre));
        state.blobs.put(BUCKET_DOCUMENTS, &key, &bytes).await?;
        #[allow(clippy::cast_possible_wrap)]
        {
            tamano_bytes = Some(bytes.len() as i64);
        }
        let url = state.blobs.public_url(BUCKET_DOCUMENTS, &key);
        stored_key = Some(key);
        url
    } else if let Some(url) = req.archivo_url.as_deref().filter(|u| !u.trim().is_empty()) {
        url.to_string()
    } else {
        return Err(ApiError::Validation("nombre y archivo_url son requeridos".to_string()));
    };

    let etiquetas = encode_tags(req.etiquetas.as_deref().unwrap_or_default())?;
    let id = uuid::Uuid::new_v4().to_string();

    let created = state
        .db
        .create_document(
            &id,
            &claims.sub,
            req.nombre.trim(),
            req.descripcion.as_deref(),
            &archivo_url,
            req.tipo_mime.as_deref(),
            tamano_bytes,
            req.category_id.as_deref(),
            &etiquetas,
        )
        .await;

    if let Err(e) = created {
        // The blob was written before the row: remove the orphan, best-effort.
        if let Some(key) = stored_key {
            if let Err(cleanup) = state.blobs.remove(BUCKET_DOCUMENTS, &key).await {
                warn!(error = %cleanup, key, "Failed to remove orphaned blob");
            }
        }
        return Err(e.into());
    }

    let detail = state.db.get_document_detail(&id).await?;

    info!(document_id = %id, user_id = %claims.sub, "Document created");

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            message: "Documento creado exitosamente".to_string(),
            data: DocumentPayload::from(detail),
        }),
    ))
}

/// `PUT /documents/{id}` (owner only)
#[instrument(skip_all, fields(endpoint = "update_document"))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<ItemResponse<DocumentPayload>>, ApiError> {
    let document = state
        .db
        .get_document(&id)
        .await
        .map_err(|_| ApiError::NotFound("Documento no encontrado".to_string()))?;

    if document.user_id != claims.sub {
        return Err(ApiError::Authorization("No autorizado".to_string()));
    }

    let patch = DocumentPatch {
        nombre: req.nombre,
        descripcion: req.descripcion,
        category_id: req.category_id,
        etiquetas: req.etiquetas.as_deref().map(encode_tags).transpose()?,
    };
    if patch.is_empty() {
        return Err(ApiError::Validation("No hay campos válidos para actualizar".to_string()));
    }

    state.db.update_document(&id, &patch).await?;
    let detail = state.db.get_document_detail(&id).await?;

    info!(document_id = %id, "Document updated");

    Ok(Json(ItemResponse {
        message: "Documento actualizado".to_string(),
        data: DocumentPayload::from(detail),
    }))
}

/// `DELETE /documents/{id}` (owner or admin)
#[instrument(skip_all, fields(endpoint = "delete_document"))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let document = state
        .db
        .get_document(&id)
        .await
        .map_err(|_| ApiError::NotFound("Documento no encontrado".to_string()))?;

    let role = authz::resolve_role(&state.db, &claims.sub).await?;
    if document.user_id != claims.sub && role != Role::Admin {
        return Err(ApiError::Authorization("No autorizado".to_string()));
    }

    state.db.delete_document(&id).await?;

    // Locally stored files are cleaned up best-effort; externally hosted
    // URLs are left alone.
    if let Some((bucket, key)) = state.blobs.parse_public_url(&document.archivo_url) {
        if let Err(e) = state.blobs.remove(&bucket, &key).await {
            warn!(error = %e, bucket, key, "Failed to remove stored file");
        }
    }

    info!(document_id = %id, user_id = %claims.sub, "Document deleted");

    Ok(Json(StatusResponse {
        message: "Documento eliminado".to_string(),
    }))
}

/// Flatten a display name into a safe blob key suffix.
fn sanitize_key(nombre: &str) -> String {
    nombre
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
