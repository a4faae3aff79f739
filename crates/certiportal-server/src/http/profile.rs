//! Profile endpoints.
//!
//! A profile is one-to-one with its identity record. `numero_identificacion`
//! and `email` are immutable once set; everything else is owner-editable.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use certiportal_core::encoding::base64_decode;

use crate::auth::password;
use crate::authz;
use crate::blob::BUCKET_AVATARS;
use crate::storage::{Profile, ProfilePatch};

use super::auth::MIN_PASSWORD_CHARS;
use super::error::ApiError;
use super::extract::AuthUser;
use super::{AppState, DataResponse, ItemResponse, StatusResponse};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub nombres: Option<String>,
    #[serde(default)]
    pub apellidos: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Inline avatar image, base64-encoded. Stored through the blob store;
    /// overrides `avatar_url` when present.
    #[serde(default)]
    pub avatar_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

/// Wire shape of a profile: the stored row plus the resolved role.
#[derive(Debug, Serialize)]
pub struct ProfileData {
    #[serde(flatten)]
    pub profile: Profile,
    pub role: String,
}

/// `GET /profile`
#[instrument(skip_all, fields(endpoint = "get_profile"))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<DataResponse<ProfileData>>, ApiError> {
    let profile = state
        .db
        .get_profile_by_user(&claims.sub)
        .await
        .map_err(|_| ApiError::NotFound("Perfil no encontrado".to_string()))?;

    let role = authz::resolve_role(&state.db, &claims.sub).await?;

    Ok(Json(DataResponse {
        data: ProfileData {
            profile,
            role: role.as_str().to_string(),
        },
    }))
}

/// `PUT /profile`
#[instrument(skip_all, fields(endpoint = "update_profile"))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<ItemResponse<ProfileData>>, ApiError> {
    let mut patch = ProfilePatch {
        nombres: req.nombres,
        apellidos: req.apellidos,
        telefono: req.telefono,
        avatar_url: req.avatar_url,
    };

    if let Some(encoded) = &req.avatar_base64 {
        let bytes = base64_decode(encoded)
            .map_err(|e| ApiError::Validation(format!("Imagen inválida: {e}")))?;
        let key = format!("{}-{}", claims.sub, uuid::Uuid::new_v4());
        state.blobs.put(BUCKET_AVATARS, &key, &bytes).await?;
        patch.avatar_url = Some(state.blobs.public_url(BUCKET_AVATARS, &key));
    }

    if patch.is_empty() {
        return Err(ApiError::Validation("No hay campos válidos para actualizar".to_string()));
    }

    // Missing profile surfaces as 404 from the patched re-read.
    let profile = state.db.update_profile(&claims.sub, &patch).await.map_err(|e| {
        match e {
            certiportal_core::db::DatabaseError::NotFound(_) => {
                ApiError::NotFound("Perfil no encontrado".to_string())
            }
            other => other.into(),
        }
    })?;
    let role = authz::resolve_role(&state.db, &claims.sub).await?;

    info!(user_id = %claims.sub, "Profile updated");

    Ok(Json(ItemResponse {
        message: "Perfil actualizado".to_string(),
        data: ProfileData {
            profile,
            role: role.as_str().to_string(),
        },
    }))
}

/// `POST /profile/change-password`
///
/// Re-hashes the password and revokes every outstanding refresh token so
/// stolen sessions die with the old credential.
#[instrument(skip_all, fields(endpoint = "change_password"))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    if req.new_password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::Validation(
            "La contraseña debe tener al menos 6 caracteres".to_string(),
        ));
    }

    // The subject must still exist; a token can outlive its account.
    state
        .db
        .get_user(&claims.sub)
        .await
        .map_err(|_| ApiError::Authentication("Token inválido".to_string()))?;

    let hash = password::hash_password(&req.new_password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))?;

    state.db.update_user_password(&claims.sub, &hash).await?;
    let revoked = state.db.revoke_user_tokens(&claims.sub).await?;

    info!(user_id = %claims.sub, revoked, "Password changed");

    Ok(Json(StatusResponse {
        message: "Contraseña actualizada exitosamente".to_string(),
    }))
}
