//! Identity endpoints: registration, login, logout, current user.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::auth::{JwtManager, password};
use crate::authz::{self, Role};
use crate::storage::{Profile, User};

use super::error::ApiError;
use super::extract::AuthUser;
use super::{AppState, StatusResponse};

/// Minimum accepted password length, for registration and password changes.
pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub numero_identificacion: String,
    pub nombres: String,
    pub apellidos: String,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Public view of an identity record.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub created_at: i64,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserInfo,
    #[serde(flatten)]
    pub tokens: SessionTokens,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserInfo,
    pub profile: Option<Profile>,
    pub role: String,
    #[serde(flatten)]
    pub tokens: SessionTokens,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserInfo,
    pub profile: Option<Profile>,
    pub role: String,
}

/// Issue an access/refresh token pair and persist the refresh token hash.
async fn issue_session(state: &AppState, user: &User) -> Result<SessionTokens, ApiError> {
    let (access_token, expires_in_secs) = state
        .jwt
        .issue_access_token(&user.id, &user.email)
        .map_err(|e| ApiError::Internal(format!("Token creation failed: {e}")))?;

    let (refresh_token, refresh_exp) = state
        .jwt
        .issue_refresh_token(&user.id, &user.email)
        .map_err(|e| ApiError::Internal(format!("Token creation failed: {e}")))?;

    let token_id = uuid::Uuid::new_v4().to_string();
    let token_hash = JwtManager::hash_token(&refresh_token);
    state
        .db
        .create_token(&token_id, &user.id, &token_hash, refresh_exp)
        .await?;

    Ok(SessionTokens {
        access_token,
        refresh_token,
        expires_in_secs,
    })
}

/// `POST /auth/register`
#[instrument(skip_all, fields(endpoint = "register"))]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if req.email.trim().is_empty()
        || req.password.is_empty()
        || req.numero_identificacion.trim().is_empty()
        || req.nombres.trim().is_empty()
        || req.apellidos.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Campos requeridos: email, password, numero_identificacion, nombres, apellidos"
                .to_string(),
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::Validation(
            "La contraseña debe tener al menos 6 caracteres".to_string(),
        ));
    }

    let role = match req.role.as_deref().filter(|r| !r.is_empty()) {
        Some(r) => {
            Role::parse(r).ok_or_else(|| ApiError::Validation(format!("Rol inválido: {r}")))?
        }
        None => Role::Aprendiz,
    };

    if state.db.get_user_by_email(&req.email).await.is_ok() {
        return Err(ApiError::Conflict("El correo ya está registrado".to_string()));
    }

    let hash = password::hash_password(&req.password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))?;

    let user_id = uuid::Uuid::new_v4().to_string();
    let user = state.db.create_user(&user_id, &req.email, &hash).await?;

    let profile_id = uuid::Uuid::new_v4().to_string();
    state
        .db
        .create_profile(
            &profile_id,
            &user_id,
            &req.numero_identificacion,
            &req.nombres,
            &req.apellidos,
            &req.email,
            req.telefono.as_deref(),
        )
        .await?;
    state.db.set_user_role(&user_id, role.as_str()).await?;

    let tokens = issue_session(&state, &user).await?;

    info!(user_id = %user.id, role = role.as_str(), "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Usuario registrado exitosamente".to_string(),
            user: UserInfo::from(&user),
            tokens,
        }),
    ))
}

/// `POST /auth/login`
#[instrument(skip_all, fields(endpoint = "login"))]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("Email y password son requeridos".to_string()));
    }

    let user = state
        .db
        .get_user_by_email(&req.email)
        .await
        .map_err(|_| ApiError::Authentication("Credenciales inválidas".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("Password verification failed: {e}")))?;

    if !valid {
        warn!(email = %req.email, "Failed login attempt");
        return Err(ApiError::Authentication("Credenciales inválidas".to_string()));
    }

    let profile = state.db.get_profile_by_user(&user.id).await.ok();
    let role = authz::resolve_role(&state.db, &user.id).await?;
    let tokens = issue_session(&state, &user).await?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login exitoso".to_string(),
        user: UserInfo::from(&user),
        profile,
        role: role.as_str().to_string(),
        tokens,
    }))
}

/// `POST /auth/logout`
///
/// Best-effort: an unknown or already-revoked refresh token still answers
/// with a successful close so clients can always drop their session.
#[instrument(skip_all, fields(endpoint = "logout"))]
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let token_hash = JwtManager::hash_token(&req.refresh_token);
    match state.db.get_token_by_hash(&token_hash).await {
        Ok(Some(token)) => {
            state.db.revoke_token(&token.id).await?;
            info!(user_id = %token.user_id, "User logged out");
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Logout token lookup failed"),
    }

    Ok(Json(StatusResponse {
        message: "Sesión cerrada exitosamente".to_string(),
    }))
}

/// `GET /auth/me`
#[instrument(skip_all, fields(endpoint = "me"))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state
        .db
        .get_user(&claims.sub)
        .await
        .map_err(|_| ApiError::Authentication("Token inválido".to_string()))?;

    let profile = state.db.get_profile_by_user(&user.id).await.ok();
    let role = authz::resolve_role(&state.db, &user.id).await?;

    Ok(Json(MeResponse {
        user: UserInfo::from(&user),
        profile,
        role: role.as_str().to_string(),
    }))
}
