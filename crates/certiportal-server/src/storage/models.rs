//! Data models for `CertiPortal` storage.

use serde::{Deserialize, Serialize};

/// Identity record. Never serialized to the wire (carries the password hash).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Stored refresh token (hash only, raw tokens are never persisted).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Token {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: i64,
    pub revoked: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub numero_identificacion: String,
    pub nombres: String,
    pub apellidos: String,
    pub email: String,
    pub telefono: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CertificateType {
    pub id: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub activo: i64,
    pub tiempo_estimado_dias: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Certificate {
    pub id: String,
    pub user_id: String,
    pub certificate_type_id: String,
    pub estado: String,
    pub fecha_solicitud: i64,
    pub fecha_procesamiento: Option<i64>,
    pub fecha_entrega: Option<i64>,
    pub observaciones: Option<String>,
    pub archivo_url: Option<String>,
}

/// Certificate row joined with its type and the requester's profile, as
/// returned by list/detail queries.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CertificateDetail {
    pub id: String,
    pub user_id: String,
    pub certificate_type_id: String,
    pub estado: String,
    pub fecha_solicitud: i64,
    pub fecha_procesamiento: Option<i64>,
    pub fecha_entrega: Option<i64>,
    pub observaciones: Option<String>,
    pub archivo_url: Option<String>,
    pub tipo_nombre: Option<String>,
    pub tipo_descripcion: Option<String>,
    pub solicitante_nombres: Option<String>,
    pub solicitante_apellidos: Option<String>,
    pub solicitante_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentCategory {
    pub id: String,
    pub nombre: String,
    pub descripcion: Option<String>,
}

/// Document row. `etiquetas` is stored as a JSON array in a TEXT column.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub archivo_url: String,
    pub tipo_mime: Option<String>,
    pub tamano_bytes: Option<i64>,
    pub category_id: Option<String>,
    pub etiquetas: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Document row joined with its category for list/detail responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentDetail {
    pub id: String,
    pub user_id: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub archivo_url: String,
    pub tipo_mime: Option<String>,
    pub tamano_bytes: Option<i64>,
    pub category_id: Option<String>,
    pub etiquetas: String,
    pub categoria_nombre: Option<String>,
    pub categoria_descripcion: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub tipo: String,
    pub titulo: String,
    pub mensaje: String,
    pub leida: i64,
    pub created_at: i64,
}
