//! Certificate type and certificate request queries.

use certiportal_core::db::{DatabaseError, unix_timestamp};

use super::db::PortalDatabase;
use super::models::{Certificate, CertificateDetail, CertificateType};

/// Allow-listed certificate request update, produced by the lifecycle
/// planner. Absent fields are left unchanged; everything else on the row is
/// immutable after creation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CertificatePatch {
    pub estado: Option<String>,
    pub observaciones: Option<String>,
    pub archivo_url: Option<String>,
    pub fecha_procesamiento: Option<i64>,
    pub fecha_entrega: Option<i64>,
}

const DETAIL_SELECT: &str = "SELECT c.*, \
         t.nombre AS tipo_nombre, t.descripcion AS tipo_descripcion, \
         p.nombres AS solicitante_nombres, p.apellidos AS solicitante_apellidos, p.email AS solicitante_email \
     FROM certificates c \
     LEFT JOIN certificate_types t ON t.id = c.certificate_type_id \
     LEFT JOIN profiles p ON p.user_id = c.user_id";

impl PortalDatabase {
    // =========================================================================
    // Certificate type queries
    // =========================================================================

    /// List certificate types, ordered by name.
    pub async fn list_certificate_types(
        &self,
        active_only: bool,
    ) -> Result<Vec<CertificateType>, DatabaseError> {
        let types = if active_only {
            sqlx::query_as::<_, CertificateType>(
                "SELECT * FROM certificate_types WHERE activo = 1 ORDER BY nombre",
            )
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as::<_, CertificateType>("SELECT * FROM certificate_types ORDER BY nombre")
                .fetch_all(self.pool())
                .await?
        };

        Ok(types)
    }

    /// Get a certificate type by ID.
    pub async fn get_certificate_type(&self, id: &str) -> Result<CertificateType, DatabaseError> {
        sqlx::query_as::<_, CertificateType>("SELECT * FROM certificate_types WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Certificate type {id}")))
    }

    // =========================================================================
    // Certificate request queries
    // =========================================================================

    /// Insert a new certificate request in the initial `pendiente` state.
    pub async fn create_certificate(
        &self,
        id: &str,
        user_id: &str,
        certificate_type_id: &str,
        observaciones: Option<&str>,
    ) -> Result<Certificate, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO certificates (id, user_id, certificate_type_id, estado, fecha_solicitud, observaciones) \
             VALUES (?, ?, ?, 'pendiente', ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(certificate_type_id)
        .bind(now)
        .bind(observaciones)
        .execute(self.pool())
        .await?;

        self.get_certificate(id).await
    }

    /// Get a certificate request by ID.
    pub async fn get_certificate(&self, id: &str) -> Result<Certificate, DatabaseError> {
        sqlx::query_as::<_, Certificate>("SELECT * FROM certificates WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Certificate {id}")))
    }

    /// Get a certificate request joined with its type and requester profile.
    pub async fn get_certificate_detail(
        &self,
        id: &str,
    ) -> Result<CertificateDetail, DatabaseError> {
        sqlx::query_as::<_, CertificateDetail>(&format!("{DETAIL_SELECT} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Certificate {id}")))
    }

    /// List certificate requests, newest first.
    ///
    /// `owner` restricts to a single requester (callers enforce this for
    /// non-staff roles); `estado` filters by state.
    pub async fn list_certificates(
        &self,
        owner: Option<&str>,
        estado: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CertificateDetail>, DatabaseError> {
        let certificates = sqlx::query_as::<_, CertificateDetail>(&format!(
            "{DETAIL_SELECT} \
             WHERE (? IS NULL OR c.user_id = ?) AND (? IS NULL OR c.estado = ?) \
             ORDER BY c.fecha_solicitud DESC \
             LIMIT ? OFFSET ?"
        ))
        .bind(owner)
        .bind(owner)
        .bind(estado)
        .bind(estado)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        Ok(certificates)
    }

    /// Count certificate requests matching the same filters as
    /// [`Self::list_certificates`].
    pub async fn count_certificates(
        &self,
        owner: Option<&str>,
        estado: Option<&str>,
    ) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM certificates \
             WHERE (? IS NULL OR user_id = ?) AND (? IS NULL OR estado = ?)",
        )
        .bind(owner)
        .bind(owner)
        .bind(estado)
        .bind(estado)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }

    /// Apply an allow-listed patch to a certificate request.
    pub async fn update_certificate(
        &self,
        id: &str,
        patch: &CertificatePatch,
    ) -> Result<Certificate, DatabaseError> {
        sqlx::query(
            "UPDATE certificates SET \
                 estado = COALESCE(?, estado), \
                 observaciones = COALESCE(?, observaciones), \
                 archivo_url = COALESCE(?, archivo_url), \
                 fecha_procesamiento = COALESCE(?, fecha_procesamiento), \
                 fecha_entrega = COALESCE(?, fecha_entrega) \
             WHERE id = ?",
        )
        .bind(patch.estado.as_deref())
        .bind(patch.observaciones.as_deref())
        .bind(patch.archivo_url.as_deref())
        .bind(patch.fecha_procesamiento)
        .bind(patch.fecha_entrega)
        .bind(id)
        .execute(self.pool())
        .await?;

        self.get_certificate(id).await
    }

    /// Delete a certificate request.
    ///
    /// Returns `true` if a row was deleted. Notifications already emitted for
    /// the request are left untouched.
    pub async fn delete_certificate(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM certificates WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
