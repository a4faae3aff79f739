//! Document and document category queries.

use certiportal_core::db::{DatabaseError, unix_timestamp};

use super::db::PortalDatabase;
use super::models::{Document, DocumentCategory, DocumentDetail};

/// Allow-listed document metadata update. The stored file itself
/// (`archivo_url`, `tipo_mime`, `tamano_bytes`) is immutable after creation.
#[derive(Debug, Default, Clone)]
pub struct DocumentPatch {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub category_id: Option<String>,
    /// JSON-encoded tag array.
    pub etiquetas: Option<String>,
}

impl DocumentPatch {
    pub const fn is_empty(&self) -> bool {
        self.nombre.is_none()
            && self.descripcion.is_none()
            && self.category_id.is_none()
            && self.etiquetas.is_none()
    }
}

const DETAIL_SELECT: &str = "SELECT d.*, \
         dc.nombre AS categoria_nombre, dc.descripcion AS categoria_descripcion \
     FROM documents d \
     LEFT JOIN document_categories dc ON dc.id = d.category_id";

impl PortalDatabase {
    // =========================================================================
    // Document category queries
    // =========================================================================

    /// List document categories, ordered by name.
    pub async fn list_document_categories(&self) -> Result<Vec<DocumentCategory>, DatabaseError> {
        let categories =
            sqlx::query_as::<_, DocumentCategory>("SELECT * FROM document_categories ORDER BY nombre")
                .fetch_all(self.pool())
                .await?;

        Ok(categories)
    }

    // =========================================================================
    // Document queries
    // =========================================================================

    /// Insert a new document record.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_document(
        &self,
        id: &str,
        user_id: &str,
        nombre: &str,
        descripcion: Option<&str>,
        archivo_url: &str,
        tipo_mime: Option<&str>,
        tamano_bytes: Option<i64>,
        category_id: Option<&str>,
        etiquetas: &str,
    ) -> Result<Document, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO documents (id, user_id, nombre, descripcion, archivo_url, tipo_mime, tamano_bytes, category_id, etiquetas, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(nombre)
        .bind(descripcion)
        .bind(archivo_url)
        .bind(tipo_mime)
        .bind(tamano_bytes)
        .bind(category_id)
        .bind(etiquetas)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_document(id).await
    }

    /// Get a document by ID.
    pub async fn get_document(&self, id: &str) -> Result<Document, DatabaseError> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Document {id}")))
    }

    /// Get a document joined with its category.
    pub async fn get_document_detail(&self, id: &str) -> Result<DocumentDetail, DatabaseError> {
        sqlx::query_as::<_, DocumentDetail>(&format!("{DETAIL_SELECT} WHERE d.id = ?"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Document {id}")))
    }

    /// List documents, newest first.
    ///
    /// `owner` restricts to a single uploader (callers enforce this for
    /// non-staff roles); `category` filters by category; `search` performs a
    /// case-insensitive substring match on the display name.
    pub async fn list_documents(
        &self,
        owner: Option<&str>,
        category: Option<&str>,
        search: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<DocumentDetail>, DatabaseError> {
        let documents = sqlx::query_as::<_, DocumentDetail>(&format!(
            "{DETAIL_SELECT} \
             WHERE (? IS NULL OR d.user_id = ?) \
               AND (? IS NULL OR d.category_id = ?) \
               AND (? IS NULL OR d.nombre LIKE '%' || ? || '%') \
             ORDER BY d.created_at DESC \
             LIMIT ? OFFSET ?"
        ))
        .bind(owner)
        .bind(owner)
        .bind(category)
        .bind(category)
        .bind(search)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;

        Ok(documents)
    }

    /// Count documents matching the same filters as [`Self::list_documents`].
    pub async fn count_documents(
        &self,
        owner: Option<&str>,
        category: Option<&str>,
        search: Option<&str>,
    ) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM documents \
             WHERE (? IS NULL OR user_id = ?) \
               AND (? IS NULL OR category_id = ?) \
               AND (? IS NULL OR nombre LIKE '%' || ? || '%')",
        )
        .bind(owner)
        .bind(owner)
        .bind(category)
        .bind(category)
        .bind(search)
        .bind(search)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }

    /// Apply an allow-listed metadata patch to a document.
    pub async fn update_document(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> Result<Document, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "UPDATE documents SET \
                 nombre = COALESCE(?, nombre), \
                 descripcion = COALESCE(?, descripcion), \
                 category_id = COALESCE(?, category_id), \
                 etiquetas = COALESCE(?, etiquetas), \
                 updated_at = ? \
             WHERE id = ?",
        )
        .bind(patch.nombre.as_deref())
        .bind(patch.descripcion.as_deref())
        .bind(patch.category_id.as_deref())
        .bind(patch.etiquetas.as_deref())
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        self.get_document(id).await
    }

    /// Delete a document record.
    ///
    /// Returns `true` if a row was deleted. Removal of the stored file is the
    /// caller's responsibility (best-effort, via the blob store).
    pub async fn delete_document(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
