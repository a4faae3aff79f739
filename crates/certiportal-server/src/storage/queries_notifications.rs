//! Notification queries.
//!
//! Notifications are written as a side effect of certificate lifecycle
//! transitions and read back (and acknowledged) by their recipient.

use certiportal_core::db::{DatabaseError, unix_timestamp};

use super::db::PortalDatabase;
use super::models::Notification;

impl PortalDatabase {
    /// Insert a notification for a recipient.
    pub async fn create_notification(
        &self,
        id: &str,
        user_id: &str,
        tipo: &str,
        titulo: &str,
        mensaje: &str,
    ) -> Result<Notification, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO notifications (id, user_id, tipo, titulo, mensaje, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(tipo)
        .bind(titulo)
        .bind(mensaje)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_notification(id).await
    }

    /// Get a notification by ID.
    pub async fn get_notification(&self, id: &str) -> Result<Notification, DatabaseError> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Notification {id}")))
    }

    /// List a recipient's notifications, newest first.
    pub async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Notification>, DatabaseError> {
        let notifications = if unread_only {
            sqlx::query_as::<_, Notification>(
                "SELECT * FROM notifications WHERE user_id = ? AND leida = 0 \
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?
        } else {
            sqlx::query_as::<_, Notification>(
                "SELECT * FROM notifications WHERE user_id = ? \
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await?
        };

        Ok(notifications)
    }

    /// Count a recipient's notifications.
    pub async fn count_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
    ) -> Result<i64, DatabaseError> {
        let row: (i64,) = if unread_only {
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND leida = 0")
                .bind(user_id)
                .fetch_one(self.pool())
                .await?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(self.pool())
                .await?
        };

        Ok(row.0)
    }

    /// Mark a notification as read.
    pub async fn mark_notification_read(&self, id: &str) -> Result<Notification, DatabaseError> {
        sqlx::query("UPDATE notifications SET leida = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        self.get_notification(id).await
    }

    /// Mark all of a recipient's unread notifications as read.
    ///
    /// Idempotent; returns the number of rows flipped (0 if none were unread).
    pub async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE notifications SET leida = 1 WHERE user_id = ? AND leida = 0")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete a notification.
    pub async fn delete_notification(&self, id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
