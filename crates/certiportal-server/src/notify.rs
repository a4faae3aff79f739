//! Notification emitter.
//!
//! Writes notification records as a side effect of certificate lifecycle
//! transitions. Lifecycle callers use [`NotificationEmitter::emit_best_effort`]:
//! a failed insert must not undo the transition that triggered it, so the
//! failure is logged and swallowed.

use tracing::warn;

use certiportal_core::db::DatabaseError;

use crate::storage::{Notification, PortalDatabase};

/// The closed set of notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

impl NotificationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Emits notifications into the portal database.
#[derive(Clone)]
pub struct NotificationEmitter {
    db: PortalDatabase,
}

impl NotificationEmitter {
    pub const fn new(db: PortalDatabase) -> Self {
        Self { db }
    }

    /// Insert a notification, propagating storage failures.
    pub async fn emit(
        &self,
        recipient: &str,
        kind: NotificationKind,
        titulo: &str,
        mensaje: &str,
    ) -> Result<Notification, DatabaseError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.db
            .create_notification(&id, recipient, kind.as_str(), titulo, mensaje)
            .await
    }

    /// Insert a notification, logging (and swallowing) storage failures.
    pub async fn emit_best_effort(
        &self,
        recipient: &str,
        kind: NotificationKind,
        titulo: &str,
        mensaje: &str,
    ) {
        if let Err(e) = self.emit(recipient, kind, titulo, mensaje).await {
            warn!(error = %e, recipient, titulo, "Failed to record notification");
        }
    }
}
