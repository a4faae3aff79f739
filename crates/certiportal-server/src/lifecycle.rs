//! Certificate request lifecycle.
//!
//! Accepted transitions:
//!
//! ```text
//! pendiente -> en_proceso -> completado
//! pendiente -> rechazado
//! en_proceso -> rechazado
//! ```
//!
//! `completado` and `rechazado` are terminal. Re-asserting the current state
//! is a permitted no-op update, which is what makes completion idempotent:
//! `fecha_entrega` is auto-stamped only when absent.

use serde::Deserialize;

use crate::notify::NotificationKind;
use crate::storage::{Certificate, CertificatePatch};

/// The closed set of certificate request states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateState {
    Pendiente,
    EnProceso,
    Completado,
    Rechazado,
}

impl CertificateState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::EnProceso => "en_proceso",
            Self::Completado => "completado",
            Self::Rechazado => "rechazado",
        }
    }

    /// Parse a stored or requested state string. Returns `None` for anything
    /// outside the closed state set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(Self::Pendiente),
            "en_proceso" => Some(Self::EnProceso),
            "completado" => Some(Self::Completado),
            "rechazado" => Some(Self::Rechazado),
            _ => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completado | Self::Rechazado)
    }

    /// Whether the lifecycle accepts a move from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self == next {
            return true;
        }
        match self {
            Self::Pendiente => true,
            Self::EnProceso => matches!(next, Self::Completado | Self::Rechazado),
            Self::Completado | Self::Rechazado => false,
        }
    }

    /// Notification kind announcing a move into this state.
    pub const fn notification_kind(self) -> NotificationKind {
        match self {
            Self::Rechazado => NotificationKind::Error,
            _ => NotificationKind::Success,
        }
    }

    /// Verb phrase for the status-change notification message.
    pub const fn notification_phrase(self) -> &'static str {
        match self {
            Self::Pendiente => "ha sido actualizada",
            Self::EnProceso => "está siendo procesada",
            Self::Completado => "ha sido completada",
            Self::Rechazado => "ha sido rechazada",
        }
    }
}

/// Allow-listed lifecycle update as requested by a staff caller. Everything
/// not named here is immutable after creation.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CertificateUpdate {
    pub estado: Option<String>,
    pub observaciones: Option<String>,
    pub archivo_url: Option<String>,
    pub fecha_procesamiento: Option<i64>,
    pub fecha_entrega: Option<i64>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Estado inválido: {0}")]
    UnknownState(String),

    #[error("Transición de estado no permitida: {from} -> {to}")]
    ForbiddenTransition { from: &'static str, to: &'static str },

    #[error("fecha_procesamiento no puede ser anterior a fecha_solicitud")]
    ProcessingBeforeSubmission,

    #[error("fecha_entrega no puede ser anterior a fecha_solicitud")]
    DeliveryBeforeSubmission,

    #[error("fecha_entrega solo puede fijarse al completar la solicitud")]
    DeliveryWithoutCompletion,
}

/// Validate a requested update against the current record and produce the
/// patch to persist, plus the state announced to the owner (when `estado`
/// was part of the request).
pub fn plan_update(
    current: &Certificate,
    update: &CertificateUpdate,
    now: i64,
) -> Result<(CertificatePatch, Option<CertificateState>), LifecycleError> {
    let from = CertificateState::parse(&current.estado)
        .ok_or_else(|| LifecycleError::UnknownState(current.estado.clone()))?;

    let next = match update.estado.as_deref() {
        Some(s) => {
            let next = CertificateState::parse(s)
                .ok_or_else(|| LifecycleError::UnknownState(s.to_string()))?;
            if !from.can_transition_to(next) {
                return Err(LifecycleError::ForbiddenTransition {
                    from: from.as_str(),
                    to: next.as_str(),
                });
            }
            Some(next)
        }
        None => None,
    };

    let mut patch = CertificatePatch {
        estado: next.map(|s| s.as_str().to_string()),
        observaciones: update.observaciones.clone(),
        archivo_url: update.archivo_url.clone(),
        fecha_procesamiento: update.fecha_procesamiento,
        fecha_entrega: update.fecha_entrega,
    };

    if let Some(ts) = patch.fecha_procesamiento {
        if ts < current.fecha_solicitud {
            return Err(LifecycleError::ProcessingBeforeSubmission);
        }
    }

    if let Some(ts) = patch.fecha_entrega {
        let completing = next == Some(CertificateState::Completado)
            || (next.is_none() && from == CertificateState::Completado);
        if !completing {
            return Err(LifecycleError::DeliveryWithoutCompletion);
        }
        if ts < current.fecha_solicitud {
            return Err(LifecycleError::DeliveryBeforeSubmission);
        }
    }

    // Auto-stamp the processing and delivery dates the first time the
    // request reaches the matching state.
    if next == Some(CertificateState::EnProceso)
        && patch.fecha_procesamiento.is_none()
        && current.fecha_procesamiento.is_none()
    {
        patch.fecha_procesamiento = Some(now);
    }
    if next == Some(CertificateState::Completado)
        && patch.fecha_entrega.is_none()
        && current.fecha_entrega.is_none()
    {
        patch.fecha_entrega = Some(now);
    }

    Ok((patch, next))
}
