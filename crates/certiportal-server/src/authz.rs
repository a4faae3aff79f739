//! Role resolution and authorization checks.
//!
//! Roles are a closed set; unknown strings coming out of storage are rejected
//! rather than silently granted a privilege level. A user with no role row is
//! treated as an aprendiz (lowest privilege) everywhere.

use serde::{Deserialize, Serialize};

use certiportal_core::db::DatabaseError;

use crate::lifecycle::CertificateState;
use crate::storage::PortalDatabase;

/// Portal roles, from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Funcionario,
    Instructor,
    Aprendiz,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Funcionario => "funcionario",
            Self::Instructor => "instructor",
            Self::Aprendiz => "aprendiz",
        }
    }

    /// Parse a stored role string. Returns `None` for anything outside the
    /// closed role set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "funcionario" => Some(Self::Funcionario),
            "instructor" => Some(Self::Instructor),
            "aprendiz" => Some(Self::Aprendiz),
            _ => None,
        }
    }

    /// Staff roles may view and mutate every certificate request.
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Funcionario)
    }
}

/// Look up the caller's role. A user with no role row resolves to
/// [`Role::Aprendiz`]; an unknown role string is a storage-level error.
pub async fn resolve_role(db: &PortalDatabase, user_id: &str) -> Result<Role, DatabaseError> {
    match db.get_user_role(user_id).await? {
        Some(stored) => Role::parse(&stored)
            .ok_or_else(|| DatabaseError::Query(format!("unknown role '{stored}' for user {user_id}"))),
        None => Ok(Role::Aprendiz),
    }
}

/// A certificate request is visible to its owner and to staff.
pub fn can_view_request(role: Role, owner_id: &str, caller_id: &str) -> bool {
    owner_id == caller_id || role.is_staff()
}

/// Only staff may move a certificate request through its lifecycle.
pub const fn can_mutate_request_state(role: Role) -> bool {
    role.is_staff()
}

/// Admins may delete a request at any state; the owner only while it is
/// still pending.
pub fn can_delete_request(role: Role, estado: CertificateState, is_owner: bool) -> bool {
    role == Role::Admin || (is_owner && estado == CertificateState::Pendiente)
}
