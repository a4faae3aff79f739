//! Shared fixtures for handler tests.
//!
//! Handlers are plain async functions over extractor values, so tests call
//! them directly with an in-memory database and a temp-dir blob store.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use certiportal_core::db::unix_timestamp;

use crate::auth::{Claims, JwtManager, password};
use crate::authz::Role;
use crate::blob::BlobStore;
use crate::storage::PortalDatabase;

use super::AppState;

pub const TEST_PUBLIC_BASE_URL: &str = "http://localhost:8080/files";

/// Build an [`AppState`] over an in-memory database and a throwaway blob
/// root. The temp dir is intentionally leaked for the lifetime of the test
/// process so stored files survive until assertions run.
pub async fn test_state() -> AppState {
    let db = PortalDatabase::open_in_memory().await.unwrap();
    let jwt = Arc::new(JwtManager::new(b"test-secret-key-for-testing", 3600, 86400));

    let dir = tempfile::tempdir().unwrap();
    let blobs = Arc::new(BlobStore::new(dir.keep(), TEST_PUBLIC_BASE_URL));

    AppState::new(db, jwt, blobs)
}

/// Register a user with the given role and return its ID.
pub async fn seed_user(state: &AppState, email: &str, role: Role) -> String {
    let user_id = uuid::Uuid::new_v4().to_string();
    let hash = password::hash_password("secreto123").unwrap();
    state.db.create_user(&user_id, email, &hash).await.unwrap();

    let profile_id = uuid::Uuid::new_v4().to_string();
    state
        .db
        .create_profile(&profile_id, &user_id, "1020304050", "Nombre", "Apellido", email, None)
        .await
        .unwrap();
    state.db.set_user_role(&user_id, role.as_str()).await.unwrap();

    user_id
}

/// Access-token claims for a seeded user.
pub fn claims_for(user_id: &str, email: &str) -> Claims {
    let now = unix_timestamp();
    Claims {
        jti: uuid::Uuid::new_v4().to_string(),
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now,
        exp: now + 3600,
        token_type: "access".to_string(),
    }
}

/// First seeded active certificate type.
pub async fn seeded_type_id(state: &AppState) -> String {
    let types = state.db.list_certificate_types(true).await.unwrap();
    types[0].id.clone()
}
