//! Handler tests for the profile endpoints.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use axum::Json;
use axum::extract::State;

use certiportal_core::db::unix_timestamp;
use certiportal_core::encoding::base64_encode;

use crate::auth::password;
use crate::authz::Role;
use crate::http::error::ApiError;
use crate::http::extract::AuthUser;
use crate::http::profile::{self, ChangePasswordRequest, UpdateRequest};
use crate::http::test_helpers::{claims_for, seed_user, test_state};

#[tokio::test]
async fn get_profile_includes_role() {
    let state = test_state().await;
    let staff = seed_user(&state, "funcionario@test.com", Role::Funcionario).await;

    let Json(resp) = profile::get_profile(
        State(state.clone()),
        AuthUser(claims_for(&staff, "funcionario@test.com")),
    )
    .await
    .unwrap();

    assert_eq!(resp.data.role, "funcionario");
    assert_eq!(resp.data.profile.user_id, staff);
}

#[tokio::test]
async fn get_profile_missing_is_not_found() {
    let state = test_state().await;
    state.db.create_user("u1", "sinperfil@test.com", "hash").await.unwrap();

    let err = profile::get_profile(
        State(state.clone()),
        AuthUser(claims_for("u1", "sinperfil@test.com")),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn update_patches_editable_fields_only() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    let Json(resp) = profile::update(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        Json(UpdateRequest {
            nombres: Some("Alicia".to_string()),
            telefono: Some("3001234567".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(resp.data.profile.nombres, "Alicia");
    assert_eq!(resp.data.profile.telefono.as_deref(), Some("3001234567"));
    // Immutable identity fields survive any patch
    assert_eq!(resp.data.profile.numero_identificacion, "1020304050");
    assert_eq!(resp.data.profile.email, "alice@test.com");
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    let err = profile::update(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        Json(UpdateRequest::default()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn inline_avatar_is_stored_and_linked() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    let Json(resp) = profile::update(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        Json(UpdateRequest {
            avatar_base64: Some(base64_encode(b"png bytes")),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    let avatar_url = resp.data.profile.avatar_url.unwrap();
    let (bucket, _key) = state.blobs.parse_public_url(&avatar_url).unwrap();
    assert_eq!(bucket, "avatars");
}

#[tokio::test]
async fn change_password_rehashes_and_revokes_sessions() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    state
        .db
        .create_token("t1", &alice, "refresh-hash", unix_timestamp() + 3600)
        .await
        .unwrap();

    let _ = profile::change_password(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        Json(ChangePasswordRequest {
            new_password: "nueva-clave".to_string(),
        }),
    )
    .await
    .unwrap();

    let user = state.db.get_user(&alice).await.unwrap();
    assert!(password::verify_password("nueva-clave", &user.password_hash).unwrap());
    assert!(!password::verify_password("secreto123", &user.password_hash).unwrap());

    // Outstanding refresh tokens died with the old credential
    assert!(state.db.get_token_by_hash("refresh-hash").await.unwrap().is_none());
}

#[tokio::test]
async fn change_password_validates_length() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    let err = profile::change_password(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        Json(ChangePasswordRequest {
            new_password: "corta".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}
