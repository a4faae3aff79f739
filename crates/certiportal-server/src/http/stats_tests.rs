//! Handler tests for the dashboard statistics endpoint.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use axum::Json;
use axum::extract::State;

use crate::authz::Role;
use crate::http::AppState;
use crate::http::extract::AuthUser;
use crate::http::stats;
use crate::http::test_helpers::{claims_for, seed_user, seeded_type_id, test_state};
use crate::notify::NotificationKind;
use crate::storage::CertificatePatch;

async fn seed_certificate(state: &AppState, user: &str, estado: &str) -> String {
    let type_id = seeded_type_id(state).await;
    let id = uuid::Uuid::new_v4().to_string();
    state
        .db
        .create_certificate(&id, user, &type_id, None)
        .await
        .unwrap();
    if estado != "pendiente" {
        state
            .db
            .update_certificate(
                &id,
                &CertificatePatch {
                    estado: Some(estado.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }
    id
}

#[tokio::test]
async fn applicant_stats_are_scoped_to_own_records() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;
    let bob = seed_user(&state, "bob@test.com", Role::Aprendiz).await;

    seed_certificate(&state, &alice, "pendiente").await;
    seed_certificate(&state, &alice, "completado").await;
    seed_certificate(&state, &bob, "pendiente").await;
    state
        .notifier
        .emit(&alice, NotificationKind::Info, "t", "m")
        .await
        .unwrap();

    let Json(resp) = stats::stats(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
    )
    .await
    .unwrap();
    let data = resp.data;

    assert_eq!(data.certificates.total, 2);
    assert_eq!(data.certificates.pending, 1);
    assert_eq!(data.certificates.in_process, 0);
    assert_eq!(data.certificates.completed, 1);
    assert_eq!(data.notifications.unread, 1);
    assert_eq!(data.recent_activity.len(), 2);
    assert!(data.staff_stats.is_none());
    assert_eq!(data.user_role, "aprendiz");
}

#[tokio::test]
async fn staff_stats_are_global_and_carry_user_count() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;
    let bob = seed_user(&state, "bob@test.com", Role::Aprendiz).await;
    let staff = seed_user(&state, "funcionario@test.com", Role::Funcionario).await;

    seed_certificate(&state, &alice, "pendiente").await;
    seed_certificate(&state, &bob, "en_proceso").await;

    let Json(resp) = stats::stats(
        State(state.clone()),
        AuthUser(claims_for(&staff, "funcionario@test.com")),
    )
    .await
    .unwrap();
    let data = resp.data;

    assert_eq!(data.certificates.total, 2);
    assert_eq!(data.certificates.pending, 1);
    assert_eq!(data.certificates.in_process, 1);
    assert_eq!(data.staff_stats.unwrap().total_users, 3);
    assert_eq!(data.user_role, "funcionario");
}

#[tokio::test]
async fn recent_activity_is_capped_at_five() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    for _ in 0..7 {
        seed_certificate(&state, &alice, "pendiente").await;
    }

    let Json(resp) = stats::stats(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
    )
    .await
    .unwrap();

    assert_eq!(resp.data.recent_activity.len(), 5);
    assert_eq!(resp.data.certificates.total, 7);
}
