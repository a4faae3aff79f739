//! Handler tests for the document endpoints.

#![allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use certiportal_core::encoding::base64_encode;

use crate::authz::Role;
use crate::http::AppState;
use crate::http::documents::{self, CreateRequest, DocumentPayload, ListQuery, UpdateRequest};
use crate::http::error::ApiError;
use crate::http::extract::AuthUser;
use crate::http::test_helpers::{claims_for, seed_user, test_state};

fn upload_req(nombre: &str, contents: &[u8]) -> CreateRequest {
    CreateRequest {
        nombre: nombre.to_string(),
        descripcion: None,
        archivo_url: None,
        archivo_base64: Some(base64_encode(contents)),
        tipo_mime: Some("application/pdf".to_string()),
        tamano_bytes: None,
        category_id: None,
        etiquetas: Some(vec!["soporte".to_string()]),
    }
}

async fn create_doc(state: &AppState, user: (&str, &str), req: CreateRequest) -> DocumentPayload {
    let (status, Json(resp)) = documents::create(
        State(state.clone()),
        AuthUser(claims_for(user.0, user.1)),
        Json(req),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    resp.data
}

#[tokio::test]
async fn inline_upload_stores_blob_and_sizes_it() {
    let state = test_state().await;
    let owner = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    let doc = create_doc(
        &state,
        (&owner, "alice@test.com"),
        upload_req("cedula.pdf", b"pdf bytes"),
    )
    .await;

    assert_eq!(doc.tamano_bytes, Some(9));
    assert_eq!(doc.etiquetas, vec!["soporte".to_string()]);
    // The stored URL points into the local documents bucket
    let (bucket, _key) = state.blobs.parse_public_url(&doc.archivo_url).unwrap();
    assert_eq!(bucket, "documents");
}

#[tokio::test]
async fn external_url_is_accepted_without_blob() {
    let state = test_state().await;
    let owner = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    let doc = create_doc(
        &state,
        (&owner, "alice@test.com"),
        CreateRequest {
            nombre: "notas.pdf".to_string(),
            descripcion: Some("notas del trimestre".to_string()),
            archivo_url: Some("https://cdn.example.com/notas.pdf".to_string()),
            archivo_base64: None,
            tipo_mime: None,
            tamano_bytes: Some(2048),
            category_id: None,
            etiquetas: None,
        },
    )
    .await;

    assert_eq!(doc.archivo_url, "https://cdn.example.com/notas.pdf");
    assert!(state.blobs.parse_public_url(&doc.archivo_url).is_none());
}

#[tokio::test]
async fn create_requires_name_and_file() {
    let state = test_state().await;
    let owner = seed_user(&state, "alice@test.com", Role::Aprendiz).await;
    let auth = || AuthUser(claims_for(&owner, "alice@test.com"));

    let mut req = upload_req("x.pdf", b"x");
    req.nombre = String::new();
    let err = documents::create(State(state.clone()), auth(), Json(req)).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = documents::create(
        State(state.clone()),
        auth(),
        Json(CreateRequest {
            nombre: "x.pdf".to_string(),
            descripcion: None,
            archivo_url: None,
            archivo_base64: None,
            tipo_mime: None,
            tamano_bytes: None,
            category_id: None,
            etiquetas: None,
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn malformed_base64_is_a_validation_error() {
    let state = test_state().await;
    let owner = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    let mut req = upload_req("x.pdf", b"x");
    req.archivo_base64 = Some("####".to_string());
    let err = documents::create(
        State(state.clone()),
        AuthUser(claims_for(&owner, "alice@test.com")),
        Json(req),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn list_scoping_and_search() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;
    let bob = seed_user(&state, "bob@test.com", Role::Aprendiz).await;
    let staff = seed_user(&state, "funcionario@test.com", Role::Funcionario).await;

    create_doc(&state, (&alice, "alice@test.com"), upload_req("cedula.pdf", b"a")).await;
    create_doc(&state, (&alice, "alice@test.com"), upload_req("notas.pdf", b"b")).await;
    create_doc(&state, (&bob, "bob@test.com"), upload_req("cedula.pdf", b"c")).await;

    let query = |search: Option<&str>| {
        Query(ListQuery {
            category_id: None,
            search: search.map(str::to_string),
            limit: None,
            offset: None,
        })
    };

    // Non-staff see only their own
    let Json(resp) = documents::list(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        query(None),
    )
    .await
    .unwrap();
    assert_eq!(resp.count, 2);
    assert!(resp.data.iter().all(|d| d.user_id == alice));

    // Staff see everything
    let Json(resp) = documents::list(
        State(state.clone()),
        AuthUser(claims_for(&staff, "funcionario@test.com")),
        query(None),
    )
    .await
    .unwrap();
    assert_eq!(resp.count, 3);

    // Substring search
    let Json(resp) = documents::list(
        State(state.clone()),
        AuthUser(claims_for(&staff, "funcionario@test.com")),
        query(Some("cedula")),
    )
    .await
    .unwrap();
    assert_eq!(resp.count, 2);
    assert!(resp.data.iter().all(|d| d.nombre.contains("cedula")));
}

#[tokio::test]
async fn update_is_owner_only_and_needs_fields() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;
    let staff = seed_user(&state, "funcionario@test.com", Role::Funcionario).await;

    let doc = create_doc(&state, (&alice, "alice@test.com"), upload_req("cedula.pdf", b"a")).await;

    // Even staff cannot edit someone else's document metadata
    let err = documents::update(
        State(state.clone()),
        AuthUser(claims_for(&staff, "funcionario@test.com")),
        Path(doc.id.clone()),
        Json(UpdateRequest {
            nombre: Some("otro.pdf".to_string()),
            ..Default::default()
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));

    // Empty patch is rejected
    let err = documents::update(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        Path(doc.id.clone()),
        Json(UpdateRequest::default()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    // Owner patch applies
    let Json(resp) = documents::update(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        Path(doc.id.clone()),
        Json(UpdateRequest {
            nombre: Some("cedula-v2.pdf".to_string()),
            etiquetas: Some(vec!["identidad".to_string(), "v2".to_string()]),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(resp.data.nombre, "cedula-v2.pdf");
    assert_eq!(resp.data.etiquetas.len(), 2);
}

#[tokio::test]
async fn delete_removes_locally_stored_blob() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    let doc = create_doc(&state, (&alice, "alice@test.com"), upload_req("cedula.pdf", b"a")).await;
    let (bucket, key) = state.blobs.parse_public_url(&doc.archivo_url).unwrap();

    let _ = documents::delete(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        Path(doc.id.clone()),
    )
    .await
    .unwrap();

    assert!(state.db.get_document(&doc.id).await.is_err());
    // Blob already gone: a second remove reports nothing to delete
    assert!(!state.blobs.remove(&bucket, &key).await.unwrap());
}

#[tokio::test]
async fn delete_is_owner_or_admin() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;
    let staff = seed_user(&state, "funcionario@test.com", Role::Funcionario).await;
    let admin = seed_user(&state, "admin@test.com", Role::Admin).await;

    let doc = create_doc(&state, (&alice, "alice@test.com"), upload_req("cedula.pdf", b"a")).await;

    // Funcionario may view but not delete another user's document
    let err = documents::delete(
        State(state.clone()),
        AuthUser(claims_for(&staff, "funcionario@test.com")),
        Path(doc.id.clone()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));

    let _ = documents::delete(
        State(state.clone()),
        AuthUser(claims_for(&admin, "admin@test.com")),
        Path(doc.id.clone()),
    )
    .await
    .unwrap();
    assert!(state.db.get_document(&doc.id).await.is_err());
}

#[tokio::test]
async fn detail_view_is_owner_or_staff() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;
    let bob = seed_user(&state, "bob@test.com", Role::Aprendiz).await;

    let doc = create_doc(&state, (&alice, "alice@test.com"), upload_req("cedula.pdf", b"a")).await;

    let err = documents::get_one(
        State(state.clone()),
        AuthUser(claims_for(&bob, "bob@test.com")),
        Path(doc.id.clone()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));

    let err = documents::get_one(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
        Path("missing".to_string()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn categories_are_listed() {
    let state = test_state().await;
    let alice = seed_user(&state, "alice@test.com", Role::Aprendiz).await;

    let Json(resp) = documents::list_categories(
        State(state.clone()),
        AuthUser(claims_for(&alice, "alice@test.com")),
    )
    .await
    .unwrap();

    assert!(!resp.data.is_empty());
}
