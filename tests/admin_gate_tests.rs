// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin console: the role gate and course/enrollment management.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use formation_portal::db::collections;
use formation_portal::models::{Category, Role};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{
    body_json, create_expired_test_jwt, create_offline_app, create_test_app, seed_formation, seed_user,
    TestApp,
};

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn course_input(title: &str) -> Value {
    json!({
        "title": title,
        "category": "Cybersécurité",
        "description": "Les fondamentaux de la sécurité offensive.",
        "duration": 21,
        "places": 12,
        "price": 1500,
        "status": "active"
    })
}

#[tokio::test]
async fn test_dashboard_without_session_redirects_to_login() {
    let app = create_test_app();
    let (status, body) = call(&app, request("GET", "/api/admin/dashboard", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "login.html");
}

#[tokio::test]
async fn test_stale_session_redirects_to_login() {
    let app = create_test_app();
    seed_user(&app, "u-admin", Role::Admin).await;
    let expired = create_expired_test_jwt("u-admin", &app.state.config.jwt_signing_key);

    for token in [expired.as_str(), "not-a-jwt"] {
        let (status, body) = call(&app, request("GET", "/api/admin/dashboard", Some(token), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["redirect"], "login.html");
    }
}

#[tokio::test]
async fn test_dashboard_denied_to_regular_user() {
    let app = create_test_app();
    let token = seed_user(&app, "u-regular", Role::User).await;

    let (status, body) = call(&app, request("GET", "/api/admin/dashboard", Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "Accès refusé. Seuls les administrateurs peuvent accéder à cette page."
    );
    assert_eq!(body["redirect"], "index.html");
}

#[tokio::test]
async fn test_session_without_profile_is_denied() {
    let app = create_test_app();
    let token = common::create_test_jwt("ghost", &app.state.config.jwt_signing_key);
    let (status, _) = call(&app, request("GET", "/api/admin/users", Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_gate_never_reaches_handler_when_store_is_down() {
    // With the store offline the gate cannot load a profile: that must fail
    // closed, never fall through to the dashboard.
    let app = create_offline_app();
    let token = common::create_test_jwt("u-admin", &app.state.config.jwt_signing_key);
    let (status, _) = call(&app, request("GET", "/api/admin/dashboard", Some(&token), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_dashboard_for_admin() {
    let app = create_test_app();
    let token = seed_user(&app, "u-admin", Role::Admin).await;
    seed_formation(&app.db, "a", 3).await;

    let (status, body) = call(&app, request("GET", "/api/admin/dashboard", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["activeFormations"], 1);
    assert_eq!(body["counts"]["users"], 1);
    assert_eq!(body["counts"]["revenueText"], "0€");
    assert_eq!(body["chart"]["labels"][0], "Développement");
}

#[tokio::test]
async fn test_dashboard_survives_old_and_broken_enrollments() {
    let app = create_test_app();
    let token = seed_user(&app, "u-admin", Role::Admin).await;

    // Layout written by the previous site: form sections spread flat.
    app.store
        .set(
            collections::INSCRIPTIONS,
            "legacy1",
            &json!({
                "nom": "Durand",
                "prenom": "Paul",
                "email": "paul@example.fr",
                "telephone": "0611223344",
                "id": "rust-101",
                "titre": "Rust 101",
                "mode": "distanciel",
                "session": "2026-11",
                "type": "personnel",
                "userId": "anonymous",
                "statut": "pending",
                "createdAt": "2025-03-01T09:00:00Z"
            }),
        )
        .await
        .unwrap();
    app.store
        .set(collections::INSCRIPTIONS, "broken", &json!({"statut": 3}))
        .await
        .unwrap();

    let (status, body) = call(&app, request("GET", "/api/admin/dashboard", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["inscriptions"], 2);
    let recent = body["recentInscriptions"].as_array().unwrap();
    assert_eq!(recent.len(), 1);

    let (status, list) = call(&app, request("GET", "/api/admin/inscriptions", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_revenue_counts_completed_payments_this_month() {
    let app = create_test_app();
    let token = seed_user(&app, "u-admin", Role::Admin).await;
    let this_month = chrono::Utc::now().to_rfc3339();
    for (id, status, amount, date) in [
        ("p1", "completed", json!(120), this_month.as_str()),
        ("p2", "completed", json!("80.5"), this_month.as_str()),
        ("p3", "pending", json!(500), this_month.as_str()),
        ("p4", "completed", json!(999), "2001-01-01T00:00:00Z"),
    ] {
        app.store
            .set(
                collections::PAYMENTS,
                id,
                &json!({"status": status, "amount": amount, "date": date}),
            )
            .await
            .unwrap();
    }

    let (status, body) = call(&app, request("GET", "/api/admin/dashboard", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["revenueText"], "200.5€");
}

#[tokio::test]
async fn test_course_lifecycle() {
    let app = create_test_app();
    let token = seed_user(&app, "u-admin", Role::Admin).await;

    let mut input = course_input("Pentest");
    input["image"] = json!({"fileName": "cadenas.png", "data": STANDARD.encode(b"png")});
    let (status, body) = call(&app, request("POST", "/api/admin/formations", Some(&token), Some(input))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Formation enregistrée avec succès");
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(app.storage.keys().len(), 1);

    // Visible in the public catalog.
    let (_, cards) = call(&app, request("GET", "/api/formations", None, None)).await;
    assert_eq!(cards.as_array().unwrap().len(), 1);

    let mut edit = course_input("Pentest avancé");
    edit["status"] = json!("inactive");
    let (status, body) = call(
        &app,
        request("PUT", &format!("/api/admin/formations/{}", id), Some(&token), Some(edit)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["formation"]["statusLabel"], "Inactif");
    let stored = app.db.get_formation(&id).await.unwrap().unwrap();
    assert!(stored.image_url.unwrap().starts_with("memory://formations/"));

    let (status, body) = call(
        &app,
        request("DELETE", &format!("/api/admin/formations/{}", id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Formation supprimée avec succès");

    let (status, _) = call(&app, request("GET", &format!("/api/formations/{}", id), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        request("DELETE", &format!("/api/admin/formations/{}", id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_course_input_is_validated() {
    let app = create_test_app();
    let token = seed_user(&app, "u-admin", Role::Admin).await;

    let mut input = course_input("");
    input["duration"] = json!(0);
    let (status, body) = call(&app, request("POST", "/api/admin/formations", Some(&token), Some(input))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "duration"]);
    assert!(app.db.list_formations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_image_upload_needs_a_file_name() {
    let app = create_test_app();
    let token = seed_user(&app, "u-admin", Role::Admin).await;

    for file_name in ["", "photos/"] {
        let mut input = course_input("Sécurité");
        input["image"] = json!({"fileName": file_name, "data": STANDARD.encode(b"png")});
        let (status, _) = call(&app, request("POST", "/api/admin/formations", Some(&token), Some(input))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
    assert!(app.db.list_formations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_category_options_use_names() {
    let app = create_test_app();
    let token = seed_user(&app, "u-admin", Role::Admin).await;
    app.db
        .upsert_category(&Category {
            id: "c1".to_string(),
            name: "Marketing".to_string(),
        })
        .await
        .unwrap();

    let (_, body) = call(&app, request("GET", "/api/admin/categories", Some(&token), None)).await;
    assert_eq!(body[0]["value"], "Marketing");
    assert_eq!(body[0]["label"], "Marketing");
}

#[tokio::test]
async fn test_inscription_status_update() {
    let app = create_test_app();
    let admin = seed_user(&app, "u-admin", Role::Admin).await;
    seed_formation(&app.db, "web", 2).await;

    // Enroll through the wizard to get a real inscription.
    let (_, view) = call(&app, request("POST", "/api/inscriptions/wizard", None, Some(json!({})))).await;
    let id = view["id"].as_str().unwrap().to_string();
    let step = format!("/api/inscriptions/wizard/{}/step", id);
    for body in [
        json!({"target": 2, "personal": {"nom": "Petit", "prenom": "Jules", "email": "jules@example.fr", "telephone": "0701020304"}}),
        json!({"target": 3, "course": {"formation": "web", "mode": "distanciel", "session": "2026-12-01"}}),
        json!({"target": 4, "funding": {"financement": "personnel"}}),
    ] {
        let (status, _) = call(&app, request("POST", &step, None, Some(body))).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, submitted) = call(
        &app,
        request("POST", &format!("/api/inscriptions/wizard/{}/submit", id), None, Some(json!({}))),
    )
    .await;
    let inscription_id = submitted["inscriptionId"].as_str().unwrap().to_string();

    let (_, rows) = call(&app, request("GET", "/api/admin/inscriptions", Some(&admin), None)).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["statusLabel"], "En attente");

    let (status, detail) = call(
        &app,
        request(
            "PUT",
            &format!("/api/admin/inscriptions/{}/status", inscription_id),
            Some(&admin),
            Some(json!({"statut": "confirmed"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["statut"], "confirmed");

    let stored = app.db.get_inscription(&inscription_id).await.unwrap().unwrap();
    assert_eq!(stored.statut.as_str(), "confirmed");

    let (_, users) = call(&app, request("GET", "/api/admin/users", Some(&admin), None)).await;
    assert_eq!(users.as_array().unwrap().len(), 2);
}
