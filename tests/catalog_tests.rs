// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public catalog routes.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use formation_portal::models::{Category, FormationStatus, Role};
use tower::ServiceExt;

mod common;
use common::{body_json, create_offline_app, create_test_app, seed_user, test_formation};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_featured_shows_three_active_courses() {
    let app = create_test_app();
    for id in ["a", "b", "c", "d"] {
        app.db.upsert_formation(&test_formation(id, 4)).await.unwrap();
    }
    let mut hidden = test_formation("hidden", 4);
    hidden.status = FormationStatus::Inactive;
    app.db.upsert_formation(&hidden).await.unwrap();

    let response = app.router.clone().oneshot(get("/api/formations/featured")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cards = body_json(response).await;
    assert_eq!(cards.as_array().unwrap().len(), 3);

    let response = app.router.clone().oneshot(get("/api/formations")).await.unwrap();
    let cards = body_json(response).await;
    assert_eq!(cards.as_array().unwrap().len(), 4);
    assert!(cards
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["id"] != "hidden"));

    let response = app.router.oneshot(get("/api/formations?limit=2")).await.unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_card_excerpt_is_truncated() {
    let app = create_test_app();
    let mut long = test_formation("long", 4);
    long.description = "é".repeat(120);
    app.db.upsert_formation(&long).await.unwrap();

    let response = app.router.oneshot(get("/api/formations")).await.unwrap();
    let cards = body_json(response).await;
    let excerpt = cards[0]["excerpt"].as_str().unwrap();
    assert_eq!(excerpt.chars().count(), 103);
    assert!(excerpt.ends_with("..."));
}

#[tokio::test]
async fn test_details_defaults() {
    let app = create_test_app();
    app.db.upsert_formation(&test_formation("web", 4)).await.unwrap();

    let response = app.router.clone().oneshot(get("/api/formations/web")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let details = body_json(response).await;
    assert_eq!(details["format"], "Présentiel/Distanciel");
    assert!(details.get("content").is_none());
    assert!(details.get("prerequisites").is_none());

    let response = app.router.oneshot(get("/api/formations/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enroll_requires_session() {
    let app = create_test_app();
    let token = seed_user(&app, "u-cat", Role::User).await;
    let enroll = |token: Option<&str>| {
        let mut builder = Request::builder().method("POST").uri("/api/formations/web/enroll");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("formation_session={}", token));
        }
        builder.body(Body::empty()).unwrap()
    };

    let response = app.router.clone().oneshot(enroll(None)).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["action"], "login_required");
    assert_eq!(body["redirect"], "login.html");

    let response = app.router.oneshot(enroll(Some(&token))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["action"], "open_wizard");
    assert_eq!(body["redirect"], "inscription.html?formation=web");
}

#[tokio::test]
async fn test_categories_carry_color_and_icon() {
    let app = create_test_app();
    app.db
        .upsert_category(&Category {
            id: "c-data".to_string(),
            name: "Data Science".to_string(),
        })
        .await
        .unwrap();

    let response = app.router.oneshot(get("/api/categories")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body[0]["id"], "c-data");
    assert_eq!(body[0]["color"], "#2ecc71");
    assert_eq!(body[0]["icon"], "fas fa-chart-bar");
}

#[tokio::test]
async fn test_store_failure_is_generic() {
    let app = create_offline_app();

    let response = app.router.oneshot(get("/api/formations")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Une erreur est survenue. Veuillez réessayer.");
}
