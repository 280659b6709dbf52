// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use formation_portal::error::AppError;
use formation_portal::services::AuthError;
use formation_portal::wizard::validation::ValidationErrors;

async fn json_of(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_auth_errors_map_status_and_message() {
    let cases = [
        ("auth/email-already-in-use", StatusCode::CONFLICT, "Cet email est déjà utilisé."),
        ("WEAK_PASSWORD : Password should be at least 6 characters", StatusCode::BAD_REQUEST, "Le mot de passe doit contenir au moins 6 caractères."),
        ("USER_DISABLED", StatusCode::FORBIDDEN, "Ce compte a été désactivé."),
        ("INVALID_LOGIN_CREDENTIALS", StatusCode::UNAUTHORIZED, "Mot de passe incorrect."),
        ("TOO_MANY_ATTEMPTS_TRY_LATER", StatusCode::TOO_MANY_REQUESTS, "Trop de tentatives. Réessayez plus tard."),
        ("auth/network-request-failed", StatusCode::BAD_GATEWAY, "Erreur réseau. Vérifiez votre connexion."),
        ("SOMETHING_NEW", StatusCode::BAD_REQUEST, "Une erreur est survenue. Veuillez réessayer."),
    ];

    for (code, status, message) in cases {
        let (got_status, body) = json_of(AppError::Auth(AuthError::from_code(code))).await;
        assert_eq!(got_status, status, "status for {}", code);
        assert_eq!(body["message"], message, "message for {}", code);
    }
}

#[tokio::test]
async fn test_validation_error_lists_fields() {
    let mut errors = ValidationErrors::new();
    errors.push("nom", "Ce champ est obligatoire");
    errors.push("email", "Email invalide");

    let (status, body) = json_of(AppError::Validation(errors)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Veuillez corriger les erreurs dans le formulaire");
    assert_eq!(body["fields"][0]["field"], "nom");
    assert_eq!(body["fields"][1]["message"], "Email invalide");
}

#[tokio::test]
async fn test_submission_error_hides_cause() {
    let (status, body) = json_of(AppError::Submission("places exhausted".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "Une erreur est survenue lors de l'inscription. Veuillez réessayer."
    );
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_storage_and_database_errors_are_generic() {
    let (status, body) = json_of(AppError::Storage("bucket gone".to_string())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Une erreur est survenue. Veuillez réessayer.");

    let (status, body) = json_of(AppError::Database("deadline exceeded".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains("deadline"));
}
