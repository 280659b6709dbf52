// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Enrollment wizard routes. Open to visitors with or without a session.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, session_cookie, MaybeAuthUser};
use crate::services::{StepRequest, WizardView};
use crate::views::UserMenu;
use crate::wizard::funding::{FundingPanel, FundingType};
use crate::wizard::validation::FieldError;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Delay before the page follows `redirect` after a successful submission.
pub const REDIRECT_AFTER_SECS: u32 = 10;

pub const SUBMISSION_SUCCESS_MESSAGE: &str =
    "Votre inscription a bien été enregistrée. Vous allez être redirigé vers votre espace.";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/inscriptions/wizard", post(start_wizard))
        .route("/api/inscriptions/wizard/{id}", get(get_wizard))
        .route("/api/inscriptions/wizard/{id}/step", post(step_wizard))
        .route("/api/inscriptions/wizard/{id}/submit", post(submit_wizard))
        .route("/api/inscriptions/validate-field", post(validate_field))
        .route("/api/inscriptions/funding/{kind}", get(funding_panel))
}

#[derive(Deserialize)]
pub struct StartParams {
    #[serde(default)]
    formation: Option<String>,
}

async fn start_wizard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StartParams>,
) -> Result<Json<WizardView>> {
    Ok(Json(
        state
            .enrollment
            .start(params.formation.as_deref().filter(|f| !f.is_empty()))
            .await?,
    ))
}

async fn get_wizard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<WizardView>> {
    Ok(Json(state.enrollment.get(&id).await?))
}

async fn step_wizard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<StepRequest>,
) -> Result<Json<WizardView>> {
    Ok(Json(state.enrollment.step(&id, request).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub inscription_id: String,
    pub message: &'static str,
    pub redirect: &'static str,
    pub redirect_after_secs: u32,
    /// Session of an account created by this submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserMenu>,
}

async fn submit_wizard(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let session_uid = user.as_ref().map(|u| u.uid.as_str());
    let outcome = state.enrollment.submit(&id, session_uid).await?;

    let mut body = SubmitResponse {
        inscription_id: outcome.inscription_id,
        message: SUBMISSION_SUCCESS_MESSAGE,
        redirect: "dashboard.html",
        redirect_after_secs: REDIRECT_AFTER_SECS,
        token: None,
        user: None,
    };

    let Some(account) = outcome.new_account else {
        return Ok(Json(body).into_response());
    };

    // The enrollment is stored; failing to mint a session must not hide that.
    match create_jwt(&account.uid, &state.config.jwt_signing_key) {
        Ok(token) => {
            let cookie = session_cookie(&token, state.config.api_url.starts_with("https://"));
            body.token = Some(token);
            body.user = Some(UserMenu::for_account(Some(&account)));
            Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, uid = %account.uid, "Session creation after enrollment failed");
            Ok(Json(body).into_response())
        }
    }
}

#[derive(Deserialize)]
pub struct FieldCheck {
    field: String,
    #[serde(default)]
    value: String,
}

#[derive(Serialize)]
pub struct FieldCheckResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FieldError>,
}

async fn validate_field(
    State(state): State<Arc<AppState>>,
    Json(check): Json<FieldCheck>,
) -> Json<FieldCheckResponse> {
    let error = state.enrollment.validate_field(&check.field, &check.value);
    Json(FieldCheckResponse {
        valid: error.is_none(),
        error,
    })
}

#[derive(Serialize)]
pub struct FundingPanelResponse {
    pub value: &'static str,
    pub label: &'static str,
    /// None for funding types without details.
    pub panel: Option<FundingPanel>,
}

async fn funding_panel(Path(kind): Path<String>) -> Result<Json<FundingPanelResponse>> {
    let kind = FundingType::parse(&kind)
        .ok_or_else(|| AppError::NotFound(format!("funding type {}", kind)))?;
    Ok(Json(FundingPanelResponse {
        value: kind.as_str(),
        label: kind.label(),
        panel: kind.detail_panel(),
    }))
}
