// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: email/password, Google OAuth, logout, password reset.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_session_cookie, create_jwt, session_cookie, MaybeAuthUser};
use crate::routes::is_allowed_origin;
use crate::services::Account;
use crate::views::UserMenu;
use crate::wizard::validation::{ValidationErrors, REQUIRED_MESSAGE};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Signed OAuth states older than this are refused.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/google", get(google_start))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/logout", post(logout).get(logout))
        .route("/auth/password-reset", post(password_reset))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    email: String,
    password: String,
    #[serde(default)]
    prenom: String,
    #[serde(default)]
    nom: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    email: String,
}

/// Body of every successful sign-in: the token and the re-rendered menu.
#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserMenu,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub redirect: &'static str,
    pub user: UserMenu,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub const PASSWORD_RESET_SENT_MESSAGE: &str =
    "Un email de réinitialisation a été envoyé à votre adresse.";

fn is_secure(state: &AppState) -> bool {
    state.config.api_url.starts_with("https://")
}

/// Issue a session for `account`: JWT in the body and in the cookie.
pub(crate) fn session_response(state: &AppState, account: &Account) -> Result<Response> {
    let token = create_jwt(&account.uid, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let cookie = session_cookie(&token, is_secure(state));

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            token,
            user: UserMenu::for_account(Some(account)),
        }),
    )
        .into_response())
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response> {
    let mut errors = ValidationErrors::new();
    for (field, value) in [
        ("prenom", &req.prenom),
        ("nom", &req.nom),
        ("email", &req.email),
        ("password", &req.password),
    ] {
        if value.trim().is_empty() {
            errors.push(field, REQUIRED_MESSAGE);
        }
    }
    errors.into_result().map_err(AppError::Validation)?;

    let account = state
        .auth
        .register(req.email.trim(), &req.password, req.prenom.trim(), req.nom.trim())
        .await?;
    session_response(&state, &account)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    let account = state.auth.login(req.email.trim(), &req.password).await?;
    session_response(&state, &account)
}

async fn logout(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> impl IntoResponse {
    if let Some(user) = user {
        state.auth.logout(&user.uid);
    }
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(LogoutResponse {
            redirect: "index.html",
            user: UserMenu::for_account(None),
        }),
    )
}

async fn password_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>> {
    if req.email.trim().is_empty() {
        return Err(AppError::Validation(ValidationErrors::single(
            "email",
            REQUIRED_MESSAGE,
        )));
    }
    state.auth.reset_password(&req.email).await?;
    Ok(Json(MessageResponse {
        message: PASSWORD_RESET_SENT_MESSAGE,
    }))
}

// ─── Google OAuth ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GoogleStartParams {
    /// Frontend URL to come back to. Defaults to FRONTEND_URL.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Where to land after sign-in. Only the site's own origins are honored.
fn return_url(frontend_url: &str, requested: Option<String>) -> String {
    match requested {
        Some(url) if is_allowed_origin(frontend_url, &url) => url,
        Some(url) => {
            tracing::warn!(redirect_uri = %url, "Ignoring sign-in redirect to foreign origin");
            frontend_url.to_string()
        }
        None => frontend_url.to_string(),
    }
}

fn callback_url(state: &AppState) -> String {
    format!(
        "{}/auth/google/callback",
        state.config.api_url.trim_end_matches('/')
    )
}

fn unix_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

async fn google_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GoogleStartParams>,
) -> Result<Redirect> {
    let frontend_url = return_url(&state.config.frontend_url, params.redirect_uri);

    let oauth_state = sign_state(&frontend_url, unix_millis()?, &state.config.oauth_state_key)?;
    let auth_url = state
        .google_oauth
        .authorize_url(&callback_url(&state), &oauth_state);

    tracing::info!(frontend_url = %frontend_url, "Starting Google sign-in");
    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct GoogleCallbackParams {
    #[serde(default)]
    code: Option<String>,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GoogleCallbackParams>,
) -> Result<Response> {
    let frontend_url = verify_and_decode_state(
        &params.state,
        &state.config.oauth_state_key,
        unix_millis()?,
    )
    .ok_or_else(|| AppError::BadRequest("invalid OAuth state".to_string()))?;
    let frontend_url = frontend_url.trim_end_matches('/').to_string();

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Google sign-in cancelled or refused");
        let redirect = format!(
            "{}/login.html?error={}",
            frontend_url,
            urlencoding::encode(&error)
        );
        return Ok(Redirect::temporary(&redirect).into_response());
    }
    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;

    let id_token = state
        .google_oauth
        .exchange_code(&code, &callback_url(&state))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Google code exchange failed");
            AppError::Internal(e)
        })?;

    let account = state.auth.login_federated(&id_token).await?;

    let token = create_jwt(&account.uid, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, is_secure(&state)))],
        Redirect::temporary(&format!("{}/index.html", frontend_url)),
    )
        .into_response())
}

/// Build the OAuth `state`: base64url("frontend_url|millis_hex|hmac_hex").
fn sign_state(frontend_url: &str, now_millis: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", frontend_url, now_millis);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Check the state signature and age; returns the frontend URL it carries.
fn verify_and_decode_state(state: &str, secret: &[u8], now_millis: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // The URL itself may contain '|', so split from the right.
    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let frontend_url = parts.next()?;

    let payload = format!("{}|{}", frontend_url, timestamp_hex);
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch");
        return None;
    }

    let issued = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_millis.saturating_sub(issued) > STATE_MAX_AGE_MS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(frontend_url.to_string())
}
