// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session tokens and the auth/admin gates.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie holding the session JWT.
pub const SESSION_COOKIE: &str = "formation_session";

/// Sessions persist across browser restarts until sign-out.
pub const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity provider uid)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
}

/// Session of the caller if there is a valid one. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let user = session_token(&jar, &parts.headers)
            .and_then(|token| verify_jwt(&token, &state.config.jwt_signing_key).ok())
            .map(|claims| AuthUser { uid: claims.sub });
        Ok(MaybeAuthUser(user))
    }
}

/// Token from the session cookie, else from a bearer header.
fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
}

fn authenticate(state: &AppState, jar: &CookieJar, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    let token = session_token(jar, headers).ok_or(AppError::Unauthorized)?;
    let claims = verify_jwt(&token, &state.config.jwt_signing_key)?;
    if claims.sub.is_empty() {
        return Err(AppError::InvalidToken);
    }
    Ok(AuthUser { uid: claims.sub })
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, &jar, request.headers())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Admin gate: a valid session whose profile carries the admin role.
///
/// No usable session (missing, expired or forged token) yields 401 with the
/// login redirect, a non-admin profile 403.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, &jar, request.headers()).map_err(|e| match e {
        AppError::InvalidToken => {
            tracing::debug!("Admin page requested with an unusable session token");
            AppError::Unauthorized
        }
        other => other,
    })?;

    let is_admin = state
        .auth
        .profile(&user.uid)
        .await?
        .is_some_and(|profile| profile.is_admin());

    if !is_admin {
        tracing::warn!(uid = %user.uid, "Admin access denied");
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(uid: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: uid.to_string(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly{}; SameSite=Lax",
        SESSION_COOKIE, token, SESSION_TTL_SECS, secure_flag
    )
}

/// `Set-Cookie` value that clears the session.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", SESSION_COOKIE)
}
