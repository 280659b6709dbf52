// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes: the "current user" menu and the signed-in profile.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::services::Account;
use crate::views::UserMenu;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;

/// Routes open to everyone.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/session", get(get_session))
}

/// Routes behind the auth middleware (applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me))
}

/// Menu for the caller. A session whose profile is gone still renders as
/// signed in, with the default name and avatar.
async fn get_session(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> Result<Json<UserMenu>> {
    let Some(user) = user else {
        return Ok(Json(UserMenu::for_account(None)));
    };

    let account = match state.auth.profile(&user.uid).await? {
        Some(profile) => Account::from_profile(&profile),
        None => Account {
            uid: user.uid,
            email: String::new(),
            display_name: None,
            photo_url: None,
        },
    };
    Ok(Json(UserMenu::for_account(Some(&account))))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub uid: String,
    pub email: String,
    pub prenom: String,
    pub nom: String,
    pub display_name: String,
    pub is_admin: bool,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let profile = state
        .auth
        .profile(&user.uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.uid)))?;

    Ok(Json(MeResponse {
        display_name: profile.display_name(),
        is_admin: profile.is_admin(),
        uid: profile.uid,
        email: profile.email,
        prenom: profile.prenom,
        nom: profile.nom,
    }))
}
