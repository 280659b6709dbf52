// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin console routes.
//! The admin gate is applied in routes/mod.rs for all of these.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::Formation;
use crate::services::admin::{FORMATION_DELETED_MESSAGE, FORMATION_SAVED_MESSAGE};
use crate::services::{CategoryOption, FormationInput};
use crate::views::{AdminFormationRow, DashboardView, InscriptionDetail, InscriptionRow, UserRow};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/dashboard", get(dashboard))
        .route(
            "/api/admin/formations",
            get(list_formations).post(create_formation),
        )
        .route(
            "/api/admin/formations/{id}",
            put(update_formation).delete(delete_formation),
        )
        .route("/api/admin/categories", get(category_options))
        .route("/api/admin/inscriptions", get(list_inscriptions))
        .route("/api/admin/inscriptions/{id}", get(get_inscription))
        .route(
            "/api/admin/inscriptions/{id}/status",
            put(update_inscription_status),
        )
        .route("/api/admin/users", get(list_users))
}

async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<DashboardView>> {
    Ok(Json(state.admin.dashboard().await?))
}

// ─── Courses ─────────────────────────────────────────────────

async fn list_formations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminFormationRow>>> {
    Ok(Json(state.admin.list_formations().await?))
}

/// Saved course plus the toast to show.
#[derive(Serialize)]
pub struct FormationSaved {
    pub id: String,
    pub formation: AdminFormationRow,
    pub message: &'static str,
}

impl FormationSaved {
    fn new(formation: &Formation) -> Self {
        Self {
            id: formation.id.clone(),
            formation: AdminFormationRow::from(formation),
            message: FORMATION_SAVED_MESSAGE,
        }
    }
}

async fn create_formation(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Json(input): Json<FormationInput>,
) -> Result<(StatusCode, Json<FormationSaved>)> {
    let formation = state.admin.create_formation(input).await?;
    tracing::info!(admin = %admin.uid, formation_id = %formation.id, "Admin created formation");
    Ok((StatusCode::CREATED, Json(FormationSaved::new(&formation))))
}

async fn update_formation(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(input): Json<FormationInput>,
) -> Result<Json<FormationSaved>> {
    let formation = state.admin.update_formation(&id, input).await?;
    tracing::info!(admin = %admin.uid, formation_id = %id, "Admin updated formation");
    Ok(Json(FormationSaved::new(&formation)))
}

#[derive(Serialize)]
pub struct FormationDeleted {
    pub message: &'static str,
}

async fn delete_formation(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<FormationDeleted>> {
    state.admin.delete_formation(&id).await?;
    tracing::info!(admin = %admin.uid, formation_id = %id, "Admin deleted formation");
    Ok(Json(FormationDeleted {
        message: FORMATION_DELETED_MESSAGE,
    }))
}

async fn category_options(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryOption>>> {
    Ok(Json(state.admin.category_options().await?))
}

// ─── Enrollments & users ─────────────────────────────────────

async fn list_inscriptions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<InscriptionRow>>> {
    Ok(Json(state.admin.list_inscriptions().await?))
}

async fn get_inscription(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<InscriptionDetail>> {
    Ok(Json(state.admin.inscription(&id).await?))
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    #[serde(alias = "status")]
    statut: String,
}

async fn update_inscription_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<InscriptionDetail>> {
    Ok(Json(
        state
            .admin
            .update_inscription_status(&id, &update.statut)
            .await?,
    ))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserRow>>> {
    Ok(Json(state.admin.list_users().await?))
}
