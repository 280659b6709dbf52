// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public catalog routes.

use crate::error::Result;
use crate::middleware::auth::MaybeAuthUser;
use crate::models::category::{category_color, category_icon};
use crate::views::{EnrollAction, FormationCard, FormationDetails};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/formations", get(list_formations))
        .route("/api/formations/featured", get(featured_formations))
        .route("/api/formations/{id}", get(formation_details))
        .route("/api/formations/{id}/enroll", post(enroll))
        .route("/api/categories", get(list_categories))
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    limit: Option<u32>,
}

async fn list_formations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<FormationCard>>> {
    Ok(Json(state.catalog.all_cards(params.limit).await?))
}

async fn featured_formations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FormationCard>>> {
    Ok(Json(state.catalog.featured_cards().await?))
}

async fn formation_details(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<FormationDetails>> {
    Ok(Json(state.catalog.details(&id).await?))
}

/// "S'inscrire" from the details modal.
async fn enroll(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(id): Path<String>,
) -> Json<EnrollAction> {
    Json(state.catalog.enroll_action(user.is_some(), &id))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
}

async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = state.catalog.categories().await?;
    Ok(Json(
        categories
            .into_iter()
            .map(|c| CategoryResponse {
                color: category_color(&c.name).to_string(),
                icon: category_icon(&c.name).to_string(),
                id: c.id,
                name: c.name,
            })
            .collect(),
    ))
}
