// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog reader: active courses and categories.
//!
//! Every load replaces the in-memory snapshot wholesale. Detail lookups hit
//! the snapshot first and fall back to the store on a miss.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Category, Formation};
use crate::views::{EnrollAction, FormationCard, FormationDetails};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Number of cards on the home page.
pub const FEATURED_COUNT: u32 = 3;

#[derive(Clone)]
pub struct CatalogService {
    db: FirestoreDb,
    snapshot: Arc<RwLock<Vec<Formation>>>,
}

impl CatalogService {
    pub fn new(db: FirestoreDb) -> Self {
        Self {
            db,
            snapshot: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Fetch active courses (optionally capped) and replace the snapshot.
    pub async fn load_formations(&self, limit: Option<u32>) -> Result<Vec<Formation>, AppError> {
        let formations = self.db.list_active_formations(limit).await?;
        *self.snapshot.write().await = formations.clone();

        tracing::debug!(count = formations.len(), ?limit, "Catalog snapshot replaced");
        Ok(formations)
    }

    pub async fn featured_cards(&self) -> Result<Vec<FormationCard>, AppError> {
        let formations = self.load_formations(Some(FEATURED_COUNT)).await?;
        Ok(formations.iter().map(FormationCard::from).collect())
    }

    pub async fn all_cards(&self, limit: Option<u32>) -> Result<Vec<FormationCard>, AppError> {
        let formations = self.load_formations(limit).await?;
        Ok(formations.iter().map(FormationCard::from).collect())
    }

    /// Course from the snapshot, or from the store when not cached.
    pub async fn find_formation(&self, id: &str) -> Result<Option<Formation>, AppError> {
        if let Some(cached) = self
            .snapshot
            .read()
            .await
            .iter()
            .find(|f| f.id == id)
            .cloned()
        {
            return Ok(Some(cached));
        }
        self.db.get_formation(id).await
    }

    pub async fn details(&self, id: &str) -> Result<FormationDetails, AppError> {
        self.find_formation(id)
            .await?
            .map(|f| FormationDetails::from(&f))
            .ok_or_else(|| AppError::NotFound(format!("formation {}", id)))
    }

    /// What the "S'inscrire" button does for this visitor.
    pub fn enroll_action(&self, signed_in: bool, formation_id: &str) -> EnrollAction {
        EnrollAction::for_session(signed_in, formation_id)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, AppError> {
        self.db.list_categories().await
    }

    /// Drop a course from the snapshot (after an admin delete or edit).
    pub async fn invalidate(&self, id: &str) {
        self.snapshot.write().await.retain(|f| f.id != id);
    }
}
