// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin console: dashboard figures, course management, enrollment and
//! user listings. Callers must have passed the admin gate.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Formation, FormationStatus, InscriptionStatus};
use crate::services::catalog::CatalogService;
use crate::services::storage::{upload_formation_image, BlobStorage, ImageRejected, ImageUpload};
use crate::time_utils::{now_rfc3339, start_of_month};
use crate::views::{
    format_price, ActivityItem, AdminFormationRow, ChartData, DashboardCounts, DashboardView,
    InscriptionDetail, InscriptionRow, UserRow,
};
use crate::wizard::validation::ValidationErrors;
use futures_util::future::{try_join, try_join4};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Rows in each dashboard feed.
pub const RECENT_FEED_LEN: u32 = 10;

pub const FORMATION_SAVED_MESSAGE: &str = "Formation enregistrée avec succès";
pub const FORMATION_DELETED_MESSAGE: &str = "Formation supprimée avec succès";

fn default_status() -> FormationStatus {
    FormationStatus::Active
}

/// Fields of the course modal, top to bottom.
const FORM_ORDER: &[&str] = &["title", "category", "description", "duration", "places", "price"];

/// Course form of the admin modal.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FormationInput {
    #[validate(length(min = 1, message = "Ce champ est obligatoire"))]
    pub title: String,
    #[validate(length(min = 1, message = "Ce champ est obligatoire"))]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Hours
    #[validate(range(min = 1, message = "La durée doit être d'au moins une heure"))]
    pub duration: u32,
    #[validate(range(min = 0, message = "Le nombre de places ne peut pas être négatif"))]
    pub places: i64,
    #[validate(range(min = 0.0, message = "Le prix ne peut pas être négatif"))]
    pub price: f64,
    #[serde(default = "default_status")]
    pub status: FormationStatus,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub prerequisites: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

impl FormationInput {
    fn normalized(mut self) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.title = self.title.trim().to_string();
        self.category = self.category.trim().to_string();
        self.description = self.description.trim().to_string();
        self.content = clean(self.content);
        self.prerequisites = clean(self.prerequisites);
        self.format = clean(self.format);
        self
    }
}

/// Entry of the admin category select; the value is the category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

#[derive(Clone)]
pub struct AdminService {
    db: FirestoreDb,
    storage: Arc<dyn BlobStorage>,
    catalog: CatalogService,
}

impl AdminService {
    pub fn new(db: FirestoreDb, storage: Arc<dyn BlobStorage>, catalog: CatalogService) -> Self {
        Self {
            db,
            storage,
            catalog,
        }
    }

    /// Dashboard figures. The four counters load concurrently.
    pub async fn dashboard(&self) -> Result<DashboardView, AppError> {
        let since = start_of_month(chrono::Utc::now());

        let (active_formations, inscriptions, users, payments) = try_join4(
            self.db.count_active_formations(),
            self.db.count_inscriptions(),
            self.db.count_users(),
            self.db.completed_payments_since(since),
        )
        .await?;

        let revenue: f64 = payments.iter().map(|p| p.amount).sum();

        let (recent_inscriptions, recent_activity) = try_join(
            self.db.list_inscriptions(Some(RECENT_FEED_LEN)),
            self.db.recent_activity(RECENT_FEED_LEN),
        )
        .await?;

        tracing::debug!(
            active_formations,
            inscriptions,
            users,
            revenue,
            "Dashboard computed"
        );

        Ok(DashboardView {
            counts: DashboardCounts {
                active_formations,
                inscriptions,
                users,
                revenue,
                revenue_text: format!("{}€", format_price(revenue)),
            },
            recent_inscriptions: recent_inscriptions.iter().map(InscriptionRow::from).collect(),
            recent_activity: recent_activity.iter().map(ActivityItem::from).collect(),
            chart: ChartData::category_split(),
        })
    }

    // ─── Courses ─────────────────────────────────────────────────

    pub async fn list_formations(&self) -> Result<Vec<AdminFormationRow>, AppError> {
        let formations = self.db.list_formations().await?;
        Ok(formations.iter().map(AdminFormationRow::from).collect())
    }

    pub async fn category_options(&self) -> Result<Vec<CategoryOption>, AppError> {
        let categories = self.db.list_categories().await?;
        Ok(categories
            .into_iter()
            .map(|c| CategoryOption {
                value: c.name.clone(),
                label: c.name,
            })
            .collect())
    }

    async fn upload_image(&self, input: &FormationInput) -> Result<Option<String>, AppError> {
        match &input.image {
            Some(upload) => upload_formation_image(self.storage.as_ref(), upload)
                .await
                .map(Some)
                .map_err(|e| {
                    if let Some(rejected) = e.downcast_ref::<ImageRejected>() {
                        AppError::BadRequest(rejected.to_string())
                    } else {
                        AppError::Storage(format!("{:#}", e))
                    }
                }),
            None => Ok(None),
        }
    }

    fn validate(input: FormationInput) -> Result<FormationInput, AppError> {
        let input = input.normalized();
        input
            .validate()
            .map_err(|e| AppError::Validation(ValidationErrors::from_validator(e, FORM_ORDER)))?;
        Ok(input)
    }

    /// Validate, upload the image if any, then write a new course.
    pub async fn create_formation(&self, input: FormationInput) -> Result<Formation, AppError> {
        let input = Self::validate(input)?;
        let image_url = self.upload_image(&input).await?;
        let now = now_rfc3339();

        let formation = Formation {
            id: uuid::Uuid::new_v4().simple().to_string(),
            title: input.title,
            category: input.category,
            description: input.description,
            duration: input.duration,
            places: input.places,
            price: input.price,
            status: input.status,
            image_url,
            content: input.content,
            prerequisites: input.prerequisites,
            format: input.format,
            inscription_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.upsert_formation(&formation).await?;
        tracing::info!(formation_id = %formation.id, title = %formation.title, "Formation created");
        Ok(formation)
    }

    /// Replace the editable fields of a course.
    ///
    /// The enrollment counter, creation date and image (unless a new one is
    /// sent) are kept.
    pub async fn update_formation(
        &self,
        id: &str,
        input: FormationInput,
    ) -> Result<Formation, AppError> {
        let input = Self::validate(input)?;
        let existing = self
            .db
            .get_formation(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("formation {}", id)))?;

        let image_url = match self.upload_image(&input).await? {
            Some(url) => Some(url),
            None => existing.image_url.clone(),
        };

        let formation = Formation {
            id: existing.id,
            title: input.title,
            category: input.category,
            description: input.description,
            duration: input.duration,
            places: input.places,
            price: input.price,
            status: input.status,
            image_url,
            content: input.content,
            prerequisites: input.prerequisites,
            format: input.format,
            inscription_count: existing.inscription_count,
            created_at: existing.created_at,
            updated_at: now_rfc3339(),
        };

        self.db.upsert_formation(&formation).await?;
        self.catalog.invalidate(id).await;
        tracing::info!(formation_id = id, "Formation updated");
        Ok(formation)
    }

    /// Hard delete, with no check for existing enrollments.
    pub async fn delete_formation(&self, id: &str) -> Result<(), AppError> {
        if !self.db.delete_formation(id).await? {
            return Err(AppError::NotFound(format!("formation {}", id)));
        }
        self.catalog.invalidate(id).await;
        tracing::info!(formation_id = id, "Formation deleted");
        Ok(())
    }

    // ─── Enrollments & users ─────────────────────────────────────

    pub async fn list_inscriptions(&self) -> Result<Vec<InscriptionRow>, AppError> {
        let inscriptions = self.db.list_inscriptions(None).await?;
        Ok(inscriptions.iter().map(InscriptionRow::from).collect())
    }

    pub async fn inscription(&self, id: &str) -> Result<InscriptionDetail, AppError> {
        self.db
            .get_inscription(id)
            .await?
            .map(|i| InscriptionDetail::from(&i))
            .ok_or_else(|| AppError::NotFound(format!("inscription {}", id)))
    }

    pub async fn update_inscription_status(
        &self,
        id: &str,
        status: &str,
    ) -> Result<InscriptionDetail, AppError> {
        let status = InscriptionStatus::parse(status)
            .ok_or_else(|| AppError::BadRequest(format!("unknown status {}", status)))?;

        let mut inscription = self
            .db
            .get_inscription(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("inscription {}", id)))?;

        inscription.statut = status;
        inscription.updated_at = now_rfc3339();
        self.db.update_inscription(&inscription).await?;

        tracing::info!(inscription_id = id, status = status.as_str(), "Inscription status changed");
        Ok(InscriptionDetail::from(&inscription))
    }

    pub async fn list_users(&self) -> Result<Vec<UserRow>, AppError> {
        let users = self.db.list_users().await?;
        Ok(users.iter().map(UserRow::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStorage;
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    fn input(title: &str) -> FormationInput {
        FormationInput {
            title: title.to_string(),
            category: "Management".to_string(),
            description: "Piloter une équipe".to_string(),
            duration: 30,
            places: 10,
            price: 800.0,
            status: FormationStatus::Active,
            content: Some("  ".to_string()),
            prerequisites: None,
            format: None,
            image: None,
        }
    }

    fn service() -> (AdminService, FirestoreDb, Arc<MemoryStorage>) {
        let db = FirestoreDb::new_in_memory();
        let storage = Arc::new(MemoryStorage::new());
        let admin = AdminService::new(db.clone(), storage.clone(), CatalogService::new(db.clone()));
        (admin, db, storage)
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let (admin, _, _) = service();
        let err = admin.create_formation(input("   ")).await.unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("title"));

        let mut blank = input("");
        blank.category = String::new();
        blank.duration = 0;
        let AppError::Validation(errors) = admin.create_formation(blank).await.unwrap_err() else {
            panic!("expected validation error");
        };
        let fields: Vec<_> = errors.into_fields().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "category", "duration"]);
    }

    #[tokio::test]
    async fn test_create_with_image() {
        let (admin, db, storage) = service();
        let mut with_image = input("Leadership");
        with_image.image = Some(ImageUpload {
            file_name: "team.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            data: STANDARD.encode(b"jpeg"),
        });

        let created = admin.create_formation(with_image).await.unwrap();

        let stored = db.get_formation(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.inscription_count, 0);
        assert_eq!(stored.content, None);
        let url = stored.image_url.unwrap();
        assert!(url.starts_with("memory://formations/") && url.ends_with("_team.jpg"));
        assert_eq!(storage.keys().len(), 1);
    }

    #[tokio::test]
    async fn test_image_without_file_name_is_bad_request() {
        let (admin, db, storage) = service();
        let mut with_image = input("Leadership");
        with_image.image = Some(ImageUpload {
            file_name: "photos/".to_string(),
            content_type: None,
            data: STANDARD.encode(b"jpeg"),
        });

        let err = admin.create_formation(with_image).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(storage.keys().is_empty());
        assert!(db.list_formations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_counters_and_image() {
        let (admin, db, _) = service();
        let created = admin.create_formation(input("Agilité")).await.unwrap();

        let mut taken = db.get_formation(&created.id).await.unwrap().unwrap();
        taken.inscription_count = 4;
        taken.image_url = Some("https://cdn/old.png".to_string());
        db.upsert_formation(&taken).await.unwrap();

        let mut edit = input("Agilité avancée");
        edit.places = 2;
        let updated = admin.update_formation(&created.id, edit).await.unwrap();

        assert_eq!(updated.title, "Agilité avancée");
        assert_eq!(updated.inscription_count, 4);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.image_url.as_deref(), Some("https://cdn/old.png"));
    }

    #[tokio::test]
    async fn test_delete_unknown_reports_not_found() {
        let (admin, _, _) = service();
        let created = admin.create_formation(input("Scrum")).await.unwrap();

        admin.delete_formation(&created.id).await.unwrap();
        assert!(matches!(
            admin.delete_formation(&created.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dashboard_on_empty_store() {
        let (admin, _, _) = service();
        let view = admin.dashboard().await.unwrap();
        assert_eq!(view.counts.active_formations, 0);
        assert_eq!(view.counts.revenue_text, "0€");
        assert_eq!(view.chart.values, vec![30, 20, 15, 20, 15]);
    }

    #[tokio::test]
    async fn test_status_update_rejects_unknown_value() {
        let (admin, _, _) = service();
        assert!(matches!(
            admin.update_inscription_status("i1", "archived").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            admin.update_inscription_status("i1", "confirmed").await,
            Err(AppError::NotFound(_))
        ));
    }
}
