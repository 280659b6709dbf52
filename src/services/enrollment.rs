// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Enrollment wizard drafts and submission.
//!
//! Drafts live in memory only, keyed by a random id handed to the page.
//! Submission creates an account when the visitor has no session, then
//! stores the enrollment and takes a place in one transaction.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{CourseChoice, Formation, FundingDetails, Inscription, InscriptionStatus, PersonalInfo};
use crate::services::auth::{Account, AuthGateway};
use crate::time_utils::now_rfc3339;
use crate::views::{CourseOption, SelectedFormationCard};
use crate::wizard::funding::FundingType;
use crate::wizard::validation::{validate_single_field, FieldError};
use crate::wizard::{CourseForm, FundingForm, PersonalForm, Step, StepForm, Summary, TransitionError, Wizard};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Drafts untouched for longer than this are dropped.
pub const DRAFT_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Open drafts kept at most; starting one more evicts the least recently used.
pub const MAX_DRAFTS: usize = 10_000;

struct Draft {
    wizard: Wizard,
    /// Account created by an earlier failed submission, reused on retry
    created_account: Option<Account>,
    submitting: bool,
    touched: Instant,
}

impl Draft {
    fn new(wizard: Wizard) -> Self {
        Self {
            wizard,
            created_account: None,
            submitting: false,
            touched: Instant::now(),
        }
    }
}

/// Body of a step change: the target step and the fields of the current one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StepRequest {
    pub target: u8,
    pub personal: Option<PersonalForm>,
    pub course: Option<CourseForm>,
    pub funding: Option<FundingForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundingOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Wizard state as rendered by the enrollment page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub id: String,
    pub step: u8,
    pub step_label: &'static str,
    pub total_steps: u8,
    pub course_options: Vec<CourseOption>,
    pub selected_formation_id: Option<String>,
    pub selected_formation: Option<SelectedFormationCard>,
    pub funding_options: Vec<FundingOption>,
    pub personal: Option<PersonalInfo>,
    pub course: Option<CourseChoice>,
    pub funding: Option<FundingDetails>,
    pub summary: Option<Summary>,
}

/// Successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub inscription_id: String,
    /// Set when the submission created the account; the caller signs it in.
    pub new_account: Option<Account>,
}

#[derive(Clone)]
pub struct EnrollmentService {
    db: FirestoreDb,
    auth: AuthGateway,
    drafts: Arc<DashMap<String, Draft>>,
    max_drafts: usize,
}

impl EnrollmentService {
    pub fn new(db: FirestoreDb, auth: AuthGateway) -> Self {
        Self {
            db,
            auth,
            drafts: Arc::new(DashMap::new()),
            max_drafts: MAX_DRAFTS,
        }
    }

    pub fn with_draft_limit(mut self, max_drafts: usize) -> Self {
        self.max_drafts = max_drafts.max(1);
        self
    }

    /// Open a wizard, preselecting `formation` when it is an active course.
    pub async fn start(&self, formation: Option<&str>) -> Result<WizardView, AppError> {
        self.prune_stale(DRAFT_TTL);

        let courses = self.db.list_active_formations(None).await?;
        let wizard = match formation {
            Some(id) if courses.iter().any(|f| f.id == id) => Wizard::with_preselected(id),
            Some(id) => {
                tracing::debug!(formation_id = id, "Ignoring preselection of unknown course");
                Wizard::new()
            }
            None => Wizard::new(),
        };

        let id = uuid::Uuid::new_v4().to_string();
        let view = render(&id, &wizard, &courses);
        self.make_room();
        self.drafts.insert(id.clone(), Draft::new(wizard));

        tracing::info!(wizard_id = %id, "Enrollment wizard started");
        Ok(view)
    }

    pub async fn get(&self, id: &str) -> Result<WizardView, AppError> {
        let courses = self.db.list_active_formations(None).await?;
        let mut draft = self.draft_mut(id)?;
        draft.touched = Instant::now();
        Ok(render(id, &draft.wizard, &courses))
    }

    /// Validate the current step and move to `request.target`.
    pub async fn step(&self, id: &str, request: StepRequest) -> Result<WizardView, AppError> {
        let target = Step::from_number(request.target)
            .ok_or_else(|| AppError::BadRequest(format!("unknown step {}", request.target)))?;
        let courses = self.db.list_active_formations(None).await?;

        let mut draft = self.draft_mut(id)?;
        if draft.submitting {
            return Err(AppError::Conflict("submission in progress".to_string()));
        }
        draft.touched = Instant::now();

        let form = match draft.wizard.step() {
            Step::PersonalInfo => StepForm::Personal(request.personal.unwrap_or_default()),
            Step::CourseSelection => StepForm::Course(request.course.unwrap_or_default()),
            Step::Funding => StepForm::Funding(request.funding.unwrap_or_default()),
            Step::Review => StepForm::Empty,
        };

        match draft.wizard.go_to(target, form, &courses) {
            Ok(()) => Ok(render(id, &draft.wizard, &courses)),
            Err(TransitionError::Invalid(errors)) => Err(AppError::Validation(errors)),
            Err(err @ TransitionError::NotAdjacent { .. }) => {
                Err(AppError::BadRequest(err.to_string()))
            }
        }
    }

    /// Submit a wizard sitting on the review step.
    ///
    /// `session_uid` is the signed-in visitor, if any. Every failure past
    /// the step check is reported as a submission error.
    pub async fn submit(
        &self,
        id: &str,
        session_uid: Option<&str>,
    ) -> Result<SubmissionOutcome, AppError> {
        let (form, created_account) = {
            let mut draft = self.draft_mut(id)?;
            if draft.submitting {
                return Err(AppError::Conflict("submission in progress".to_string()));
            }
            let form = draft.wizard.completed().ok_or_else(|| {
                AppError::BadRequest("wizard is not on the review step".to_string())
            })?;
            draft.submitting = true;
            draft.touched = Instant::now();
            (form, draft.created_account.clone())
        };

        match self
            .store_submission(form, session_uid, created_account)
            .await
        {
            Ok(outcome) => {
                self.drafts.remove(id);
                tracing::info!(
                    wizard_id = id,
                    inscription_id = %outcome.inscription_id,
                    new_account = outcome.new_account.is_some(),
                    "Enrollment submitted"
                );
                Ok(outcome)
            }
            Err((err, account)) => {
                if let Some(mut draft) = self.drafts.get_mut(id) {
                    draft.submitting = false;
                    draft.created_account = account;
                }
                Err(AppError::Submission(err.to_string()))
            }
        }
    }

    async fn store_submission(
        &self,
        form: crate::wizard::CompletedForm,
        session_uid: Option<&str>,
        created_account: Option<Account>,
    ) -> Result<SubmissionOutcome, (AppError, Option<Account>)> {
        let (user_id, new_account) = match (session_uid, created_account) {
            (Some(uid), _) => (uid.to_string(), None),
            (None, Some(account)) => (account.uid.clone(), Some(account)),
            (None, None) => {
                let account = self
                    .auth
                    .create_enrollment_account(&form.personal)
                    .await
                    .map_err(|e| (e, None))?;
                (account.uid.clone(), Some(account))
            }
        };

        let now = now_rfc3339();
        let inscription = Inscription {
            id: String::new(),
            personal: form.personal,
            formation: form.course,
            funding: form.funding,
            statut: InscriptionStatus::Pending,
            user_id,
            created_at: now.clone(),
            updated_at: now,
        };

        match self.db.create_inscription_reserving_place(&inscription).await {
            Ok(inscription_id) => Ok(SubmissionOutcome {
                inscription_id,
                new_account,
            }),
            Err(e) => Err((e, new_account)),
        }
    }

    /// Real-time check of one field.
    pub fn validate_field(&self, field: &str, value: &str) -> Option<FieldError> {
        validate_single_field(field, value)
    }

    /// Drop drafts idle for longer than `ttl`. Returns how many went.
    pub fn prune_stale(&self, ttl: Duration) -> usize {
        let before = self.drafts.len();
        self.drafts
            .retain(|_, draft| draft.submitting || draft.touched.elapsed() < ttl);
        let pruned = before.saturating_sub(self.drafts.len());
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned idle enrollment drafts");
        }
        pruned
    }

    /// Evict least recently used drafts until one more fits.
    ///
    /// Drafts being submitted are never evicted.
    fn make_room(&self) {
        while self.drafts.len() >= self.max_drafts {
            let oldest = self
                .drafts
                .iter()
                .filter(|entry| !entry.submitting)
                .min_by_key(|entry| entry.touched)
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else {
                break;
            };
            self.drafts.remove(&oldest);
            tracing::warn!(wizard_id = %oldest, "Draft store full, evicted oldest draft");
        }
    }

    pub fn draft_count(&self) -> usize {
        self.drafts.len()
    }

    fn draft_mut(
        &self,
        id: &str,
    ) -> Result<dashmap::mapref::one::RefMut<'_, String, Draft>, AppError> {
        self.drafts
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("wizard {}", id)))
    }
}

fn render(id: &str, wizard: &Wizard, courses: &[Formation]) -> WizardView {
    let selected_formation_id = wizard.selected_formation_id().map(str::to_string);
    let selected_formation = selected_formation_id
        .as_deref()
        .and_then(|sel| courses.iter().find(|f| f.id == sel))
        .map(SelectedFormationCard::from);

    WizardView {
        id: id.to_string(),
        step: wizard.step().number(),
        step_label: wizard.step().label(),
        total_steps: Step::ALL.len() as u8,
        course_options: courses.iter().map(CourseOption::from).collect(),
        selected_formation_id,
        selected_formation,
        funding_options: FundingType::ALL
            .iter()
            .map(|t| FundingOption {
                value: t.as_str(),
                label: t.label(),
            })
            .collect(),
        personal: wizard.personal().cloned(),
        course: wizard.course().cloned(),
        funding: wizard.funding().cloned(),
        summary: wizard.summary(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormationStatus;
    use crate::services::memory_identity::MemoryIdentityProvider;

    fn formation(id: &str, places: i64) -> Formation {
        Formation {
            id: id.to_string(),
            title: "Cybersécurité 101".to_string(),
            category: "Cybersécurité".to_string(),
            description: "Les bases.".to_string(),
            duration: 14,
            places,
            price: 650.0,
            status: FormationStatus::Active,
            image_url: None,
            content: None,
            prerequisites: None,
            format: None,
            inscription_count: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    async fn service(places: i64) -> (EnrollmentService, FirestoreDb, Arc<MemoryIdentityProvider>) {
        let db = FirestoreDb::new_in_memory();
        db.upsert_formation(&formation("cyber", places)).await.unwrap();
        let idp = Arc::new(MemoryIdentityProvider::new());
        let auth = AuthGateway::new(idp.clone(), db.clone());
        (EnrollmentService::new(db.clone(), auth), db, idp)
    }

    async fn to_review(svc: &EnrollmentService, id: &str) {
        svc.step(
            id,
            StepRequest {
                target: 2,
                personal: Some(PersonalForm {
                    nom: "Martin".to_string(),
                    prenom: "Luc".to_string(),
                    email: "luc@example.fr".to_string(),
                    telephone: "0611223344".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        svc.step(
            id,
            StepRequest {
                target: 3,
                course: Some(CourseForm {
                    formation: "cyber".to_string(),
                    mode: Some("presentiel".to_string()),
                    session: "2026-12".to_string(),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        svc.step(
            id,
            StepRequest {
                target: 4,
                funding: Some(FundingForm {
                    financement: "personnel".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_start_with_preselection() {
        let (svc, _, _) = service(5).await;
        let view = svc.start(Some("cyber")).await.unwrap();

        assert_eq!(view.step, 1);
        assert_eq!(view.selected_formation_id.as_deref(), Some("cyber"));
        assert_eq!(
            view.selected_formation.unwrap().places_text,
            "5 places disponibles"
        );
        assert_eq!(view.course_options[0].label, "Cybersécurité 101 - 650€");

        let view = svc.start(Some("missing")).await.unwrap();
        assert!(view.selected_formation.is_none());
    }

    #[tokio::test]
    async fn test_invalid_step_is_a_validation_error() {
        let (svc, _, _) = service(5).await;
        let view = svc.start(None).await.unwrap();

        let err = svc
            .step(&view.id, StepRequest { target: 2, ..Default::default() })
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.first().unwrap().field, "nom");
    }

    #[tokio::test]
    async fn test_anonymous_submit_creates_account_and_takes_place() {
        let (svc, db, idp) = service(5).await;
        let view = svc.start(None).await.unwrap();
        to_review(&svc, &view.id).await;

        let outcome = svc.submit(&view.id, None).await.unwrap();

        assert!(outcome.new_account.is_some());
        assert_eq!(idp.account_count(), 1);
        assert_eq!(idp.sent_password_resets(), ["luc@example.fr"]);

        let stored = db.get_inscription(&outcome.inscription_id).await.unwrap().unwrap();
        assert_eq!(stored.statut, InscriptionStatus::Pending);
        assert_eq!(stored.user_id, outcome.new_account.unwrap().uid);

        let course = db.get_formation("cyber").await.unwrap().unwrap();
        assert_eq!(course.places, 4);
        assert_eq!(course.inscription_count, 1);
        assert_eq!(svc.draft_count(), 0);
    }

    #[tokio::test]
    async fn test_signed_in_submit_uses_session() {
        let (svc, _, idp) = service(5).await;
        let view = svc.start(None).await.unwrap();
        to_review(&svc, &view.id).await;

        let outcome = svc.submit(&view.id, Some("existing-uid")).await.unwrap();
        assert!(outcome.new_account.is_none());
        assert_eq!(idp.account_count(), 0);
    }

    #[tokio::test]
    async fn test_full_course_rejects_and_keeps_draft() {
        let (svc, db, idp) = service(0).await;
        let view = svc.start(None).await.unwrap();
        to_review(&svc, &view.id).await;

        let err = svc.submit(&view.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::Submission(_)));
        assert!(db.list_inscriptions(None).await.unwrap().is_empty());

        // Account stays, draft is back for a retry which reuses it.
        assert_eq!(idp.account_count(), 1);
        assert_eq!(svc.draft_count(), 1);
        let err = svc.submit(&view.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::Submission(_)));
        assert_eq!(idp.account_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_before_review_is_rejected() {
        let (svc, _, _) = service(5).await;
        let view = svc.start(None).await.unwrap();
        assert!(matches!(
            svc.submit(&view.id, None).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            svc.submit("nope", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_draft_store_is_capped() {
        let (svc, _, _) = service(5).await;
        let svc = svc.with_draft_limit(2);

        let first = svc.start(None).await.unwrap();
        let second = svc.start(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        svc.get(&first.id).await.unwrap();
        let third = svc.start(None).await.unwrap();

        assert_eq!(svc.draft_count(), 2);
        assert!(matches!(svc.get(&second.id).await, Err(AppError::NotFound(_))));
        assert!(svc.get(&first.id).await.is_ok());
        assert!(svc.get(&third.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_prune_stale_drafts() {
        let (svc, _, _) = service(5).await;
        svc.start(None).await.unwrap();
        assert_eq!(svc.prune_stale(DRAFT_TTL), 0);
        assert_eq!(svc.prune_stale(Duration::ZERO), 1);
        assert_eq!(svc.draft_count(), 0);
    }
}
