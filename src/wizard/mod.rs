// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Four-step enrollment wizard.
//!
//! The wizard is a pure state machine: it owns the captured form data of a
//! single enrollment until submission and knows nothing about storage.
//! Steps are traversed linearly; leaving a step (forward or back) requires
//! that step's data to validate.

pub mod funding;
pub mod validation;

use serde::{Deserialize, Serialize};

use crate::models::{CourseChoice, DeliveryMode, Formation, FundingDetails, PersonalInfo};
use crate::time_utils::format_session_month;
use funding::FundingType;
use validation::{is_valid_email, is_valid_phone, ValidationErrors};
use validation::{INVALID_EMAIL_MESSAGE, INVALID_PHONE_MESSAGE, REQUIRED_MESSAGE};

pub const SELECT_FORMATION_MESSAGE: &str = "Veuillez sélectionner une formation";
pub const SELECT_MODE_MESSAGE: &str = "Veuillez sélectionner un mode de formation";
pub const SELECT_SESSION_MESSAGE: &str = "Veuillez sélectionner une session";
pub const SELECT_FUNDING_MESSAGE: &str = "Veuillez sélectionner un mode de financement";

/// Wizard steps, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    PersonalInfo,
    CourseSelection,
    Funding,
    Review,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::PersonalInfo,
        Step::CourseSelection,
        Step::Funding,
        Step::Review,
    ];

    /// 1-based step number, as shown in the progress bar.
    pub fn number(&self) -> u8 {
        match self {
            Step::PersonalInfo => 1,
            Step::CourseSelection => 2,
            Step::Funding => 3,
            Step::Review => 4,
        }
    }

    pub fn from_number(number: u8) -> Option<Step> {
        Step::ALL.into_iter().find(|s| s.number() == number)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Step::PersonalInfo => "Informations personnelles",
            Step::CourseSelection => "Formation",
            Step::Funding => "Financement",
            Step::Review => "Récapitulatif",
        }
    }

    fn is_adjacent(&self, other: Step) -> bool {
        self.number().abs_diff(other.number()) == 1
    }
}

/// Raw personal step fields, as typed by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalForm {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    pub adresse: String,
    pub ville: String,
    pub code_postal: String,
    pub pays: String,
}

/// Raw course step fields. `mode` is `None` when no radio is checked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CourseForm {
    pub formation: String,
    pub mode: Option<String>,
    pub session: String,
}

/// Raw funding step fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FundingForm {
    pub financement: String,
    pub entreprise: String,
    pub entreprise_contact: String,
    pub entreprise_email: String,
    pub cpf_number: String,
    pub pole_emploi_id: String,
    pub autre_financement: String,
    pub message: String,
}

/// Data submitted with a step change.
#[derive(Debug, Clone)]
pub enum StepForm {
    Personal(PersonalForm),
    Course(CourseForm),
    Funding(FundingForm),
    /// Review has no fields of its own.
    Empty,
}

/// Why a step change was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot go from step {} to step {}", .from.number(), .to.number())]
    NotAdjacent { from: Step, to: Step },

    #[error("current step has invalid fields")]
    Invalid(ValidationErrors),
}

/// Everything captured once the first three steps validated.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedForm {
    pub personal: PersonalInfo,
    pub course: CourseChoice,
    pub funding: FundingDetails,
}

/// Enrollment wizard state for one visitor.
#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
    personal: Option<PersonalInfo>,
    course: Option<CourseChoice>,
    funding: Option<FundingDetails>,
    preselected_formation: Option<String>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: Step::PersonalInfo,
            personal: None,
            course: None,
            funding: None,
            preselected_formation: None,
        }
    }

    /// Wizard opened from a catalog card (`?formation={id}`).
    pub fn with_preselected(formation_id: impl Into<String>) -> Self {
        let mut wizard = Self::new();
        wizard.preselected_formation = Some(formation_id.into());
        wizard
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn personal(&self) -> Option<&PersonalInfo> {
        self.personal.as_ref()
    }

    pub fn course(&self) -> Option<&CourseChoice> {
        self.course.as_ref()
    }

    pub fn funding(&self) -> Option<&FundingDetails> {
        self.funding.as_ref()
    }

    /// Course the select should show: the saved choice, else the preselection.
    pub fn selected_formation_id(&self) -> Option<&str> {
        self.course
            .as_ref()
            .map(|c| c.formation_id.as_str())
            .or(self.preselected_formation.as_deref())
    }

    /// Move to `target`, validating and saving the current step first.
    ///
    /// `catalog` is the list of courses the course select offers.
    pub fn go_to(
        &mut self,
        target: Step,
        form: StepForm,
        catalog: &[Formation],
    ) -> Result<(), TransitionError> {
        if !self.step.is_adjacent(target) {
            return Err(TransitionError::NotAdjacent {
                from: self.step,
                to: target,
            });
        }

        self.save_current(form, catalog)
            .map_err(TransitionError::Invalid)?;
        self.step = target;
        Ok(())
    }

    fn save_current(&mut self, form: StepForm, catalog: &[Formation]) -> Result<(), ValidationErrors> {
        match self.step {
            Step::PersonalInfo => {
                let form = match form {
                    StepForm::Personal(f) => f,
                    _ => PersonalForm::default(),
                };
                self.personal = Some(validate_personal(&form)?);
            }
            Step::CourseSelection => {
                let form = match form {
                    StepForm::Course(f) => f,
                    _ => CourseForm::default(),
                };
                self.course = Some(validate_course(&form, catalog)?);
            }
            Step::Funding => {
                let form = match form {
                    StepForm::Funding(f) => f,
                    _ => FundingForm::default(),
                };
                self.funding = Some(validate_funding(&form)?);
            }
            Step::Review => {}
        }
        Ok(())
    }

    /// All step data, once the wizard sits on the review step.
    pub fn completed(&self) -> Option<CompletedForm> {
        if self.step != Step::Review {
            return None;
        }
        Some(CompletedForm {
            personal: self.personal.clone()?,
            course: self.course.clone()?,
            funding: self.funding.clone()?,
        })
    }

    /// Read-only recap shown on the review step.
    pub fn summary(&self) -> Option<Summary> {
        self.completed().map(|form| Summary::from_form(&form))
    }
}

/// Validate the personal step: four required fields, email and phone format.
pub fn validate_personal(form: &PersonalForm) -> Result<PersonalInfo, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for (field, value) in [
        ("nom", &form.nom),
        ("prenom", &form.prenom),
        ("email", &form.email),
        ("telephone", &form.telephone),
    ] {
        // Formats are checked on the value as typed; only emptiness trims.
        if value.trim().is_empty() {
            errors.push(field, REQUIRED_MESSAGE);
        } else if field == "email" && !is_valid_email(value) {
            errors.push(field, INVALID_EMAIL_MESSAGE);
        } else if field == "telephone" && !is_valid_phone(value) {
            errors.push(field, INVALID_PHONE_MESSAGE);
        }
    }

    errors.into_result()?;

    Ok(PersonalInfo {
        nom: form.nom.trim().to_string(),
        prenom: form.prenom.trim().to_string(),
        email: form.email.trim().to_string(),
        telephone: form.telephone.trim().to_string(),
        adresse: form.adresse.trim().to_string(),
        ville: form.ville.trim().to_string(),
        code_postal: form.code_postal.trim().to_string(),
        pays: form.pays.trim().to_string(),
    })
}

/// Validate the course step against the courses offered in the select.
pub fn validate_course(form: &CourseForm, catalog: &[Formation]) -> Result<CourseChoice, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let formation = catalog
        .iter()
        .filter(|f| f.is_active())
        .find(|f| !form.formation.trim().is_empty() && f.id == form.formation.trim());
    if formation.is_none() {
        errors.push("formation", SELECT_FORMATION_MESSAGE);
    }

    let mode = form.mode.as_deref().and_then(DeliveryMode::parse);
    if mode.is_none() {
        errors.push("mode", SELECT_MODE_MESSAGE);
    }

    if form.session.trim().is_empty() {
        errors.push("session", SELECT_SESSION_MESSAGE);
    }

    match (formation, mode) {
        (Some(formation), Some(mode)) if errors.is_empty() => Ok(CourseChoice {
            formation_id: formation.id.clone(),
            formation_title: formation.title.clone(),
            mode,
            session: form.session.trim().to_string(),
        }),
        _ => Err(errors),
    }
}

/// Validate the funding step; only the chosen type's details are kept.
pub fn validate_funding(form: &FundingForm) -> Result<FundingDetails, ValidationErrors> {
    let kind = FundingType::parse(&form.financement)
        .ok_or_else(|| ValidationErrors::single("financement", SELECT_FUNDING_MESSAGE))?;

    let keep = |wanted: FundingType, value: &str| {
        let value = value.trim();
        (kind == wanted && !value.is_empty()).then(|| value.to_string())
    };
    let optional = |value: &str| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    Ok(FundingDetails {
        kind,
        entreprise: optional(&form.entreprise),
        entreprise_contact: keep(FundingType::Entreprise, &form.entreprise_contact),
        entreprise_email: keep(FundingType::Entreprise, &form.entreprise_email),
        cpf_number: keep(FundingType::Cpf, &form.cpf_number),
        pole_emploi_id: keep(FundingType::PoleEmploi, &form.pole_emploi_id),
        autre_financement: keep(FundingType::Autre, &form.autre_financement),
        message: optional(&form.message),
    })
}

/// Review recap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub personal: PersonalSummary,
    pub formation: FormationSummary,
    pub funding: FundingSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalSummary {
    pub name: String,
    pub email: String,
    pub telephone: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormationSummary {
    pub title: String,
    pub mode: &'static str,
    pub session: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingSummary {
    pub label: &'static str,
    pub entreprise: Option<String>,
    pub message: Option<String>,
}

impl Summary {
    pub fn from_form(form: &CompletedForm) -> Self {
        Self {
            personal: PersonalSummary {
                name: form.personal.full_name(),
                email: form.personal.email.clone(),
                telephone: form.personal.telephone.clone(),
                address: form.personal.address_line(),
            },
            formation: FormationSummary {
                title: form.course.formation_title.clone(),
                mode: form.course.mode.label(),
                session: format_session_month(&form.course.session),
            },
            funding: FundingSummary {
                label: form.funding.kind.label(),
                entreprise: form.funding.entreprise.clone(),
                message: form.funding.message.clone(),
            },
        }
    }
}
