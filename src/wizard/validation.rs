// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field validation for the enrollment form.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Toast shown whenever a step fails validation.
pub const FORM_ERROR_TOAST: &str = "Veuillez corriger les erreurs dans le formulaire";

pub const REQUIRED_MESSAGE: &str = "Ce champ est obligatoire";
pub const INVALID_EMAIL_MESSAGE: &str = "Email invalide";
pub const INVALID_PHONE_MESSAGE: &str = "Numéro de téléphone invalide";

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^[0-9]{10}$").unwrap();
}

/// `true` when `email` looks like `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// `true` when `phone` has exactly ten digits once whitespace is removed.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&digits)
}

/// One rejected form field with the inline message to show next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered list of field errors; the first entry is the field to focus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Append errors from a nested validation (e.g. the `validator` derive).
    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_fields(self) -> Vec<FieldError> {
        self.errors
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl ValidationErrors {
    /// Convert errors from the `validator` derive, listing fields in the
    /// order they appear on the form. Fields missing from `form_order`
    /// come last, by name.
    pub fn from_validator(errors: validator::ValidationErrors, form_order: &[&str]) -> Self {
        let mut out = Self::new();
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| {
            let name = field.to_string();
            let rank = form_order
                .iter()
                .position(|f| *f == name)
                .unwrap_or(form_order.len());
            (rank, name)
        });
        for (field, field_errors) in fields {
            for err in field_errors.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Valeur invalide".to_string());
                out.push(&field, &message);
            }
        }
        out
    }
}

/// Real-time check of a single field, as run when it loses focus.
///
/// Empty values pass: emptiness is reported by the step validation.
pub fn validate_single_field(field: &str, value: &str) -> Option<FieldError> {
    if value.is_empty() {
        return None;
    }
    let message = match field {
        "email" if !is_valid_email(value) => INVALID_EMAIL_MESSAGE,
        "telephone" if !is_valid_phone(value) => INVALID_PHONE_MESSAGE,
        _ => return None,
    };
    Some(FieldError {
        field: field.to_string(),
        message: message.to_string(),
    })
}
