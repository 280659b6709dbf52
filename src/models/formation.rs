// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Course ("formation") model for storage and API.

use serde::{Deserialize, Serialize};

/// Hours of training per week, used to express durations in weeks.
const HOURS_PER_WEEK: u32 = 20;

/// Catalog visibility of a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormationStatus {
    Active,
    #[default]
    Inactive,
}

impl FormationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Label shown in the admin course table.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Actif",
            Self::Inactive => "Inactif",
        }
    }
}

/// Stored course document in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Formation {
    /// Document ID (never stored as a field)
    #[serde(rename = "_firestore_id", default, skip_serializing)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Duration in hours
    #[serde(default)]
    pub duration: u32,
    /// Remaining places
    #[serde(default)]
    pub places: i64,
    /// Price in euros
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub status: FormationStatus,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Programme (free text)
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub prerequisites: Option<String>,
    /// Delivery format shown in the details overlay
    #[serde(default)]
    pub format: Option<String>,
    /// Number of enrollments taken
    #[serde(default)]
    pub inscription_count: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Returned when a course has no place left to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no place left in this formation")]
pub struct FormationFull;

impl Formation {
    pub fn is_active(&self) -> bool {
        self.status == FormationStatus::Active
    }

    /// Take one place: `places - 1`, `inscriptionCount + 1`.
    ///
    /// Refuses when no place is left, so `places` never goes negative.
    pub fn reserve_place(&mut self, now: &str) -> Result<(), FormationFull> {
        if self.places <= 0 {
            return Err(FormationFull);
        }
        self.places -= 1;
        self.inscription_count += 1;
        self.updated_at = now.to_string();
        Ok(())
    }

    /// Human duration in weeks at twenty hours per week.
    pub fn duration_text(&self) -> String {
        duration_text(self.duration)
    }
}

/// `"{n} semaines"` for more than one week, `"1 semaine"` otherwise.
pub fn duration_text(hours: u32) -> String {
    let weeks = hours.div_ceil(HOURS_PER_WEEK);
    if weeks > 1 {
        format!("{} semaines", weeks)
    } else {
        "1 semaine".to_string()
    }
}
