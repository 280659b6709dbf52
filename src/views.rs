// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! View models returned to the pages.
//!
//! Each view is a pure function of stored documents; the page only lays it
//! out. Field names are the contract with the frontend.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::category::{category_color, category_icon};
use crate::models::{ActivityEntry, Formation, Inscription, UserProfile};
use crate::services::auth::Account;
use crate::time_utils::format_short_date;

/// Card description length in the catalog grid.
pub const CARD_EXCERPT_CHARS: usize = 100;
/// Description length on the wizard's selected course card.
pub const SELECTED_EXCERPT_CHARS: usize = 150;
pub const DEFAULT_FORMAT: &str = "Présentiel/Distanciel";
pub const DEFAULT_AVATAR_URL: &str = "https://randomuser.me/api/portraits/men/32.jpg";
pub const DEFAULT_DISPLAY_NAME: &str = "Utilisateur";
pub const DEFAULT_ACTIVITY_ICON: &str = "bell";
pub const ADMIN_IMAGE_PLACEHOLDER: &str = "https://via.placeholder.com/50";

/// First `max_chars` characters, with `...` when something was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Euro amount without a trailing `.0` for whole values.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        format!("{}", price)
    }
}

// ─── Catalog ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FormationCard {
    pub id: String,
    pub title: String,
    pub category: String,
    pub category_color: String,
    pub category_icon: String,
    pub excerpt: String,
    /// Hours
    pub duration: u32,
    pub duration_text: String,
    pub places: i64,
    pub price: f64,
    pub image_url: Option<String>,
}

impl From<&Formation> for FormationCard {
    fn from(f: &Formation) -> Self {
        Self {
            id: f.id.clone(),
            title: f.title.clone(),
            category: f.category.clone(),
            category_color: category_color(&f.category).to_string(),
            category_icon: category_icon(&f.category).to_string(),
            excerpt: excerpt(&f.description, CARD_EXCERPT_CHARS),
            duration: f.duration,
            duration_text: f.duration_text(),
            places: f.places,
            price: f.price,
            image_url: f.image_url.clone(),
        }
    }
}

/// Details overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FormationDetails {
    pub id: String,
    pub title: String,
    pub category: String,
    pub category_color: String,
    pub duration: u32,
    pub duration_text: String,
    pub places: i64,
    pub price: f64,
    pub format: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<String>,
    pub image_url: Option<String>,
}

impl From<&Formation> for FormationDetails {
    fn from(f: &Formation) -> Self {
        let present = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            id: f.id.clone(),
            title: f.title.clone(),
            category: f.category.clone(),
            category_color: category_color(&f.category).to_string(),
            duration: f.duration,
            duration_text: f.duration_text(),
            places: f.places,
            price: f.price,
            format: present(&f.format).unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
            description: f.description.clone(),
            content: present(&f.content),
            prerequisites: present(&f.prerequisites),
            image_url: f.image_url.clone(),
        }
    }
}

/// Result of clicking "S'inscrire" on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EnrollAction {
    LoginRequired { prompt: String, redirect: String },
    OpenWizard { redirect: String },
}

pub const LOGIN_REQUIRED_PROMPT: &str =
    "Vous devez être connecté pour vous inscrire. Voulez-vous vous connecter ?";

impl EnrollAction {
    pub fn for_session(signed_in: bool, formation_id: &str) -> Self {
        if signed_in {
            Self::OpenWizard {
                redirect: format!(
                    "inscription.html?formation={}",
                    urlencoding::encode(formation_id)
                ),
            }
        } else {
            Self::LoginRequired {
                prompt: LOGIN_REQUIRED_PROMPT.to_string(),
                redirect: "login.html".to_string(),
            }
        }
    }
}

// ─── Wizard ──────────────────────────────────────────────────────

/// Summary card of the course preselected in the wizard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFormationCard {
    pub id: String,
    pub title: String,
    pub price_text: String,
    pub duration_text: String,
    pub places_text: String,
    pub category: String,
    pub excerpt: String,
}

impl From<&Formation> for SelectedFormationCard {
    fn from(f: &Formation) -> Self {
        Self {
            id: f.id.clone(),
            title: f.title.clone(),
            price_text: format!("{}€", format_price(f.price)),
            duration_text: format!("{} heures", f.duration),
            places_text: format!("{} places disponibles", f.places),
            category: f.category.clone(),
            excerpt: excerpt(&f.description, SELECTED_EXCERPT_CHARS),
        }
    }
}

/// Entry of the course select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseOption {
    pub value: String,
    pub label: String,
}

impl From<&Formation> for CourseOption {
    fn from(f: &Formation) -> Self {
        Self {
            value: f.id.clone(),
            label: format!("{} - {}€", f.title, format_price(f.price)),
        }
    }
}

// ─── Session ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuLink {
    pub href: String,
    pub label: String,
}

impl MenuLink {
    fn new(href: &str, label: &str) -> Self {
        Self {
            href: href.to_string(),
            label: label.to_string(),
        }
    }
}

/// "Current user" region of every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UserMenu {
    #[serde(rename_all = "camelCase")]
    SignedIn {
        avatar_url: String,
        display_name: String,
        links: Vec<MenuLink>,
    },
    SignedOut {
        links: Vec<MenuLink>,
    },
}

impl UserMenu {
    pub fn for_account(account: Option<&Account>) -> Self {
        match account {
            Some(account) => Self::SignedIn {
                avatar_url: account
                    .photo_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
                display_name: account
                    .display_name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
                links: vec![
                    MenuLink::new("dashboard.html", "Mon compte"),
                    MenuLink::new("/auth/logout", "Déconnexion"),
                ],
            },
            None => Self::SignedOut {
                links: vec![
                    MenuLink::new("login.html", "Connexion"),
                    MenuLink::new("register.html", "Inscription"),
                ],
            },
        }
    }
}

// ─── Admin ───────────────────────────────────────────────────────

/// Row of the admin course table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFormationRow {
    pub id: String,
    pub image_url: String,
    pub title: String,
    pub category: String,
    pub duration: u32,
    pub places: i64,
    pub price: f64,
    pub status: String,
    pub status_label: String,
    pub inscription_count: u32,
}

impl From<&Formation> for AdminFormationRow {
    fn from(f: &Formation) -> Self {
        Self {
            id: f.id.clone(),
            image_url: f
                .image_url
                .clone()
                .unwrap_or_else(|| ADMIN_IMAGE_PLACEHOLDER.to_string()),
            title: f.title.clone(),
            category: f.category.clone(),
            duration: f.duration,
            places: f.places,
            price: f.price,
            status: f.status.as_str().to_string(),
            status_label: f.status.label().to_string(),
            inscription_count: f.inscription_count,
        }
    }
}

/// Row of the enrollment tables (dashboard and full list).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InscriptionRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub formation: String,
    pub date: String,
    pub status: String,
    pub status_label: String,
}

impl From<&Inscription> for InscriptionRow {
    fn from(i: &Inscription) -> Self {
        Self {
            id: i.id.clone(),
            name: i.personal.full_name(),
            email: i.personal.email.clone(),
            formation: i.formation.formation_title.clone(),
            date: format_short_date(&i.created_at),
            status: i.statut.as_str().to_string(),
            status_label: i.statut.label().to_string(),
        }
    }
}

/// Full enrollment for the admin detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InscriptionDetail {
    pub id: String,
    #[serde(flatten)]
    pub inscription: Inscription,
    pub status_label: String,
    pub funding_label: String,
    pub mode_label: String,
}

impl From<&Inscription> for InscriptionDetail {
    fn from(i: &Inscription) -> Self {
        Self {
            id: i.id.clone(),
            inscription: i.clone(),
            status_label: i.statut.label().to_string(),
            funding_label: i.funding.kind.label().to_string(),
            mode_label: i.formation.mode.label().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRow {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<&UserProfile> for UserRow {
    fn from(u: &UserProfile) -> Self {
        Self {
            uid: u.uid.clone(),
            name: u.display_name(),
            email: u.email.clone(),
            role: if u.is_admin() { "admin" } else { "user" }.to_string(),
            created_at: format_short_date(&u.created_at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityItem {
    pub icon: String,
    pub message: String,
    pub timestamp: String,
}

impl From<&ActivityEntry> for ActivityItem {
    fn from(a: &ActivityEntry) -> Self {
        Self {
            icon: format!(
                "fas fa-{}",
                a.icon
                    .as_deref()
                    .filter(|i| !i.is_empty())
                    .unwrap_or(DEFAULT_ACTIVITY_ICON)
            ),
            message: a.message.clone(),
            timestamp: a.timestamp.clone(),
        }
    }
}

/// Pie chart data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub labels: Vec<&'static str>,
    pub values: Vec<u32>,
    pub colors: Vec<&'static str>,
}

impl ChartData {
    /// Fixed course-category split shown on the dashboard.
    pub fn category_split() -> Self {
        Self {
            labels: vec![
                "Développement",
                "Data Science",
                "Cybersécurité",
                "Marketing",
                "Management",
            ],
            values: vec![30, 20, 15, 20, 15],
            colors: vec!["#3498db", "#2ecc71", "#e74c3c", "#f39c12", "#9b59b6"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCounts {
    pub active_formations: usize,
    pub inscriptions: usize,
    pub users: usize,
    pub revenue: f64,
    /// `"{revenue}€"`
    pub revenue_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub counts: DashboardCounts,
    pub recent_inscriptions: Vec<InscriptionRow>,
    pub recent_activity: Vec<ActivityItem>,
    pub chart: ChartData,
}
