//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

use crate::models::PersonalInfo;

/// Authorization role stored on the profile document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identity provider user ID (the document ID, never stored as a field)
    #[serde(rename = "_firestore_id", default, skip_serializing)]
    pub uid: String,
    pub email: String,
    /// Family name
    #[serde(default)]
    pub nom: String,
    /// Given name
    #[serde(default)]
    pub prenom: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub adresse: Option<String>,
    #[serde(default)]
    pub ville: Option<String>,
    #[serde(default)]
    pub code_postal: Option<String>,
    #[serde(default)]
    pub pays: Option<String>,
    /// Profile picture URL (federated sign-in only)
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl UserProfile {
    /// Bare profile with the default `user` role.
    pub fn new(uid: &str, email: &str, prenom: &str, nom: &str, now: &str) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.to_string(),
            nom: nom.to_string(),
            prenom: prenom.to_string(),
            telephone: None,
            adresse: None,
            ville: None,
            code_postal: None,
            pays: None,
            photo_url: None,
            role: Role::User,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Profile built from the personal step of the enrollment form.
    pub fn from_personal_info(uid: &str, personal: &PersonalInfo, now: &str) -> Self {
        let mut profile = Self::new(uid, &personal.email, &personal.prenom, &personal.nom, now);
        profile.telephone = Some(personal.telephone.clone());
        profile.adresse = non_empty(&personal.adresse);
        profile.ville = non_empty(&personal.ville);
        profile.code_postal = non_empty(&personal.code_postal);
        profile.pays = non_empty(&personal.pays);
        profile
    }

    /// Profile for a first federated sign-in.
    ///
    /// The first token of the provider display name is the given name and
    /// whatever follows is the family name.
    pub fn from_display_name(
        uid: &str,
        email: &str,
        display_name: Option<&str>,
        photo_url: Option<&str>,
        now: &str,
    ) -> Self {
        let (prenom, nom) = split_display_name(display_name.unwrap_or(""));
        let mut profile = Self::new(uid, email, &prenom, &nom, now);
        profile.photo_url = photo_url.map(str::to_string);
        profile
    }

    /// `"{prenom} {nom}"`, trimmed.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Split a provider display name into (given name, family name).
pub fn split_display_name(display_name: &str) -> (String, String) {
    let mut tokens = display_name.split_whitespace();
    let prenom = tokens.next().unwrap_or("").to_string();
    let nom = tokens.collect::<Vec<_>>().join(" ");
    (prenom, nom)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
