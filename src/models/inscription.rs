// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Enrollment ("inscription") model for storage and API.

use serde::{Deserialize, Serialize};

use crate::wizard::funding::FundingType;

/// Lifecycle of an enrollment. New enrollments start as `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InscriptionStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl InscriptionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Badge text in the admin tables.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "En attente",
            Self::Confirmed => "Confirmée",
            Self::Cancelled => "Annulée",
            Self::Completed => "Terminée",
        }
    }
}

/// Delivery mode picked in the course step radio group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Presentiel,
    Distanciel,
    Hybride,
}

impl DeliveryMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "presentiel" => Some(Self::Presentiel),
            "distanciel" => Some(Self::Distanciel),
            "hybride" => Some(Self::Hybride),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Presentiel => "Présentiel",
            Self::Distanciel => "Distanciel",
            Self::Hybride => "Hybride",
        }
    }
}

/// Personal step of the enrollment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub nom: String,
    pub prenom: String,
    pub email: String,
    pub telephone: String,
    #[serde(default)]
    pub adresse: String,
    #[serde(default)]
    pub ville: String,
    #[serde(default)]
    pub code_postal: String,
    #[serde(default)]
    pub pays: String,
}

impl PersonalInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nom, self.prenom).trim().to_string()
    }

    /// `"{adresse}, {codePostal} {ville}, {pays}"` when an address was given.
    pub fn address_line(&self) -> Option<String> {
        if self.adresse.trim().is_empty() {
            return None;
        }
        Some(format!(
            "{}, {} {}, {}",
            self.adresse, self.code_postal, self.ville, self.pays
        ))
    }
}

/// Course step of the enrollment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseChoice {
    pub formation_id: String,
    pub formation_title: String,
    pub mode: DeliveryMode,
    pub session: String,
}

/// Funding step of the enrollment form.
///
/// Only the detail fields of the chosen funding type are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingDetails {
    #[serde(rename = "type")]
    pub kind: FundingType,
    /// Company name (static field of the funding step)
    #[serde(default)]
    pub entreprise: Option<String>,
    #[serde(default)]
    pub entreprise_contact: Option<String>,
    #[serde(default)]
    pub entreprise_email: Option<String>,
    #[serde(default)]
    pub cpf_number: Option<String>,
    #[serde(default)]
    pub pole_emploi_id: Option<String>,
    #[serde(default)]
    pub autre_financement: Option<String>,
    /// Free-text additional information
    #[serde(default)]
    pub message: Option<String>,
}

/// Stored enrollment document in Firestore.
///
/// Reads also accept the flat layout of enrollments written by the previous
/// site, where the form sections were spread into the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredInscription")]
pub struct Inscription {
    /// Document ID (never stored as a field)
    #[serde(rename = "_firestore_id", default, skip_serializing)]
    pub id: String,
    pub personal: PersonalInfo,
    pub formation: CourseChoice,
    pub funding: FundingDetails,
    #[serde(default)]
    pub statut: InscriptionStatus,
    /// Owner account (identity provider user ID)
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredInscription {
    Nested(NestedInscription),
    Flat(Box<FlatInscription>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NestedInscription {
    #[serde(rename = "_firestore_id", default)]
    id: String,
    personal: PersonalInfo,
    formation: CourseChoice,
    funding: FundingDetails,
    #[serde(default)]
    statut: InscriptionStatus,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatInscription {
    #[serde(rename = "_firestore_id", default)]
    doc_id: String,
    #[serde(default)]
    nom: String,
    #[serde(default)]
    prenom: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    telephone: String,
    #[serde(default)]
    adresse: String,
    #[serde(default)]
    ville: String,
    #[serde(default)]
    code_postal: String,
    #[serde(default)]
    pays: String,
    /// Course id
    #[serde(rename = "id", default)]
    formation_id: String,
    #[serde(default)]
    titre: String,
    mode: DeliveryMode,
    #[serde(default)]
    session: String,
    #[serde(rename = "type")]
    kind: FundingType,
    #[serde(default)]
    entreprise: Option<String>,
    #[serde(default)]
    entreprise_contact: Option<String>,
    #[serde(default)]
    entreprise_email: Option<String>,
    #[serde(default)]
    cpf_number: Option<String>,
    #[serde(default)]
    pole_emploi_id: Option<String>,
    #[serde(default)]
    autre_financement: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    statut: InscriptionStatus,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

/// The old form stored untouched inputs as empty strings.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<StoredInscription> for Inscription {
    fn from(stored: StoredInscription) -> Self {
        match stored {
            StoredInscription::Nested(doc) => Inscription {
                id: doc.id,
                personal: doc.personal,
                formation: doc.formation,
                funding: doc.funding,
                statut: doc.statut,
                user_id: doc.user_id,
                created_at: doc.created_at,
                updated_at: doc.updated_at,
            },
            StoredInscription::Flat(doc) => {
                let doc = *doc;
                Inscription {
                    id: doc.doc_id,
                    personal: PersonalInfo {
                        nom: doc.nom,
                        prenom: doc.prenom,
                        email: doc.email,
                        telephone: doc.telephone,
                        adresse: doc.adresse,
                        ville: doc.ville,
                        code_postal: doc.code_postal,
                        pays: doc.pays,
                    },
                    formation: CourseChoice {
                        formation_id: doc.formation_id,
                        formation_title: doc.titre,
                        mode: doc.mode,
                        session: doc.session,
                    },
                    funding: FundingDetails {
                        kind: doc.kind,
                        entreprise: non_empty(doc.entreprise),
                        entreprise_contact: non_empty(doc.entreprise_contact),
                        entreprise_email: non_empty(doc.entreprise_email),
                        cpf_number: non_empty(doc.cpf_number),
                        pole_emploi_id: non_empty(doc.pole_emploi_id),
                        autre_financement: non_empty(doc.autre_financement),
                        message: non_empty(doc.message),
                    },
                    statut: doc.statut,
                    user_id: doc.user_id,
                    created_at: doc.created_at,
                    updated_at: doc.updated_at,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personal() -> PersonalInfo {
        PersonalInfo {
            nom: "Dupont".to_string(),
            prenom: "Jeanne".to_string(),
            email: "jeanne@example.fr".to_string(),
            telephone: "0612345678".to_string(),
            adresse: String::new(),
            ville: "Lyon".to_string(),
            code_postal: "69001".to_string(),
            pays: "France".to_string(),
        }
    }

    #[test]
    fn test_address_line_only_with_street() {
        let mut p = personal();
        assert_eq!(p.address_line(), None);

        p.adresse = "12 rue de la Paix".to_string();
        assert_eq!(
            p.address_line().as_deref(),
            Some("12 rue de la Paix, 69001 Lyon, France")
        );
    }

    #[test]
    fn test_funding_type_field_name() {
        let funding = FundingDetails {
            kind: FundingType::PoleEmploi,
            entreprise: None,
            entreprise_contact: None,
            entreprise_email: None,
            cpf_number: None,
            pole_emploi_id: Some("PE-42".to_string()),
            autre_financement: None,
            message: None,
        };
        let value = serde_json::to_value(&funding).unwrap();
        assert_eq!(value["type"], "pole_emploi");
        assert_eq!(value["poleEmploiId"], "PE-42");
    }

    #[test]
    fn test_reads_flat_legacy_document() {
        let doc = serde_json::json!({
            "_firestore_id": "legacy1",
            "nom": "Durand",
            "prenom": "Paul",
            "email": "paul@example.fr",
            "telephone": "0611223344",
            "adresse": "",
            "id": "rust-101",
            "titre": "Rust 101",
            "mode": "distanciel",
            "session": "2026-11",
            "type": "cpf",
            "entreprise": "",
            "cpfNumber": "CPF-9",
            "message": "",
            "userId": "anonymous",
            "statut": "confirmed",
            "createdAt": "2025-03-01T09:00:00Z"
        });

        let inscription: Inscription = serde_json::from_value(doc).unwrap();

        assert_eq!(inscription.id, "legacy1");
        assert_eq!(inscription.personal.full_name(), "Durand Paul");
        assert_eq!(inscription.formation.formation_id, "rust-101");
        assert_eq!(inscription.formation.formation_title, "Rust 101");
        assert_eq!(inscription.formation.mode, DeliveryMode::Distanciel);
        assert_eq!(inscription.funding.kind, FundingType::Cpf);
        assert_eq!(inscription.funding.cpf_number.as_deref(), Some("CPF-9"));
        assert_eq!(inscription.funding.entreprise, None);
        assert_eq!(inscription.statut, InscriptionStatus::Confirmed);
    }

    #[test]
    fn test_nested_document_ignores_stored_id_field() {
        let doc = serde_json::json!({
            "_firestore_id": "doc-7",
            "id": "stale",
            "personal": personal(),
            "formation": {
                "formationId": "cyber",
                "formationTitle": "Cybersécurité 101",
                "mode": "presentiel",
                "session": "2026-12"
            },
            "funding": { "type": "personnel" },
            "userId": "u1",
            "createdAt": "2026-10-01T00:00:00Z",
            "updatedAt": "2026-10-01T00:00:00Z"
        });

        let inscription: Inscription = serde_json::from_value(doc).unwrap();
        assert_eq!(inscription.id, "doc-7");
        assert_eq!(inscription.formation.formation_id, "cyber");
        assert_eq!(inscription.statut, InscriptionStatus::Pending);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(InscriptionStatus::default(), InscriptionStatus::Pending);
        assert_eq!(InscriptionStatus::parse("confirmed"), Some(InscriptionStatus::Confirmed));
        assert_eq!(InscriptionStatus::parse("archived"), None);
        assert_eq!(InscriptionStatus::Pending.label(), "En attente");
    }
}
