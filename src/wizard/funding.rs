// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Funding methods ("financement") and their detail panels.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// How the enrollment is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum FundingType {
    Personnel,
    Entreprise,
    Cpf,
    PoleEmploi,
    Autre,
}

impl FundingType {
    pub const ALL: [FundingType; 5] = [
        FundingType::Personnel,
        FundingType::Entreprise,
        FundingType::Cpf,
        FundingType::PoleEmploi,
        FundingType::Autre,
    ];

    /// Parse the select value; `None` for empty or unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "personnel" => Some(Self::Personnel),
            "entreprise" => Some(Self::Entreprise),
            "cpf" => Some(Self::Cpf),
            "pole_emploi" => Some(Self::PoleEmploi),
            "autre" => Some(Self::Autre),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personnel => "personnel",
            Self::Entreprise => "entreprise",
            Self::Cpf => "cpf",
            Self::PoleEmploi => "pole_emploi",
            Self::Autre => "autre",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Personnel => "Financement personnel",
            Self::Entreprise => "Financement entreprise",
            Self::Cpf => "Compte Personnel de Formation (CPF)",
            Self::PoleEmploi => "Pôle Emploi",
            Self::Autre => "Autre",
        }
    }

    /// Extra fields shown once this funding type is picked.
    ///
    /// Personal funding needs nothing more.
    pub fn detail_panel(&self) -> Option<FundingPanel> {
        let panel = match self {
            Self::Personnel => return None,
            Self::Entreprise => FundingPanel {
                title: Some("Financement entreprise :"),
                description: Some(
                    "Votre entreprise prend en charge tout ou partie du coût de la formation.",
                ),
                fields: vec![
                    PanelField::text("entrepriseContact", "Contact RH / Formation"),
                    PanelField {
                        id: "entrepriseEmail",
                        label: "Email du contact",
                        input_type: "email",
                    },
                ],
            },
            Self::Cpf => FundingPanel {
                title: Some("Compte Personnel de Formation (CPF) :"),
                description: Some(
                    "Utilisez vos heures de formation disponibles sur votre compte CPF.",
                ),
                fields: vec![PanelField::text("cpfNumber", "Numéro CPF")],
            },
            Self::PoleEmploi => FundingPanel {
                title: Some("Financement Pôle Emploi :"),
                description: Some(
                    "Pour les demandeurs d'emploi, des aides peuvent être disponibles.",
                ),
                fields: vec![PanelField::text("poleEmploiId", "Identifiant Pôle Emploi")],
            },
            Self::Autre => FundingPanel {
                title: None,
                description: None,
                fields: vec![PanelField::text(
                    "autreFinancement",
                    "Précisez le mode de financement",
                )],
            },
        };
        Some(panel)
    }
}

/// Detail panel rendered under the funding select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FundingPanel {
    pub title: Option<&'static str>,
    pub description: Option<&'static str>,
    pub fields: Vec<PanelField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelField {
    pub id: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
}

impl PanelField {
    fn text(id: &'static str, label: &'static str) -> Self {
        Self {
            id,
            label,
            input_type: "text",
        }
    }
}
