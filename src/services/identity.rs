// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider seam: account creation, sign-in and password resets.
//!
//! The provider owns credentials. This service only keeps the uid it hands
//! back and issues its own session token afterwards.

use async_trait::async_trait;

/// Sign-in/sign-up failure, one variant per provider error code.
///
/// The `Display` text is the French message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Cet email est déjà utilisé.")]
    EmailAlreadyInUse,
    #[error("Email invalide.")]
    InvalidEmail,
    #[error("Opération non autorisée.")]
    OperationNotAllowed,
    #[error("Le mot de passe doit contenir au moins 6 caractères.")]
    WeakPassword,
    #[error("Ce compte a été désactivé.")]
    UserDisabled,
    #[error("Aucun compte avec cet email.")]
    UserNotFound,
    #[error("Mot de passe incorrect.")]
    WrongPassword,
    #[error("Trop de tentatives. Réessayez plus tard.")]
    TooManyRequests,
    #[error("Erreur réseau. Vérifiez votre connexion.")]
    NetworkRequestFailed,
    /// Any code outside the known set; keeps the raw code for logs.
    #[error("Une erreur est survenue. Veuillez réessayer.")]
    Unknown(String),
}

impl AuthError {
    /// Map a provider error code.
    ///
    /// Accepts SDK-style codes (`auth/weak-password`) and REST codes
    /// (`WEAK_PASSWORD : Password should be at least 6 characters`).
    pub fn from_code(raw: &str) -> Self {
        let code = raw.split(" : ").next().unwrap_or(raw).trim();
        let code = code.strip_prefix("auth/").unwrap_or(code);

        match code {
            "email-already-in-use" | "EMAIL_EXISTS" => Self::EmailAlreadyInUse,
            "invalid-email" | "INVALID_EMAIL" => Self::InvalidEmail,
            "operation-not-allowed" | "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => {
                Self::OperationNotAllowed
            }
            "weak-password" | "WEAK_PASSWORD" => Self::WeakPassword,
            "user-disabled" | "USER_DISABLED" => Self::UserDisabled,
            "user-not-found" | "EMAIL_NOT_FOUND" => Self::UserNotFound,
            "wrong-password" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                Self::WrongPassword
            }
            "too-many-requests" | "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyRequests,
            "network-request-failed" => Self::NetworkRequestFailed,
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    /// SDK-style code, reported in error details.
    pub fn code(&self) -> &str {
        match self {
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::InvalidEmail => "auth/invalid-email",
            Self::OperationNotAllowed => "auth/operation-not-allowed",
            Self::WeakPassword => "auth/weak-password",
            Self::UserDisabled => "auth/user-disabled",
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::NetworkRequestFailed => "auth/network-request-failed",
            Self::Unknown(code) => code,
        }
    }
}

/// Account returned by the provider after sign-up or sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAccount {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// Provider-issued token, needed for profile updates
    pub id_token: String,
}

/// Hosted identity provider operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderAccount, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderAccount, AuthError>;

    /// Sign in (creating the account if needed) with a Google ID token.
    async fn sign_in_with_google(&self, google_id_token: &str)
        -> Result<ProviderAccount, AuthError>;

    async fn update_display_name(
        &self,
        account: &ProviderAccount,
        display_name: &str,
    ) -> Result<(), AuthError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;
}
