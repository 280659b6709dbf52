// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process identity provider for local mode and tests.
//!
//! Passwords are stored as argon2 hashes. Password reset emails are not
//! sent; the addresses are recorded instead.

use crate::services::identity::{AuthError, IdentityProvider, ProviderAccount};
use crate::wizard::validation::is_valid_email;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct StoredAccount {
    uid: String,
    email: String,
    /// `None` for Google-only accounts
    password_hash: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
    disabled: bool,
}

impl StoredAccount {
    fn to_provider_account(&self) -> ProviderAccount {
        ProviderAccount {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
            id_token: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Google identity known to the fake provider, keyed by ID token.
#[derive(Debug, Clone)]
struct GoogleIdentity {
    email: String,
    display_name: Option<String>,
    photo_url: Option<String>,
}

#[derive(Default)]
pub struct MemoryIdentityProvider {
    /// Accounts keyed by lowercased email
    accounts: DashMap<String, StoredAccount>,
    google_identities: DashMap<String, GoogleIdentity>,
    sent_resets: Mutex<Vec<String>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id_token` a valid Google credential for the given identity.
    pub fn register_google_identity(
        &self,
        id_token: &str,
        email: &str,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) {
        self.google_identities.insert(
            id_token.to_string(),
            GoogleIdentity {
                email: email.to_string(),
                display_name: display_name.map(str::to_string),
                photo_url: photo_url.map(str::to_string),
            },
        );
    }

    /// Block sign-in for an existing account.
    pub fn disable(&self, email: &str) {
        if let Some(mut account) = self.accounts.get_mut(&email.to_lowercase()) {
            account.disabled = true;
        }
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn display_name_of(&self, email: &str) -> Option<String> {
        self.accounts
            .get(&email.to_lowercase())
            .and_then(|a| a.display_name.clone())
    }

    /// Addresses a password reset was requested for, in order.
    pub fn sent_password_resets(&self) -> Vec<String> {
        self.sent_resets
            .lock()
            .map(|resets| resets.clone())
            .unwrap_or_default()
    }
}

fn hash_password(plain: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "argon2 hash_password error");
            AuthError::Unknown("internal-error".to_string())
        })
}

fn verify_password(plain: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "argon2 parse hash error");
            false
        }
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderAccount, AuthError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let key = email.to_lowercase();
        if self.accounts.contains_key(&key) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let account = StoredAccount {
            uid: uuid::Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            password_hash: Some(hash_password(password)?),
            display_name: None,
            photo_url: None,
            disabled: false,
        };
        let provider_account = account.to_provider_account();

        // Re-check under the entry lock so two racing sign-ups cannot both win.
        match self.accounts.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AuthError::EmailAlreadyInUse),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(provider_account)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderAccount, AuthError> {
        if !is_valid_email(email.trim()) {
            return Err(AuthError::InvalidEmail);
        }
        let account = self
            .accounts
            .get(&email.trim().to_lowercase())
            .map(|a| a.clone())
            .ok_or(AuthError::UserNotFound)?;

        if account.disabled {
            return Err(AuthError::UserDisabled);
        }
        match &account.password_hash {
            Some(hash) if verify_password(password, hash) => Ok(account.to_provider_account()),
            _ => Err(AuthError::WrongPassword),
        }
    }

    async fn sign_in_with_google(
        &self,
        google_id_token: &str,
    ) -> Result<ProviderAccount, AuthError> {
        let identity = self
            .google_identities
            .get(google_id_token)
            .map(|i| i.clone())
            .ok_or_else(|| AuthError::from_code("INVALID_IDP_RESPONSE"))?;

        let entry = self
            .accounts
            .entry(identity.email.to_lowercase())
            .or_insert_with(|| StoredAccount {
                uid: uuid::Uuid::new_v4().simple().to_string(),
                email: identity.email.clone(),
                password_hash: None,
                display_name: identity.display_name.clone(),
                photo_url: identity.photo_url.clone(),
                disabled: false,
            });

        if entry.disabled {
            return Err(AuthError::UserDisabled);
        }
        Ok(entry.to_provider_account())
    }

    async fn update_display_name(
        &self,
        account: &ProviderAccount,
        display_name: &str,
    ) -> Result<(), AuthError> {
        let mut stored = self
            .accounts
            .get_mut(&account.email.to_lowercase())
            .ok_or(AuthError::UserNotFound)?;
        stored.display_name = Some(display_name.to_string());
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        if !self.accounts.contains_key(&email.to_lowercase()) {
            return Err(AuthError::UserNotFound);
        }
        if let Ok(mut resets) = self.sent_resets.lock() {
            resets.push(email.to_string());
        }
        tracing::info!(email, "Password reset requested (not sent in memory mode)");
        Ok(())
    }
}
