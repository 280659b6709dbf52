// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session/identity gateway.
//!
//! Wraps the identity provider with profile bookkeeping in Firestore and
//! publishes sign-in state changes to interested subscribers.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{PersonalInfo, UserProfile};
use crate::services::identity::{IdentityProvider, ProviderAccount};
use crate::time_utils::now_rfc3339;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const GENERATED_PASSWORD_RANDOM_LEN: usize = 8;
/// Appended to generated passwords so they satisfy common complexity rules.
const GENERATED_PASSWORD_SUFFIX: &str = "A1!";

/// Sign-in state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateChange {
    SignedIn { uid: String },
    SignedOut { uid: String },
}

/// Signed-in account as seen by the rest of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Account {
    fn from_provider(account: &ProviderAccount) -> Self {
        Self {
            uid: account.uid.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
            photo_url: account.photo_url.clone(),
        }
    }

    /// Account for a profile document (session requests).
    pub fn from_profile(profile: &UserProfile) -> Self {
        let display_name = profile.display_name();
        Self {
            uid: profile.uid.clone(),
            email: profile.email.clone(),
            display_name: (!display_name.is_empty()).then_some(display_name),
            photo_url: profile.photo_url.clone(),
        }
    }
}

/// Session/identity gateway.
#[derive(Clone)]
pub struct AuthGateway {
    identity: Arc<dyn IdentityProvider>,
    db: FirestoreDb,
    events: broadcast::Sender<AuthStateChange>,
}

impl AuthGateway {
    pub fn new(identity: Arc<dyn IdentityProvider>, db: FirestoreDb) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            identity,
            db,
            events,
        }
    }

    /// Receive every sign-in and sign-out from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthStateChange> {
        self.events.subscribe()
    }

    fn publish(&self, change: AuthStateChange) {
        // No subscriber is fine.
        let _ = self.events.send(change);
    }

    /// Create an account and its profile (`role = user`).
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        prenom: &str,
        nom: &str,
    ) -> Result<Account, AppError> {
        let provider_account = self.identity.sign_up(email, password).await?;

        let profile = UserProfile::new(&provider_account.uid, &provider_account.email, prenom, nom, &now_rfc3339());
        let display_name = profile.display_name();
        self.identity
            .update_display_name(&provider_account, &display_name)
            .await?;
        self.db.upsert_user(&profile).await?;

        tracing::info!(uid = %provider_account.uid, "Account registered");

        let mut account = Account::from_provider(&provider_account);
        account.display_name = Some(display_name);
        self.publish(AuthStateChange::SignedIn {
            uid: account.uid.clone(),
        });
        Ok(account)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let provider_account = self.identity.sign_in(email, password).await?;
        let mut account = Account::from_provider(&provider_account);

        if account.display_name.is_none() {
            if let Some(profile) = self.db.get_user(&account.uid).await? {
                account.display_name = Account::from_profile(&profile).display_name;
            }
        }

        tracing::info!(uid = %account.uid, "Signed in");
        self.publish(AuthStateChange::SignedIn {
            uid: account.uid.clone(),
        });
        Ok(account)
    }

    /// Sign in with a Google ID token; creates the profile on first login.
    pub async fn login_federated(&self, google_id_token: &str) -> Result<Account, AppError> {
        let provider_account = self.identity.sign_in_with_google(google_id_token).await?;

        if self.db.get_user(&provider_account.uid).await?.is_none() {
            let profile = UserProfile::from_display_name(
                &provider_account.uid,
                &provider_account.email,
                provider_account.display_name.as_deref(),
                provider_account.photo_url.as_deref(),
                &now_rfc3339(),
            );
            self.db.upsert_user(&profile).await?;
            tracing::info!(uid = %provider_account.uid, "Profile created on first federated sign-in");
        }

        let account = Account::from_provider(&provider_account);
        self.publish(AuthStateChange::SignedIn {
            uid: account.uid.clone(),
        });
        Ok(account)
    }

    /// End the session of `uid`. The cookie itself is cleared by the route.
    pub fn logout(&self, uid: &str) {
        tracing::info!(uid, "Signed out");
        self.publish(AuthStateChange::SignedOut {
            uid: uid.to_string(),
        });
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AppError> {
        self.identity.send_password_reset(email.trim()).await?;
        Ok(())
    }

    pub async fn profile(&self, uid: &str) -> Result<Option<UserProfile>, AppError> {
        self.db.get_user(uid).await
    }

    /// Account created on behalf of a visitor submitting the enrollment form.
    ///
    /// Uses a generated password and sends a password reset email so the
    /// visitor can choose their own.
    pub async fn create_enrollment_account(
        &self,
        personal: &PersonalInfo,
    ) -> Result<Account, AppError> {
        let password = generate_password();
        let provider_account = self.identity.sign_up(&personal.email, &password).await?;

        let profile = UserProfile::from_personal_info(&provider_account.uid, personal, &now_rfc3339());
        let display_name = profile.display_name();
        self.identity
            .update_display_name(&provider_account, &display_name)
            .await?;
        self.db.upsert_user(&profile).await?;
        self.identity
            .send_password_reset(&provider_account.email)
            .await?;

        tracing::info!(uid = %provider_account.uid, "Account created from enrollment form");

        let mut account = Account::from_provider(&provider_account);
        account.display_name = Some(display_name);
        self.publish(AuthStateChange::SignedIn {
            uid: account.uid.clone(),
        });
        Ok(account)
    }
}

/// Eight random alphanumerics followed by `A1!`.
pub fn generate_password() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", random, GENERATED_PASSWORD_SUFFIX)
}
