// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity Toolkit REST client (Firebase Authentication).
//!
//! Handles:
//! - Email/password sign-up and sign-in
//! - Google sign-in from an ID token (`accounts:signInWithIdp`)
//! - Display name updates
//! - Password reset emails

use crate::services::identity::{AuthError, IdentityProvider, ProviderAccount};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity Toolkit client.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// `requestUri` sent with federated sign-ins
    request_uri: String,
}

impl FirebaseAuthClient {
    /// Create a client for the given web API key.
    ///
    /// For local development with the auth emulator, set
    /// FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(api_key: String, request_uri: String) -> Self {
        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => format!("http://{}/identitytoolkit.googleapis.com/v1", host),
            Err(_) => DEFAULT_BASE_URL.to_string(),
        };

        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url,
            api_key,
            request_uri,
        }
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, AuthError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/accounts:{}", self.base_url, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(method, error = %e, "Identity provider request failed");
                AuthError::NetworkRequestFailed
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            tracing::info!(method, status = %status, code = %code, "Identity provider rejected request");
            return Err(AuthError::from_code(&code));
        }

        response.json().await.map_err(|e| {
            tracing::error!(method, error = %e, "Failed to parse identity provider response");
            AuthError::Unknown("invalid-response".to_string())
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<ProviderAccount, AuthError> {
        let response: AccountResponse = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(response.into_account(email))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderAccount, AuthError> {
        let response: AccountResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(response.into_account(email))
    }

    async fn sign_in_with_google(
        &self,
        google_id_token: &str,
    ) -> Result<ProviderAccount, AuthError> {
        let post_body = format!(
            "id_token={}&providerId=google.com",
            urlencoding::encode(google_id_token)
        );
        let response: AccountResponse = self
            .call(
                "signInWithIdp",
                &IdpRequest {
                    post_body: &post_body,
                    request_uri: &self.request_uri,
                    return_idp_credential: true,
                    return_secure_token: true,
                },
            )
            .await?;
        Ok(response.into_account(""))
    }

    async fn update_display_name(
        &self,
        account: &ProviderAccount,
        display_name: &str,
    ) -> Result<(), AuthError> {
        let _: serde_json::Value = self
            .call(
                "update",
                &serde_json::json!({
                    "idToken": account.id_token,
                    "displayName": display_name,
                    "returnSecureToken": false,
                }),
            )
            .await?;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let _: serde_json::Value = self
            .call(
                "sendOobCode",
                &serde_json::json!({
                    "requestType": "PASSWORD_RESET",
                    "email": email,
                }),
            )
            .await?;
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: &'a str,
    request_uri: &'a str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

/// Subset of the sign-up/sign-in response we use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    id_token: String,
}

impl AccountResponse {
    fn into_account(self, fallback_email: &str) -> ProviderAccount {
        ProviderAccount {
            uid: self.local_id,
            email: self
                .email
                .unwrap_or_else(|| fallback_email.to_string()),
            display_name: self.display_name.filter(|n| !n.is_empty()),
            photo_url: self.photo_url.filter(|u| !u.is_empty()),
            id_token: self.id_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
