// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 web flow: consent URL and code exchange.
//!
//! The ID token obtained here is handed to the identity provider, which
//! verifies it and signs the user in.

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl GoogleOAuthClient {
    pub fn new(client_id: String, client_secret: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            client_id,
            client_secret,
        }
    }

    /// Consent page URL; Google redirects back to `callback_url` with a code.
    pub fn authorize_url(&self, callback_url: &str, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&prompt=select_account",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(callback_url),
            urlencoding::encode("openid email profile"),
            state
        )
    }

    /// Exchange an authorization code for a Google ID token.
    pub async fn exchange_code(&self, code: &str, callback_url: &str) -> anyhow::Result<String> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", callback_url),
            ])
            .send()
            .await
            .context("Google token exchange request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange failed");
            anyhow::bail!("Google token exchange failed with status {}", status);
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Google token response")?;

        tokens
            .id_token
            .context("Google token response has no id_token")
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
}
