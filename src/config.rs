// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup. In `memory` backend mode every secret
//! falls back to a development value so the service runs with no cloud
//! credentials at all.

use std::env;

/// Which set of backends the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Firestore, the hosted identity provider and S3-compatible storage.
    Gcp,
    /// Everything in-process (local development, demos).
    Memory,
}

impl BackendMode {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gcp" => Ok(Self::Gcp),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid("BACKEND_MODE")),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Backend selection
    pub backend: BackendMode,
    /// Frontend URL for redirects and CORS
    pub frontend_url: String,
    /// Public URL of this API (OAuth callback base)
    pub api_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Blob storage bucket
    pub storage_bucket: String,
    /// S3-compatible endpoint
    pub storage_endpoint: String,
    /// Blob storage region
    pub storage_region: String,
    /// Base URL under which uploaded objects are publicly readable
    pub storage_public_url: String,
    /// Open enrollment wizards kept in memory at most
    pub max_wizard_drafts: usize,

    // --- Secrets ---
    /// Identity provider web API key
    pub firebase_api_key: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Blob storage access key
    pub storage_access_key: String,
    /// Blob storage secret key
    pub storage_secret_key: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            backend: BackendMode::Memory,
            frontend_url: "http://localhost:5173".to_string(),
            api_url: "http://localhost:8080".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            google_client_id: "test_google_client_id".to_string(),
            storage_bucket: "formations-test".to_string(),
            storage_endpoint: "http://localhost:9000".to_string(),
            storage_region: "us-east-1".to_string(),
            storage_public_url: "http://localhost:9000/formations-test".to_string(),
            max_wizard_drafts: 100,
            firebase_api_key: "test_api_key".to_string(),
            google_client_secret: "test_google_secret".to_string(),
            storage_access_key: "test_access".to_string(),
            storage_secret_key: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let backend = match env::var("BACKEND_MODE") {
            Ok(raw) => BackendMode::parse(&raw)?,
            Err(_) => BackendMode::Gcp,
        };

        // In memory mode nothing leaves the process, so secrets are optional.
        let secret = |name: &'static str, dev_default: &str| -> Result<String, ConfigError> {
            match env::var(name) {
                Ok(v) => Ok(v.trim().to_string()),
                Err(_) if backend == BackendMode::Memory => Ok(dev_default.to_string()),
                Err(_) => Err(ConfigError::Missing(name)),
            }
        };

        let storage_bucket = env::var("STORAGE_BUCKET").unwrap_or_else(|_| "formations".to_string());
        let storage_endpoint = env::var("STORAGE_ENDPOINT")
            .unwrap_or_else(|_| "https://storage.googleapis.com".to_string());
        let storage_public_url = env::var("STORAGE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("{}/{}", storage_endpoint, storage_bucket));

        Ok(Self {
            backend,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            api_url: env::var("API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            google_client_id: secret("GOOGLE_CLIENT_ID", "local-google-client")?,
            storage_bucket,
            storage_endpoint,
            storage_region: env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".to_string()),
            storage_public_url,
            max_wizard_drafts: env::var("MAX_WIZARD_DRAFTS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(crate::services::enrollment::MAX_DRAFTS),

            firebase_api_key: secret("FIREBASE_API_KEY", "local-api-key")?,
            google_client_secret: secret("GOOGLE_CLIENT_SECRET", "local-google-secret")?,
            storage_access_key: secret("STORAGE_ACCESS_KEY", "local-access")?,
            storage_secret_key: secret("STORAGE_SECRET_KEY", "local-secret")?,
            jwt_signing_key: secret("JWT_SIGNING_KEY", "local_jwt_key_32_bytes_minimum!!")?
                .into_bytes(),
            oauth_state_key: secret("OAUTH_STATE_KEY", "local_oauth_state_key")?.into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
