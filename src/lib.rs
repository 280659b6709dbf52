// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Formation portal: course catalog, enrollment wizard and admin console.
//!
//! This crate provides the backend API behind the training-course website.
//! Durable state lives in hosted services (identity provider, Firestore,
//! blob storage); this service owns validation, sessions and the admin gate.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;
pub mod wizard;

use config::Config;
use db::FirestoreDb;
use services::{
    AdminService, AuthGateway, BlobStorage, CatalogService, EnrollmentService, GoogleOAuthClient,
    IdentityProvider,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub auth: AuthGateway,
    pub catalog: CatalogService,
    pub enrollment: EnrollmentService,
    pub admin: AdminService,
    pub storage: Arc<dyn BlobStorage>,
    pub google_oauth: GoogleOAuthClient,
}

impl AppState {
    /// Wire the services together around the given backends.
    pub fn new(
        config: Config,
        db: FirestoreDb,
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn BlobStorage>,
    ) -> Self {
        let auth = AuthGateway::new(identity, db.clone());
        let catalog = CatalogService::new(db.clone());
        let enrollment = EnrollmentService::new(db.clone(), auth.clone())
            .with_draft_limit(config.max_wizard_drafts);
        let admin = AdminService::new(db.clone(), storage.clone(), catalog.clone());
        let google_oauth = GoogleOAuthClient::new(
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
        );

        Self {
            config,
            db,
            auth,
            catalog,
            enrollment,
            admin,
            storage,
            google_oauth,
        }
    }
}
