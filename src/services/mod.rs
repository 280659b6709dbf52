// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod enrollment;
pub mod firebase_auth;
pub mod google_oauth;
pub mod identity;
pub mod memory_identity;
pub mod storage;

pub use admin::{AdminService, CategoryOption, FormationInput};
pub use auth::{Account, AuthGateway, AuthStateChange};
pub use catalog::CatalogService;
pub use enrollment::{EnrollmentService, StepRequest, SubmissionOutcome, WizardView};
pub use firebase_auth::FirebaseAuthClient;
pub use google_oauth::GoogleOAuthClient;
pub use identity::{AuthError, IdentityProvider, ProviderAccount};
pub use memory_identity::MemoryIdentityProvider;
pub use storage::{BlobStorage, ImageUpload, MemoryStorage, S3Storage};
