// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Formation portal API server.
//!
//! Serves the course catalog, the enrollment wizard and the admin console
//! for the training-course website.

use formation_portal::{
    config::{BackendMode, Config},
    db::FirestoreDb,
    models::Category,
    services::{
        enrollment::DRAFT_TTL, AuthStateChange, BlobStorage, FirebaseAuthClient, IdentityProvider,
        MemoryIdentityProvider, MemoryStorage, S3Storage,
    },
    AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often idle wizard drafts are swept.
const DRAFT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Categories available out of the box in memory mode.
const DEMO_CATEGORIES: [&str; 5] = [
    "Développement",
    "Data Science",
    "Cybersécurité",
    "Marketing",
    "Management",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(port = config.port, backend = ?config.backend, "Starting formation portal API");

    let (db, identity, storage): (FirestoreDb, Arc<dyn IdentityProvider>, Arc<dyn BlobStorage>) =
        match config.backend {
            BackendMode::Gcp => {
                let db = FirestoreDb::new(&config.gcp_project_id).await?;
                let identity = FirebaseAuthClient::new(
                    config.firebase_api_key.clone(),
                    config.api_url.clone(),
                );
                let storage = S3Storage::new(
                    &config.storage_endpoint,
                    &config.storage_bucket,
                    &config.storage_access_key,
                    &config.storage_secret_key,
                    &config.storage_region,
                    &config.storage_public_url,
                )
                .await?;
                (db, Arc::new(identity), Arc::new(storage))
            }
            BackendMode::Memory => {
                let db = FirestoreDb::new_in_memory();
                seed_demo_categories(&db).await?;
                tracing::warn!("Running with in-memory backends; nothing is persisted");
                (
                    db,
                    Arc::new(MemoryIdentityProvider::new()),
                    Arc::new(MemoryStorage::new()),
                )
            }
        };

    let state = Arc::new(AppState::new(config.clone(), db, identity, storage));

    spawn_auth_event_logger(&state);
    spawn_draft_sweeper(&state);

    let app = formation_portal::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn seed_demo_categories(db: &FirestoreDb) -> Result<(), Box<dyn std::error::Error>> {
    for (i, name) in DEMO_CATEGORIES.iter().enumerate() {
        db.upsert_category(&Category {
            id: format!("cat-{}", i + 1),
            name: name.to_string(),
        })
        .await?;
    }
    Ok(())
}

/// Log every sign-in state change.
fn spawn_auth_event_logger(state: &Arc<AppState>) {
    let mut events = state.auth.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AuthStateChange::SignedIn { uid }) => {
                    tracing::info!(uid = %uid, event = "signed_in", "Auth state changed")
                }
                Ok(AuthStateChange::SignedOut { uid }) => {
                    tracing::info!(uid = %uid, event = "signed_out", "Auth state changed")
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event logger lagged")
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn spawn_draft_sweeper(state: &Arc<AppState>) {
    let enrollment = state.enrollment.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DRAFT_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let pruned = enrollment.prune_stale(DRAFT_TTL);
            tracing::debug!(pruned, remaining = enrollment.draft_count(), "Draft sweep");
        }
    });
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("formation_portal=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
