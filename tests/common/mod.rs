// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use formation_portal::config::Config;
use formation_portal::db::{FirestoreDb, MemoryStore};
use formation_portal::models::{Formation, FormationStatus, Role, UserProfile};
use formation_portal::routes::create_router;
use formation_portal::services::{MemoryIdentityProvider, MemoryStorage};
use formation_portal::AppState;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// App wired to in-memory backends, with handles on each of them.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub db: FirestoreDb,
    /// Raw documents behind `db` (unused by the offline app)
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentityProvider>,
    pub storage: Arc<MemoryStorage>,
}

#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    create_test_app_with_db(FirestoreDb::with_store(store.clone()), store)
}

/// Create a test app whose database calls all fail.
#[allow(dead_code)]
pub fn create_offline_app() -> TestApp {
    create_test_app_with_db(FirestoreDb::new_mock(), Arc::new(MemoryStore::new()))
}

fn create_test_app_with_db(db: FirestoreDb, store: Arc<MemoryStore>) -> TestApp {
    let identity = Arc::new(MemoryIdentityProvider::new());
    let storage = Arc::new(MemoryStorage::new());
    let state = Arc::new(AppState::new(
        Config::test_default(),
        db.clone(),
        identity.clone(),
        storage.clone(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        db,
        store,
        identity,
        storage,
    }
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    signed_test_jwt(uid, signing_key, 86400)
}

/// Create a test JWT token that expired an hour ago.
#[allow(dead_code)]
pub fn create_expired_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    signed_test_jwt(uid, signing_key, -3600)
}

fn signed_test_jwt(uid: &str, signing_key: &[u8], ttl_secs: i64) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: uid.to_string(),
        exp: (now + ttl_secs) as usize,
        iat: (now - 7200) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn test_formation(id: &str, places: i64) -> Formation {
    Formation {
        id: id.to_string(),
        title: format!("Formation {}", id),
        category: "Développement".to_string(),
        description: "Apprenez à construire des applications web modernes.".to_string(),
        duration: 35,
        places,
        price: 1200.0,
        status: FormationStatus::Active,
        image_url: None,
        content: None,
        prerequisites: None,
        format: None,
        inscription_count: 0,
        created_at: "2026-01-10T09:00:00Z".to_string(),
        updated_at: "2026-01-10T09:00:00Z".to_string(),
    }
}

#[allow(dead_code)]
pub async fn seed_formation(db: &FirestoreDb, id: &str, places: i64) -> Formation {
    let formation = test_formation(id, places);
    db.upsert_formation(&formation).await.unwrap();
    formation
}

/// Store a profile with the given role; returns a session token for it.
#[allow(dead_code)]
pub async fn seed_user(app: &TestApp, uid: &str, role: Role) -> String {
    let mut profile = UserProfile::new(
        uid,
        &format!("{}@example.fr", uid),
        "Camille",
        "Martin",
        "2026-01-01T00:00:00Z",
    );
    profile.role = role;
    app.db.upsert_user(&profile).await.unwrap();
    create_test_jwt(uid, &app.state.config.jwt_signing_key)
}

/// Read a whole response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
