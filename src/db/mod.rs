//! Database layer (Firestore, or in-process documents for local mode).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FORMATIONS: &str = "formations";
    pub const INSCRIPTIONS: &str = "inscriptions";
    pub const CATEGORIES: &str = "categories";
    /// Admin activity feed (written elsewhere)
    pub const ACTIVITY: &str = "activity";
    /// Payments (written by the payment provider integration)
    pub const PAYMENTS: &str = "paiements";
}
