// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store used by the `memory` backend and the tests.
//!
//! Documents are kept as JSON values per collection. Reads inject the
//! document ID under `_firestore_id`, the same way the Firestore client does,
//! so models deserialize identically from both backends.

use crate::error::AppError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

const ID_FIELD: &str = "_firestore_id";

/// Documents of every collection, keyed by collection name then document ID.
pub type Collections = HashMap<String, BTreeMap<String, Value>>;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get<T: DeserializeOwned>(&self, col: &str, id: &str) -> Result<Option<T>, AppError> {
        let collections = self.collections.read().await;
        collections
            .get(col)
            .and_then(|docs| docs.get(id))
            .map(|value| decode(id, value))
            .transpose()
    }

    /// Create or replace a document.
    pub async fn set<T: Serialize>(&self, col: &str, id: &str, doc: &T) -> Result<(), AppError> {
        let value = encode(doc)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(col.to_string())
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    /// Returns whether the document existed.
    pub async fn delete(&self, col: &str, id: &str) -> bool {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(col)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false)
    }

    /// Documents of `col` matching `filter`, in document ID order.
    ///
    /// Documents that do not decode as `T` are logged and skipped.
    pub async fn list<T, F>(&self, col: &str, filter: F) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned,
        F: Fn(&Value) -> bool,
    {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(col) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, value)| filter(value))
            .filter_map(|(id, value)| match decode(id, value) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!(collection = col, error = %e, "Skipping undecodable document");
                    None
                }
            })
            .collect())
    }

    pub async fn count<F>(&self, col: &str, filter: F) -> usize
    where
        F: Fn(&Value) -> bool,
    {
        let collections = self.collections.read().await;
        collections
            .get(col)
            .map(|docs| docs.values().filter(|v| filter(v)).count())
            .unwrap_or(0)
    }

    /// Run `f` with exclusive access to every collection.
    ///
    /// Writes made by `f` are only kept when it returns `Ok`.
    pub async fn transaction<R, F>(&self, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut Collections) -> Result<R, AppError>,
    {
        let mut collections = self.collections.write().await;
        let mut staged = collections.clone();
        let result = f(&mut staged)?;
        *collections = staged;
        Ok(result)
    }
}

/// Serialize a model for storage.
pub fn encode<T: Serialize>(doc: &T) -> Result<Value, AppError> {
    serde_json::to_value(doc).map_err(|e| AppError::Database(format!("encode failed: {}", e)))
}

/// Deserialize a stored document, exposing its ID as `_firestore_id`.
pub fn decode<T: DeserializeOwned>(id: &str, value: &Value) -> Result<T, AppError> {
    let mut value = value.clone();
    if let Value::Object(map) = &mut value {
        map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    }
    serde_json::from_value(value).map_err(|e| AppError::Database(format!("decode {} failed: {}", id, e)))
}

/// `doc[field] == expected` for string fields.
pub fn field_eq(doc: &Value, field: &str, expected: &str) -> bool {
    doc.get(field).and_then(Value::as_str) == Some(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        #[serde(rename = "_firestore_id", default, skip_serializing)]
        id: String,
        status: String,
    }

    fn doc(status: &str) -> Doc {
        Doc {
            id: String::new(),
            status: status.to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_injects_document_id() {
        let store = MemoryStore::new();
        store.set("docs", "a1", &doc("active")).await.unwrap();

        let loaded: Doc = store.get("docs", "a1").await.unwrap().unwrap();
        assert_eq!(loaded.id, "a1");
        assert_eq!(loaded.status, "active");

        let missing: Option<Doc> = store.get("docs", "zz").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_and_count_with_filter() {
        let store = MemoryStore::new();
        store.set("docs", "b", &doc("active")).await.unwrap();
        store.set("docs", "a", &doc("active")).await.unwrap();
        store.set("docs", "c", &doc("inactive")).await.unwrap();

        let active: Vec<Doc> = store
            .list("docs", |v| field_eq(v, "status", "active"))
            .await
            .unwrap();
        let ids: Vec<_> = active.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(store.count("docs", |_| true).await, 3);
        assert_eq!(store.count("nothing", |_| true).await, 0);
    }

    #[tokio::test]
    async fn test_list_skips_undecodable_documents() {
        let store = MemoryStore::new();
        store.set("docs", "a", &doc("active")).await.unwrap();
        store
            .set("docs", "b", &serde_json::json!({"status": 42}))
            .await
            .unwrap();

        let docs: Vec<Doc> = store.list("docs", |_| true).await.unwrap();
        assert_eq!(docs, [Doc { id: "a".to_string(), status: "active".to_string() }]);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = MemoryStore::new();
        store.set("docs", "a", &doc("active")).await.unwrap();
        assert!(store.delete("docs", "a").await);
        assert!(!store.delete("docs", "a").await);
    }

    #[tokio::test]
    async fn test_failed_transaction_writes_nothing() {
        let store = MemoryStore::new();
        let result: Result<(), AppError> = store
            .transaction(|cols| {
                cols.entry("docs".to_string())
                    .or_default()
                    .insert("x".to_string(), serde_json::json!({"status": "active"}));
                Err(AppError::Database("boom".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(store.count("docs", |_| true).await, 0);
    }
}
