// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Payment records (`paiements`), read for the revenue counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Payment document. Only `completed` payments count as revenue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub status: String,
    /// Amount in euros; stored as a number or a numeric string
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    /// Payment date, a Firestore timestamp
    #[serde(
        default,
        serialize_with = "firestore::serialize_as_optional_timestamp::serialize",
        deserialize_with = "lenient_date"
    )]
    pub date: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

/// Accept `12.5`, `"12.5"` or garbage (counted as zero).
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(n) => n,
        RawAmount::Text(s) => s.trim().parse().unwrap_or(0.0),
        RawAmount::Other(_) => 0.0,
    })
}

/// Timestamps reach us as RFC 3339 text; anything else leaves the date unset.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match RawDate::deserialize(deserializer)? {
        RawDate::Text(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        RawDate::Other(_) => None,
    })
}
