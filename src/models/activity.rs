// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Admin activity feed entries. Written by other systems, read here.

use serde::{Deserialize, Serialize};

/// Entry of the `activity` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    #[serde(rename = "_firestore_id", default, skip_serializing)]
    pub id: String,
    pub message: String,
    /// Font Awesome icon name without the `fa-` prefix
    #[serde(default)]
    pub icon: Option<String>,
    /// When it happened (ISO 8601)
    #[serde(default)]
    pub timestamp: String,
}
