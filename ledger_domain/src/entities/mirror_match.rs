// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mirror Match Entity
//!
//! One record per matched export (spec.md §3, §4.5). At most one per
//! export, enforced by a unique index on `export_transaction_id` at the
//! storage layer and by [`MirrorScore`](crate::services::mirror_scoring::MirrorScore)
//! at the decision layer.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorMatch {
    id: Uuid,
    export_transaction_id: Uuid,
    import_transaction_id: Uuid,
    score: f64,
    breakdown: Json,
}

impl MirrorMatch {
    pub fn new(export_transaction_id: Uuid, import_transaction_id: Uuid, score: f64, breakdown: Json) -> Self {
        Self { id: Uuid::new_v4(), export_transaction_id, import_transaction_id, score, breakdown }
    }

    /// Reconstructs a match from persisted columns (infrastructure only).
    pub fn from_parts(id: Uuid, export_transaction_id: Uuid, import_transaction_id: Uuid, score: f64, breakdown: Json) -> Self {
        Self { id, export_transaction_id, import_transaction_id, score, breakdown }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn export_transaction_id(&self) -> Uuid {
        self.export_transaction_id
    }
    pub fn import_transaction_id(&self) -> Uuid {
        self.import_transaction_id
    }
    pub fn score(&self) -> f64 {
        self.score
    }
    pub fn breakdown(&self) -> &Json {
        &self.breakdown
    }
}
