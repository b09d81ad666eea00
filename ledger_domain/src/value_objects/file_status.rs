// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Lifecycle status of a [`FileRegistry`](crate::entities::FileRegistry) row.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileStatus {
    Pending,
    Ingested,
    Failed,
    Duplicate,
    /// `synthetic`-prefixed files are recognized and skipped (spec.md
    /// §4.1 edge cases) without ever being marked `Failed`.
    Test,
}
