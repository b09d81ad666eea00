// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Ingestion Ports
//!
//! File-format sniffing and CSV/Excel parsing are out of scope (spec.md
//! §1 Non-goals: "assumed to yield a stream of rows with named fields").
//! [`RowSource`] is the boundary S1 depends on instead of a concrete
//! reader; an operator wires a real implementation (csv, calamine, or a
//! fetch from an upstream ingestion service) at the binary's composition
//! root.

use async_trait::async_trait;
use ledger_domain::value_objects::FieldBag;
use ledger_domain::PipelineError;
use std::path::Path;

#[async_trait]
pub trait RowSource: Send + Sync {
    /// Parses every row of `path` into a named-field bag, in file order.
    /// Rows this call can't parse at all (not merely a bad column) should
    /// be omitted rather than padded with an empty bag; a completely
    /// unreadable file should return `Err`.
    async fn read_rows(&self, path: &Path) -> Result<Vec<FieldBag>, PipelineError>;
}
