// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Watermark Repository

use crate::entities::Watermark;
use crate::PipelineError;
use async_trait::async_trait;

#[async_trait]
pub trait WatermarkRepository: Send + Sync {
    /// Returns a never-consumed watermark (`consumed_through = None`) if
    /// `job_name` has no row yet, rather than an error.
    async fn get(&self, job_name: &'static str) -> Result<Watermark, PipelineError>;

    /// Only called on a successful builder run (spec.md §4.6: "failures
    /// leave the watermark unchanged").
    async fn advance(&self, watermark: &Watermark) -> Result<(), PipelineError>;
}
