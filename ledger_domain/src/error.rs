// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Error
//!
//! A single error enum shared by the domain and application layers. Every
//! stage, service, and repository trait returns `Result<T, PipelineError>`.
//! Variants map directly onto the error taxonomy each stage must honor:
//! row-level errors are counted and never reach this type, chunk-level
//! errors become `ParseError`/`ValidationError`, file-level errors become
//! `ConfigMissing`/`IoError`/`DatabaseError`, and stage-level errors
//! (`BugAssertionFailed`, `DatabaseError` at connect time) abort the run.

use thiserror::Error;

/// The unified error type for the trade-data pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No mapping config exists for a `(country, direction, format)` triple.
    #[error("no mapping configuration for {0}")]
    ConfigMissing(String),

    /// A row could not be parsed per its mapping (bad date, non-numeric
    /// quantity, etc). Aborts the enclosing chunk.
    #[error("parse error: {0}")]
    ParseError(String),

    /// A unique-constraint collision that the caller should treat as
    /// success (idempotent re-insertion of an already-present row).
    #[error("constraint violation (idempotent): {0}")]
    ConstraintViolation(String),

    /// Connection drop, deadlock, or other retryable database failure.
    #[error("transient database error: {0}")]
    TransientDbError(String),

    /// A cooperative cancellation signal was observed mid-task.
    #[error("cancellation requested")]
    CancellationRequested,

    /// An internal invariant was violated (e.g. `year > 2100`). Not
    /// retryable; requires human intervention.
    #[error("internal invariant violated: {0}")]
    BugAssertionFailed(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("io error: {0}")]
    IoError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("timeout after {0:?}")]
    TimeoutError(std::time::Duration),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("metrics error: {0}")]
    MetricsError(String),

    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    #[error("stage {0} not found in run")]
    StageNotFound(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl PipelineError {
    pub fn config_missing(key: impl Into<String>) -> Self {
        Self::ConfigMissing(key.into())
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn database_error(msg: impl Into<String>) -> Self {
        Self::DatabaseError(msg.into())
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter(name.into())
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name: name.into(), reason: reason.into() }
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    pub fn metrics_error(msg: impl Into<String>) -> Self {
        Self::MetricsError(msg.into())
    }

    pub fn cancelled() -> Self {
        Self::CancellationRequested
    }

    /// True for errors the chunk-level [`RetryPolicy`](crate::services::retry::RetryPolicy)
    /// should retry with backoff rather than surface immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientDbError(_) | Self::TimeoutError(_))
    }

    /// True when the caller should treat this as a successful no-op rather
    /// than an error (idempotent re-insert).
    pub fn is_idempotent_noop(&self) -> bool {
        matches!(self, Self::ConstraintViolation(_))
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
