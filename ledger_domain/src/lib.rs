// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Ledger Domain
//!
//! The pure business-logic core of the trade-data ETL pipeline: entities,
//! value objects, domain services, and the repository traits that
//! describe (without implementing) how each entity is persisted.
//!
//! This crate has no knowledge of PostgreSQL, `tokio`, or `tracing` — see
//! the module-level notes on [`Cargo.toml`](../Cargo.toml) for why each of
//! those is deliberately absent. Everything here is synchronous, pure, or
//! an `async_trait` contract that infrastructure fulfills.

pub mod entities;
pub mod repositories;
pub mod services;
pub mod value_objects;

mod error;
pub use error::PipelineError;
