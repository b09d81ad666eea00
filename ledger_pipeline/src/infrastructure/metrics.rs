// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics
//!
//! Internal counters only — not wired to an HTTP endpoint (spec.md §6:
//! "the core writes exclusively to database tables; it does not speak any
//! wire protocol"). `pipeline_runs` remains the sole structured-output
//! surface; these Prometheus counters exist for an operator who wants to
//! scrape the process directly, not for an externally exposed `/metrics`
//! route.

pub mod service;

pub use service::MetricsService;
