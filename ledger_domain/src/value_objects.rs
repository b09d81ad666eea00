// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Objects
//!
//! Immutable, validated types with no identity of their own. Anything
//! that can be wrong about a primitive (a negative weight, an
//! out-of-range chunk size, an unrecognized direction) is pushed into a
//! constructor here instead of being checked again at every call site.

pub mod chunk_size;
pub mod country_code;
pub mod direction;
pub mod field_bag;
pub mod file_status;
pub mod hs_code;
pub mod money;
pub mod org_type;
pub mod risk_level;
pub mod run_status;
pub mod scope_key;
pub mod source_format;
pub mod worker_count;

pub use chunk_size::ChunkSize;
pub use country_code::CountryCode;
pub use direction::Direction;
pub use field_bag::{FieldAccessError, FieldBag, FieldValue};
pub use file_status::FileStatus;
pub use hs_code::HsCode6;
pub use money::{Kilograms, PriceUsdPerKg, UsdAmount};
pub use org_type::{OrgRole, OrgType};
pub use risk_level::RiskLevel;
pub use run_status::RunStatus;
pub use scope_key::ScopeKey;
pub use source_format::SourceFormat;
pub use worker_count::WorkerCount;
