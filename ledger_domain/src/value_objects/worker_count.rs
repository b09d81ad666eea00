// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Count Value Object
//!
//! Bounds the size of the bounded worker pool each stage partitions its
//! work across (spec.md §5: "bounded worker pool (default N = number of
//! CPU cores)"). Kept as its own validated newtype rather than a bare
//! `usize` so call sites can't accidentally pass a pool size of zero.

use crate::PipelineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerCount(usize);

impl WorkerCount {
    pub const MAX: usize = 1024;

    pub fn new(count: usize) -> Result<Self, PipelineError> {
        if count == 0 || count > Self::MAX {
            return Err(PipelineError::invalid_parameter(
                "worker_count",
                format!("must be between 1 and {}, got {count}", Self::MAX),
            ));
        }
        Ok(Self(count))
    }

    /// One worker per available CPU core (spec.md §5 default).
    pub fn cpu_default() -> Self {
        Self(std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4))
    }

    pub fn get(&self) -> usize {
        self.0
    }

    /// Database pool size is `worker count * 2` per spec.md §5.
    pub fn db_pool_size(&self) -> u32 {
        (self.0 * 2) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero() {
        assert!(WorkerCount::new(0).is_err());
    }

    #[test]
    fn pool_size_doubles_worker_count() {
        let wc = WorkerCount::new(4).unwrap();
        assert_eq!(wc.db_pool_size(), 8);
    }
}
