// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Pool
//!
//! Bounds how many files/chunks a stage processes concurrently (spec.md
//! §5: "bounded worker pool, default N = CPU core count"). Unlike the
//! teacher's [`GlobalResourceManager`](crate::infrastructure::runtime::resource_manager),
//! there is no separate CPU/IO token split here — every stage is
//! dominated by database round-trips, with S2's column transforms
//! off-loaded to the rayon pool instead of competing for this semaphore.

use ledger_domain::value_objects::WorkerCount;
use ledger_domain::PipelineError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A single acquired slot. Dropping it releases the slot back to the pool.
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
}

#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    pub fn new(workers: WorkerCount) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(workers.get())), capacity: workers.get() }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Waits for a free slot. Only fails if the pool itself has been
    /// torn down, which never happens during normal operation.
    pub async fn acquire(&self) -> Result<WorkerPermit, PipelineError> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| PipelineError::resource_exhausted(format!("worker pool closed: {e}")))?;
        Ok(WorkerPermit { _permit: permit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn limits_concurrent_holders_to_capacity() {
        let pool = WorkerPool::new(WorkerCount::new(2).unwrap());
        let _p1 = pool.acquire().await.unwrap();
        let _p2 = pool.acquire().await.unwrap();
        assert_eq!(pool.available_permits(), 0);
    }

    #[tokio::test]
    async fn releasing_a_permit_frees_a_slot() {
        let pool = WorkerPool::new(WorkerCount::new(1).unwrap());
        {
            let _p1 = pool.acquire().await.unwrap();
            assert_eq!(pool.available_permits(), 0);
        }
        assert_eq!(pool.available_permits(), 1);
    }
}
