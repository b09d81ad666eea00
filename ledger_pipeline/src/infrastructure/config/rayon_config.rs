// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Rayon Thread Pool Configuration
//!
//! S2's column-slice transforms (`parse_date_column`, `apply_unit_factor`,
//! `multiply_by_rate`, `compute_price_per_kg`, ...) are the only CPU-bound
//! work in this pipeline (spec.md §4.2, §9 "vectorized operation list");
//! everything else is `tokio`-driven I/O against Postgres. One pool, sized
//! by `WorkerCount::cpu_default()`, is enough — there's no mixed-workload
//! distinction to make.

use ledger_domain::value_objects::WorkerCount;
use ledger_domain::PipelineError;
use std::sync::Arc;

pub struct RayonPoolManager {
    pool: Arc<rayon::ThreadPool>,
}

impl RayonPoolManager {
    pub fn new(workers: WorkerCount) -> Result<Self, PipelineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.get())
            .thread_name(|i| format!("rayon-transform-{i}"))
            .build()
            .map_err(|e| PipelineError::internal_error(format!("failed to create rayon pool: {e}")))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub fn pool(&self) -> &Arc<rayon::ThreadPool> {
        &self.pool
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}
