pub mod stage_executor;
pub mod worker_pool;

pub use stage_executor::{StageOutcome, StageRunner};
pub use worker_pool::{WorkerPermit, WorkerPool};
