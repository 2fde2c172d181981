//! Pipeline components: discovery, worker pool, orchestration, error reporting.

pub mod discover;
pub mod error_handler;
pub mod orchestrator;
pub mod pool;

pub use discover::{Discovery, FileDiscoverer, SkippedDirs};
pub use error_handler::{list_failures, report_skipped_dirs};
pub use orchestrator::execute_job;
pub use pool::{DrainReport, PoolConfig, TaskHandler, WorkerPool};
