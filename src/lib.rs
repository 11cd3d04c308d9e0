pub mod aggregator;
pub mod brand;
pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod filters;
pub mod ingestion;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod report;

pub use config::{BucketGranularity, RunConfig};
pub use error::{Result, RollbackError};
pub use pipeline::{compute, EmptyReason, RollbackPipeline, RunOutcome};
pub use report::RollbackReport;
