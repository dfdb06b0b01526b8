//! Dataset Module - Feature Table Persistence
//!
//! Every ingested reading is appended to a flat CSV table
//! (`temp,humidity,gas,motion`) which later feeds model training.
//!
//! # Architecture
//! - `record.rs`: `Reading`, the four-field sensor sample
//! - `store.rs`: `FeatureStore`, append-only writer and full-table loader
//! - `repair.rs`: offline cleanup of a damaged table

pub mod record;
pub mod store;
pub mod repair;


use std::path::PathBuf;

pub use record::Reading;
pub use repair::RepairReport;
pub use store::FeatureStore;

/// Feature table failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Feature table not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
}
