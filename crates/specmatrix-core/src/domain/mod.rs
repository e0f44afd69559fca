//! Domain model for the compliance matrix.
//!
//! - `SdkDescriptor`: immutable per-SDK configuration and naming patterns
//! - `ConformanceReport` / `ResultEntry`: the reconciled result matrix
//! - `DriftRecord`: how far an SDK's pinned corpus lags the corpus head

pub mod error;
pub mod report;
pub mod sdk;

pub use error::{AggregateError, CatalogError, ConfigError, FetchError, JunitError, Result};
pub use report::{
    ConformanceReport, DriftPosition, DriftRecord, EntryStatus, FailureCause, ResultEntry,
};
pub use sdk::{Domain, ExtractionStrategy, SdkDescriptor, VectorLayout};
