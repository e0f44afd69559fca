//! specmatrix core library
//!
//! Builds a cross-SDK compliance matrix from a canonical test-vector corpus
//! and each SDK's raw test output, and measures how far each SDK's pinned
//! copy of the corpus lags its head.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod drift;
pub mod extract;
pub mod junit;
pub mod obs;
pub mod reconcile;
pub mod reporting;
pub mod telemetry;

pub use aggregate::{
    select_vector_suites, Artifact, ArtifactDocument, ArtifactFetcher, ComplianceRun,
    ReportAggregator, SdkCompliance,
};
pub use catalog::{parse_vector_path, pascal_case, CatalogSet, VectorCorpus};
pub use config::{ComplianceConfig, CorpusConfig, RunConfig};
pub use domain::{
    AggregateError, CatalogError, ConfigError, ConformanceReport, Domain, DriftPosition,
    DriftRecord, EntryStatus, ExtractionStrategy, FailureCause, FetchError, JunitError, Result,
    ResultEntry, SdkDescriptor, VectorLayout,
};
pub use drift::{commits_behind, CorpusHistorySource, DriftDetector};
pub use extract::{extract, ExtractedResult};
pub use junit::{parse_junit, JunitParser, RawSuite, RawTestCase, SuiteParser};
pub use reconcile::reconcile;
pub use reporting::{
    render_compliance_md, write_compliance_json, write_compliance_md, ComplianceArtifact,
    ComplianceSummary,
};
pub use telemetry::init_tracing;

/// Crate version, surfaced by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
