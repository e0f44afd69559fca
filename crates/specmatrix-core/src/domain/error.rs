//! Error taxonomy for the reconciliation engine.
//!
//! Fatal errors (`CatalogError`, `JunitError` on fetched data) abort the whole
//! run. `FetchError` is per-SDK recoverable and never escapes the aggregator.

use std::path::PathBuf;

/// Errors raised while building a vector catalog from disk.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("vector corpus root does not exist: {0}")]
    RootMissing(PathBuf),

    #[error("vector corpus root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to traverse vector corpus at {path}: {detail}")]
    Walk { path: PathBuf, detail: String },
}

/// Errors raised while parsing a JUnit XML document into suites.
#[derive(Debug, thiserror::Error)]
pub enum JunitError {
    #[error("malformed junit xml in {document} at byte {position}: {detail}")]
    Malformed {
        document: String,
        position: u64,
        detail: String,
    },

    #[error("junit document {document} contains no test suites or test cases")]
    Empty { document: String },
}

/// Errors raised by an external collaborator while fetching SDK data.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no artifact available for sdk {sdk}: {reason}")]
    ArtifactUnavailable { sdk: String, reason: String },

    #[error("remote request failed: {0}")]
    Http(String),

    #[error("remote returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("failed to decode remote payload: {0}")]
    Decode(String),

    /// `target` names the SDK or repository the call was made for.
    #[error("fetch deadline of {secs}s exceeded for {target}")]
    DeadlineExceeded { target: String, secs: u64 },

    #[error("invalid fetch target: {0}")]
    InvalidTarget(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Syntax(#[from] toml::de::Error),

    #[error("invalid {field} pattern for sdk {sdk}: {detail}")]
    InvalidPattern {
        sdk: String,
        field: &'static str,
        detail: String,
    },

    #[error("sdk {sdk} targets domain {domain} but no corpus is configured for it")]
    MissingCorpus { sdk: String, domain: String },

    #[error("duplicate sdk name in config: {0}")]
    DuplicateSdk(String),
}

/// Errors that abort a whole compliance run.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("vector catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),

    #[error("artifact for sdk {sdk} was fetched but could not be parsed: {source}")]
    Parse {
        sdk: String,
        #[source]
        source: JunitError,
    },

    #[error("no vector catalog loaded for domain {0}")]
    MissingCatalog(String),
}

/// Result alias for fatal run-level operations.
pub type Result<T> = std::result::Result<T, AggregateError>;
