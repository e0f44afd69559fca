//! Error types for the collaborator implementations

use specmatrix_core::FetchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport-level failure talking to the remote API
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },

    /// Response body did not have the expected shape
    #[error("unexpected response from {url}: {detail}")]
    Decode { url: String, detail: String },

    #[error("invalid repository identifier: {0}")]
    InvalidRepo(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Http(err.to_string())
    }
}

impl From<SourceError> for FetchError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Http(detail) => FetchError::Http(detail),
            SourceError::Status { status, url } => FetchError::Status { status, url },
            SourceError::Decode { url, detail } => {
                FetchError::Decode(format!("{url}: {detail}"))
            }
            SourceError::InvalidRepo(repo) => {
                FetchError::InvalidTarget(format!("repository identifier {repo}"))
            }
            SourceError::Io(e) => FetchError::Io(e),
        }
    }
}
