//! Concrete collaborators for `specmatrix-core`.
//!
//! - [`GithubHistorySource`]: corpus commit history and pinned submodule
//!   commits over the GitHub REST API
//! - [`DirectoryArtifactFetcher`]: SDK test artifacts already downloaded and
//!   extracted to disk

pub mod error;
pub mod github;
pub mod local;

pub use error::SourceError;
pub use github::{GithubConfig, GithubHistorySource};
pub use local::DirectoryArtifactFetcher;
