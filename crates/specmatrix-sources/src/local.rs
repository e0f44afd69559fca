//! Artifact fetcher over a directory of extracted CI artifacts.
//!
//! Layout: `<root>/<sdk name>/**/*.xml`, one tree per SDK.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use specmatrix_core::{Artifact, ArtifactDocument, ArtifactFetcher, FetchError, SdkDescriptor};
use tracing::debug;
use walkdir::WalkDir;

const REPORT_EXTENSION: &str = "xml";

pub struct DirectoryArtifactFetcher {
    root: PathBuf,
}

impl DirectoryArtifactFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sdk_dir(&self, sdk: &SdkDescriptor) -> PathBuf {
        self.root.join(&sdk.name)
    }
}

fn unavailable(sdk: &SdkDescriptor, reason: String) -> FetchError {
    FetchError::ArtifactUnavailable {
        sdk: sdk.name.clone(),
        reason,
    }
}

fn report_files(dir: &Path) -> Result<Vec<PathBuf>, FetchError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| FetchError::Io(e.into()))?;
        let is_report = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(REPORT_EXTENSION));
        if is_report {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[async_trait]
impl ArtifactFetcher for DirectoryArtifactFetcher {
    async fn fetch(&self, sdk: &SdkDescriptor) -> Result<Artifact, FetchError> {
        let dir = self.sdk_dir(sdk);
        if !dir.is_dir() {
            return Err(unavailable(
                sdk,
                format!("no artifact directory at {}", dir.display()),
            ));
        }

        let files = report_files(&dir)?;
        if files.is_empty() {
            return Err(unavailable(
                sdk,
                format!("no xml reports under {}", dir.display()),
            ));
        }

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let bytes = tokio::fs::read(&path).await?;
            let name = path
                .strip_prefix(&dir)
                .unwrap_or(&path)
                .display()
                .to_string();
            documents.push(ArtifactDocument { name, bytes });
        }

        debug!(
            sdk = %sdk.name,
            artifact = %sdk.artifact_name,
            documents = documents.len(),
            "artifact loaded from disk"
        );
        Ok(Artifact { documents })
    }
}
