//! Submodule drift: how many corpus commits each SDK's pinned copy lags.
//!
//! Each domain's commit history is fetched at most once per run and shared by
//! every SDK of that domain. A pinned commit that cannot be read, or that is
//! absent from the fetched window, yields [`DriftPosition::Unknown`], never zero.
//!
//! [`DriftPosition::Unknown`]: crate::domain::report::DriftPosition::Unknown

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::CorpusConfig;
use crate::domain::error::FetchError;
use crate::domain::report::DriftRecord;
use crate::domain::sdk::{Domain, SdkDescriptor};
use crate::obs;

/// Remote view of corpus repositories and the SDK repos embedding them.
#[async_trait]
pub trait CorpusHistorySource: Send + Sync {
    /// Commit hashes of `repo` at `branch`, newest first.
    async fn commit_history(&self, repo: &str, branch: &str) -> Result<Vec<String>, FetchError>;

    /// Commit pinned at `submodule_path` inside `sdk_repo`, `None` if absent.
    async fn pinned_commit(
        &self,
        sdk_repo: &str,
        submodule_path: &str,
    ) -> Result<Option<String>, FetchError>;
}

/// Index of `pinned` in a newest-first history; 0 means up to date.
pub fn commits_behind(history: &[String], pinned: &str) -> Option<usize> {
    history
        .iter()
        .position(|sha| sha.eq_ignore_ascii_case(pinned))
}

/// Computes [`DriftRecord`]s for a set of SDKs.
pub struct DriftDetector {
    source: Arc<dyn CorpusHistorySource>,
    deadline: Option<Duration>,
}

impl DriftDetector {
    pub fn new(source: Arc<dyn CorpusHistorySource>) -> Self {
        Self {
            source,
            deadline: None,
        }
    }

    /// Bound every remote call by `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Drift for every SDK, keyed by SDK name.
    pub async fn detect(
        &self,
        sdks: &[SdkDescriptor],
        corpora: &[CorpusConfig],
    ) -> BTreeMap<String, DriftRecord> {
        let mut records = BTreeMap::new();
        for domain in Domain::ALL {
            let members: Vec<&SdkDescriptor> =
                sdks.iter().filter(|sdk| sdk.domain == domain).collect();
            if members.is_empty() {
                continue;
            }

            let Some(corpus) = corpora.iter().find(|c| c.domain == domain) else {
                for sdk in members {
                    obs::emit_drift_unknown(&sdk.name, "no corpus configured for domain");
                    records.insert(sdk.name.clone(), DriftRecord::unknown(None));
                }
                continue;
            };

            records.extend(self.detect_domain(corpus, &members).await);
        }
        records
    }

    async fn detect_domain(
        &self,
        corpus: &CorpusConfig,
        sdks: &[&SdkDescriptor],
    ) -> Vec<(String, DriftRecord)> {
        let history = match self
            .bounded(
                &corpus.repo,
                self.source.commit_history(&corpus.repo, &corpus.branch),
            )
            .await
        {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(
                    event = "drift.history_unavailable",
                    domain = %corpus.domain,
                    repo = %corpus.repo,
                    error = %e,
                );
                return sdks
                    .iter()
                    .map(|sdk| {
                        obs::emit_drift_unknown(&sdk.name, "corpus history unavailable");
                        (sdk.name.clone(), DriftRecord::unknown(None))
                    })
                    .collect();
            }
        };

        let mut out = Vec::with_capacity(sdks.len());
        for sdk in sdks {
            let path = sdk
                .submodule_path
                .as_deref()
                .unwrap_or(corpus.submodule_path.as_str());
            let pinned = self
                .bounded(&sdk.name, self.source.pinned_commit(&sdk.repo, path))
                .await;
            let record = match pinned {
                Ok(Some(pinned)) => match commits_behind(&history, &pinned) {
                    Some(behind) => {
                        obs::emit_drift_computed(&sdk.name, &pinned, behind);
                        DriftRecord::behind(pinned, behind)
                    }
                    None => {
                        obs::emit_drift_unknown(&sdk.name, "pinned commit outside fetched history");
                        DriftRecord::unknown(Some(pinned))
                    }
                },
                Ok(None) => {
                    obs::emit_drift_unknown(&sdk.name, "submodule not found in sdk repo");
                    DriftRecord::unknown(None)
                }
                Err(e) => {
                    obs::emit_drift_unknown(&sdk.name, &e);
                    DriftRecord::unknown(None)
                }
            };
            out.push((sdk.name.clone(), record));
        }
        out
    }

    async fn bounded<T>(
        &self,
        target: &str,
        fut: impl Future<Output = Result<T, FetchError>>,
    ) -> Result<T, FetchError> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, fut).await.map_err(|_| {
                FetchError::DeadlineExceeded {
                    target: target.to_string(),
                    secs: deadline.as_secs(),
                }
            })?,
            None => fut.await,
        }
    }
}
