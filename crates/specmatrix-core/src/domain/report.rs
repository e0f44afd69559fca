//! Result matrix types: one [`ConformanceReport`] per SDK per run.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::sdk::SdkDescriptor;

/// Why an attempted vector did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureCause {
    /// The SDK deliberately skips this vector.
    NotSupported,
    /// Opaque diagnostic text from the test runner.
    Message(String),
}

impl FailureCause {
    pub fn message(text: impl Into<String>) -> Self {
        FailureCause::Message(text.into())
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::NotSupported => f.write_str("test not supported by this SDK"),
            FailureCause::Message(text) => f.write_str(text),
        }
    }
}

/// Display classification of a single matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    NotAttempted,
    Passed,
    Failed,
    Skipped,
}

impl EntryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EntryStatus::NotAttempted => "In progress",
            EntryStatus::Passed => "Success",
            EntryStatus::Failed => "Failed",
            EntryStatus::Skipped => "Skipped",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            EntryStatus::NotAttempted => "🚧",
            EntryStatus::Passed => "✅",
            EntryStatus::Failed => "❌",
            EntryStatus::Skipped => "⚠️",
        }
    }
}

/// One cell of the compliance matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Whether the SDK attempted this vector at all.
    pub exists: bool,

    /// Empty when the attempt passed.
    pub failures: Vec<FailureCause>,

    #[serde(rename = "duration_ms", with = "millis")]
    pub duration: Duration,
}

impl ResultEntry {
    pub fn observed(failures: Vec<FailureCause>, duration: Duration) -> Self {
        Self {
            exists: true,
            failures,
            duration,
        }
    }

    /// Sole failure cause is the not-supported sentinel.
    pub fn is_skipped(&self) -> bool {
        matches!(self.failures.as_slice(), [FailureCause::NotSupported])
    }

    pub fn status(&self) -> EntryStatus {
        if !self.exists {
            EntryStatus::NotAttempted
        } else if self.is_skipped() {
            EntryStatus::Skipped
        } else if self.failures.is_empty() {
            EntryStatus::Passed
        } else {
            EntryStatus::Failed
        }
    }
}

/// Complete feature × vector result matrix for one SDK.
///
/// Every `(feature, vector)` pair of the domain catalog has an entry; the
/// matrix is never sparse relative to the catalog it was reconciled against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceReport {
    pub sdk: SdkDescriptor,
    pub results: BTreeMap<String, BTreeMap<String, ResultEntry>>,
}

impl ConformanceReport {
    /// True iff every entry is skipped or carries no failure causes.
    pub fn is_passing(&self) -> bool {
        self.entries()
            .all(|(_, _, entry)| entry.is_skipped() || entry.failures.is_empty())
    }

    pub fn entry(&self, feature: &str, vector: &str) -> Option<&ResultEntry> {
        self.results.get(feature)?.get(vector)
    }

    /// Iterate cells in feature, then vector order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &ResultEntry)> {
        self.results.iter().flat_map(|(feature, vectors)| {
            vectors
                .iter()
                .map(move |(vector, entry)| (feature.as_str(), vector.as_str(), entry))
        })
    }

    pub fn entry_count(&self) -> usize {
        self.results.values().map(BTreeMap::len).sum()
    }

    /// SHA-256 over the canonical matrix contents.
    ///
    /// Identical catalog and extracted input always produce the same digest.
    pub fn matrix_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (feature, vector, entry) in self.entries() {
            hasher.update(feature.as_bytes());
            hasher.update(b"\0");
            hasher.update(vector.as_bytes());
            hasher.update(b"\0");
            hasher.update([entry.exists as u8]);
            for failure in &entry.failures {
                match failure {
                    FailureCause::NotSupported => hasher.update(b"\x01"),
                    FailureCause::Message(text) => {
                        hasher.update(b"\x02");
                        hasher.update(text.as_bytes());
                    }
                }
                hasher.update(b"\0");
            }
            hasher.update(entry.duration.as_nanos().to_le_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}

/// Where an SDK's pinned corpus commit sits relative to the corpus head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DriftPosition {
    /// Index of the pinned commit in the newest-first history; 0 is up to date.
    Behind { commits: usize },
    /// Pinned commit unknown or outside the fetched history window.
    Unknown,
}

/// Per-SDK corpus drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftRecord {
    pub pinned_commit: Option<String>,
    pub position: DriftPosition,
}

impl DriftRecord {
    pub fn behind(pinned_commit: impl Into<String>, commits: usize) -> Self {
        Self {
            pinned_commit: Some(pinned_commit.into()),
            position: DriftPosition::Behind { commits },
        }
    }

    pub fn unknown(pinned_commit: Option<String>) -> Self {
        Self {
            pinned_commit,
            position: DriftPosition::Unknown,
        }
    }

    pub fn commits_behind(&self) -> Option<usize> {
        match self.position {
            DriftPosition::Behind { commits } => Some(commits),
            DriftPosition::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.position == DriftPosition::Unknown
    }

    /// Abbreviated pinned commit for display.
    pub fn short_commit(&self) -> &str {
        match &self.pinned_commit {
            Some(sha) => sha.get(..7).unwrap_or(sha),
            None => "-",
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
