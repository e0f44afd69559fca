//! SDK descriptors and the closed vocabularies they are built from.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Protocol family an SDK and its vector corpus belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Web5,
    Tbdex,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Web5, Domain::Tbdex];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Web5 => "web5",
            Domain::Tbdex => "tbdex",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk shape of a vector corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorLayout {
    /// `<feature>/<vector>.json`
    Flat,
    /// `<feature>/vectors/<vector-name>.json` or `<group>/<feature>/<vector-name>.json`
    Nested,
}

/// How raw test identifiers are turned into `(feature, vector)` pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Feature from the suite name, vector from each test case name.
    #[default]
    Standard,
    /// Feature and vector both encoded in one hierarchical test identifier.
    StructuredName,
}

/// Static configuration for one SDK under evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkDescriptor {
    /// Short unique name, e.g. `web5-kt`.
    pub name: String,

    /// Source repository as `owner/name`.
    pub repo: String,

    /// Name of the CI artifact holding the JUnit output.
    pub artifact_name: String,

    pub domain: Domain,

    #[serde(default)]
    pub strategy: ExtractionStrategy,

    #[serde(with = "pattern")]
    pub feature_pattern: Regex,

    #[serde(with = "pattern")]
    pub vector_pattern: Regex,

    /// Path of the embedded corpus submodule; falls back to the corpus default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submodule_path: Option<String>,
}

impl SdkDescriptor {
    /// Build a standard-strategy descriptor from pattern sources.
    pub fn new(
        name: &str,
        repo: &str,
        artifact_name: &str,
        domain: Domain,
        feature_pattern: &str,
        vector_pattern: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.to_string(),
            repo: repo.to_string(),
            artifact_name: artifact_name.to_string(),
            domain,
            strategy: ExtractionStrategy::Standard,
            feature_pattern: Regex::new(feature_pattern)?,
            vector_pattern: Regex::new(vector_pattern)?,
            submodule_path: None,
        })
    }

    pub fn with_strategy(mut self, strategy: ExtractionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_submodule_path(mut self, path: &str) -> Self {
        self.submodule_path = Some(path.to_string());
        self
    }
}

/// Regex fields round-trip through their source text.
mod pattern {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(re: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(re.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Regex, D::Error> {
        let source = String::deserialize(deserializer)?;
        Regex::new(&source).map_err(serde::de::Error::custom)
    }
}
