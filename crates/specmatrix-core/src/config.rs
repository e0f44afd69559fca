//! Run configuration: corpora, SDK descriptors and per-run limits.
//!
//! Loaded from TOML, or taken from [`ComplianceConfig::reference`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogSet, VectorCorpus};
use crate::domain::error::{CatalogError, ConfigError};
use crate::domain::sdk::{Domain, ExtractionStrategy, SdkDescriptor, VectorLayout};

/// One domain's canonical vector corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub domain: Domain,

    /// Local checkout of the corpus vectors.
    pub root: PathBuf,

    pub layout: VectorLayout,

    /// Canonical corpus repository as `owner/name`.
    pub repo: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    /// Where SDK repos embed the corpus as a submodule.
    pub submodule_path: String,

    /// Substring identifying vector suites in this domain's test output.
    pub suite_marker: String,
}

/// Per-run limits and locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Deadline for each SDK iteration, in seconds.
    #[serde(default = "default_deadline_secs")]
    pub sdk_deadline_secs: u64,

    /// Root of the downloaded, extracted SDK artifacts.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sdk_deadline_secs: default_deadline_secs(),
            artifacts_dir: default_artifacts_dir(),
        }
    }
}

impl RunConfig {
    /// Per-SDK iteration deadline.
    pub fn sdk_deadline(&self) -> Duration {
        Duration::from_secs(self.sdk_deadline_secs)
    }
}

/// Complete configuration of a compliance run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    #[serde(default)]
    pub run: RunConfig,
    pub corpora: Vec<CorpusConfig>,
    pub sdks: Vec<SdkDescriptor>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_deadline_secs() -> u64 {
    120
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

impl ComplianceConfig {
    /// Parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Every SDK name is unique and every SDK domain has a corpus.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for sdk in &self.sdks {
            if !seen.insert(sdk.name.as_str()) {
                return Err(ConfigError::DuplicateSdk(sdk.name.clone()));
            }
            if self.corpus(sdk.domain).is_none() {
                return Err(ConfigError::MissingCorpus {
                    sdk: sdk.name.clone(),
                    domain: sdk.domain.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Corpus configured for `domain`.
    pub fn corpus(&self, domain: Domain) -> Option<&CorpusConfig> {
        self.corpora.iter().find(|c| c.domain == domain)
    }

    /// Descriptor of the SDK named `name`.
    pub fn sdk(&self, name: &str) -> Option<&SdkDescriptor> {
        self.sdks.iter().find(|s| s.name == name)
    }

    /// Build every configured corpus; any unreadable root is fatal.
    pub fn build_catalogs(&self) -> Result<CatalogSet, CatalogError> {
        let mut catalogs = CatalogSet::new();
        for corpus in &self.corpora {
            let built = VectorCorpus::build(&corpus.root, corpus.layout)?;
            catalogs = catalogs.with(corpus.domain, built);
        }
        Ok(catalogs)
    }

    /// The reference deployment: two corpora and ten SDKs.
    pub fn reference() -> Result<Self, ConfigError> {
        let corpora = vec![
            CorpusConfig {
                domain: Domain::Web5,
                root: PathBuf::from("test-vectors"),
                layout: VectorLayout::Flat,
                repo: "TBD54566975/web5-spec".to_string(),
                branch: default_branch(),
                submodule_path: "web5-spec".to_string(),
                suite_marker: "Web5TestVector".to_string(),
            },
            CorpusConfig {
                domain: Domain::Tbdex,
                root: PathBuf::from("tbdex-test-vectors"),
                layout: VectorLayout::Nested,
                repo: "TBD54566975/tbdex".to_string(),
                branch: default_branch(),
                submodule_path: "tbdex".to_string(),
                suite_marker: "TbdexTestVector".to_string(),
            },
        ];

        let table: [(&str, &str, &str, Domain, &str, &str, ExtractionStrategy); 10] = [
            ("web5-js", "TBD54566975/web5-js", "junit-results", Domain::Web5,
             r"Web5TestVectors(\w+)", r".* Web5TestVectors\w+ (\w+)", ExtractionStrategy::Standard),
            ("web5-kt", "TBD54566975/web5-kt", "tests-report-junit", Domain::Web5,
             r"Web5TestVectors(\w+)", r"(\w+)", ExtractionStrategy::Standard),
            ("web5-swift", "TBD54566975/web5-swift", "test-results", Domain::Web5,
             r"Web5TestVectors(\w+)", r"test_(\w+)", ExtractionStrategy::Standard),
            ("web5-rs", "TBD54566975/web5-rs", "rust-test-results", Domain::Web5,
             r"::(\w+)::(\w+)::(\w+)", r"::(\w+)$", ExtractionStrategy::StructuredName),
            ("web5-core-kt", "TBD54566975/web5-rs", "kotlin-test-results", Domain::Web5,
             r"Web5TestVectorsTest\$Web5TestVectors(\w+)", r"(\w+)", ExtractionStrategy::Standard),
            ("tbdex-js", "TBD54566975/tbdex-js", "junit-results", Domain::Tbdex,
             r"TbdexTestVectors(\w+)", r"TbdexTestVectors(\w+) (\w+)", ExtractionStrategy::Standard),
            ("tbdex-kt", "TBD54566975/tbdex-kt", "tests-report-junit", Domain::Tbdex,
             r"tbdex\.sdk\.\w+.TbdexTestVectors(\w+)", r"(\w+)", ExtractionStrategy::Standard),
            ("tbdex-go", "TBD54566975/tbdex-go", "go-test-results", Domain::Tbdex,
             r"TbdexTestVectors(\w+)", r"TestAllParsers/(\w+)", ExtractionStrategy::Standard),
            ("tbdex-rs", "TBD54566975/tbdex-rs", "rust-test-results", Domain::Tbdex,
             r"TbdexTestVectors(\w+)Test", r"::(\w+)$", ExtractionStrategy::Standard),
            ("tbdex-core-kt", "TBD54566975/tbdex-rs", "kotlin-test-results", Domain::Tbdex,
             r"tbdex\.sdk\.\w+\.TbdexTestVectors(\w+)Test", r"(\w+)", ExtractionStrategy::Standard),
        ];

        let mut sdks = Vec::with_capacity(table.len());
        for (name, repo, artifact, domain, feature, vector, strategy) in table {
            let sdk = SdkDescriptor::new(name, repo, artifact, domain, feature, vector)
                .map_err(|e| ConfigError::InvalidPattern {
                    sdk: name.to_string(),
                    field: "feature/vector",
                    detail: e.to_string(),
                })?
                .with_strategy(strategy);
            sdks.push(sdk);
        }

        let config = Self {
            run: RunConfig::default(),
            corpora,
            sdks,
        };
        config.validate()?;
        Ok(config)
    }
}
