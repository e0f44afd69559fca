//! Report aggregation: fetch → parse → extract → reconcile, one SDK at a time.
//!
//! SDKs are processed sequentially in configured order. Each iteration runs
//! under an optional deadline; a fetch failure or expired deadline skips the
//! SDK, while a parse failure on fetched bytes aborts the run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};

use crate::catalog::CatalogSet;
use crate::config::ComplianceConfig;
use crate::domain::error::{AggregateError, FetchError, Result};
use crate::domain::report::{ConformanceReport, DriftRecord};
use crate::domain::sdk::{Domain, ExtractionStrategy, SdkDescriptor};
use crate::extract::extract;
use crate::junit::{JunitParser, RawSuite, SuiteParser};
use crate::obs;
use crate::reconcile::reconcile;

/// One named document inside a fetched artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Raw test output of one SDK run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifact {
    pub documents: Vec<ArtifactDocument>,
}

impl Artifact {
    pub fn single(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            documents: vec![ArtifactDocument {
                name: name.into(),
                bytes: bytes.into(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Source of an SDK's raw test-result artifact.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, sdk: &SdkDescriptor) -> std::result::Result<Artifact, FetchError>;
}

/// Drives extraction and reconciliation across all configured SDKs.
pub struct ReportAggregator {
    catalogs: CatalogSet,
    fetcher: Arc<dyn ArtifactFetcher>,
    parser: Arc<dyn SuiteParser>,
    suite_markers: BTreeMap<Domain, String>,
    deadline: Option<Duration>,
}

impl ReportAggregator {
    pub fn new(catalogs: CatalogSet, fetcher: Arc<dyn ArtifactFetcher>) -> Self {
        Self {
            catalogs,
            fetcher,
            parser: Arc::new(JunitParser),
            suite_markers: BTreeMap::new(),
            deadline: None,
        }
    }

    /// Aggregator wired with the config's suite markers and deadline.
    pub fn from_config(
        config: &ComplianceConfig,
        catalogs: CatalogSet,
        fetcher: Arc<dyn ArtifactFetcher>,
    ) -> Self {
        let mut aggregator =
            Self::new(catalogs, fetcher).with_deadline(config.run.sdk_deadline());
        for corpus in &config.corpora {
            aggregator = aggregator.with_suite_marker(corpus.domain, &corpus.suite_marker);
        }
        aggregator
    }

    pub fn with_parser(mut self, parser: Arc<dyn SuiteParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Keep only suites whose name contains `marker` for SDKs of `domain`.
    pub fn with_suite_marker(mut self, domain: Domain, marker: &str) -> Self {
        self.suite_markers.insert(domain, marker.to_string());
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// One report per SDK whose artifact could be fetched, in input order.
    pub async fn run(&self, sdks: &[SdkDescriptor]) -> Result<Vec<ConformanceReport>> {
        let started = Instant::now();
        let mut reports = Vec::with_capacity(sdks.len());

        for sdk in sdks {
            let outcome = self
                .run_one(sdk)
                .instrument(obs::sdk_span(&sdk.name))
                .await?;
            match outcome {
                Ok(report) => reports.push(report),
                Err(reason) => obs::emit_sdk_skipped(&sdk.name, &reason),
            }
        }

        obs::emit_run_finished(
            sdks.len(),
            reports.len(),
            started.elapsed().as_millis() as u64,
        );
        Ok(reports)
    }

    /// Outer error is fatal, inner error skips the SDK.
    async fn run_one(
        &self,
        sdk: &SdkDescriptor,
    ) -> Result<std::result::Result<ConformanceReport, FetchError>> {
        obs::emit_sdk_started(&sdk.name, &sdk.repo);
        let Some(deadline) = self.deadline else {
            return self.process(sdk).await;
        };
        match tokio::time::timeout(deadline, self.process(sdk)).await {
            Ok(outcome) => outcome,
            Err(_) => Ok(Err(FetchError::DeadlineExceeded {
                target: sdk.name.clone(),
                secs: deadline.as_secs(),
            })),
        }
    }

    async fn process(
        &self,
        sdk: &SdkDescriptor,
    ) -> Result<std::result::Result<ConformanceReport, FetchError>> {
        let catalog = self
            .catalogs
            .get(sdk.domain)
            .ok_or_else(|| AggregateError::MissingCatalog(sdk.domain.to_string()))?;

        let artifact = match self.fetcher.fetch(sdk).await {
            Ok(artifact) if artifact.is_empty() => {
                return Ok(Err(FetchError::ArtifactUnavailable {
                    sdk: sdk.name.clone(),
                    reason: "artifact contains no documents".to_string(),
                }))
            }
            Ok(artifact) => artifact,
            Err(e) => return Ok(Err(e)),
        };

        let mut suites = Vec::new();
        for doc in &artifact.documents {
            let parsed = self
                .parser
                .parse(&doc.name, &doc.bytes)
                .map_err(|source| AggregateError::Parse {
                    sdk: sdk.name.clone(),
                    source,
                })?;
            suites.extend(parsed);
        }

        let marker = self.suite_markers.get(&sdk.domain).map(String::as_str);
        let suites = select_vector_suites(suites, sdk, marker);
        let extracted = extract(&suites, sdk);
        let report = reconcile(catalog, &extracted, sdk);
        obs::emit_sdk_reconciled(
            &sdk.name,
            extracted.len(),
            report.entry_count(),
            report.is_passing(),
        );
        Ok(Ok(report))
    }

}

/// Keep the suites whose name contains the domain's `marker`.
///
/// Structured-name SDKs encode feature and vector in the test identifier and
/// group cases by crate, so their suites pass through unfiltered.
pub fn select_vector_suites(
    suites: Vec<RawSuite>,
    sdk: &SdkDescriptor,
    marker: Option<&str>,
) -> Vec<RawSuite> {
    let Some(marker) = marker else {
        return suites;
    };
    if sdk.strategy == ExtractionStrategy::StructuredName {
        return suites;
    }
    suites
        .into_iter()
        .filter(|suite| {
            let keep = suite.name.contains(marker);
            if keep {
                debug!(suite = %suite.name, "vector suite selected");
            }
            keep
        })
        .collect()
}

/// A report joined with its drift record at the output boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkCompliance {
    #[serde(flatten)]
    pub report: ConformanceReport,
    pub drift: Option<DriftRecord>,
}

/// Everything a compliance run hands to rendering collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRun {
    pub generated_at: DateTime<Utc>,
    pub sdks: Vec<SdkCompliance>,
}

impl ComplianceRun {
    /// Merge reports with the separately computed drift map.
    pub fn assemble(
        reports: Vec<ConformanceReport>,
        mut drift: BTreeMap<String, DriftRecord>,
    ) -> Self {
        let sdks = reports
            .into_iter()
            .map(|report| {
                let drift = drift.remove(&report.sdk.name);
                SdkCompliance { report, drift }
            })
            .collect();
        Self {
            generated_at: Utc::now(),
            sdks,
        }
    }

    pub fn sdk(&self, name: &str) -> Option<&SdkCompliance> {
        self.sdks.iter().find(|s| s.report.sdk.name == name)
    }

    pub fn domain(&self, domain: Domain) -> impl Iterator<Item = &SdkCompliance> {
        self.sdks
            .iter()
            .filter(move |s| s.report.sdk.domain == domain)
    }
}
