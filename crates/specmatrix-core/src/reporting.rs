//! Compliance summary artifacts: `compliance.json` and `compliance.md`.
//!
//! Both are derived from a [`ComplianceRun`]. The JSON artifact is the
//! canonical hand-off to downstream renderers; the markdown is a per-domain
//! feature/vector matrix with drift and badge rows.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{ComplianceRun, SdkCompliance};
use crate::domain::report::{ConformanceReport, DriftRecord, EntryStatus, ResultEntry};
use crate::domain::sdk::Domain;

/// Version of the compliance.json layout.
pub const SCHEMA_VERSION: &str = "1";

/// Per-report counts backing the compliance badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub total: usize,
    pub attempted: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_attempted: usize,
    pub has_failures: bool,
}

impl ComplianceSummary {
    /// Count every catalog entry of `report` by status.
    pub fn of(report: &ConformanceReport) -> Self {
        let mut summary = Self::default();
        for (_, _, entry) in report.entries() {
            summary.total += 1;
            if entry.exists {
                summary.attempted += 1;
            }
            match entry.status() {
                EntryStatus::NotAttempted => summary.not_attempted += 1,
                EntryStatus::Passed => summary.passed += 1,
                EntryStatus::Failed => summary.failed += 1,
                EntryStatus::Skipped => summary.skipped += 1,
            }
        }
        summary.has_failures = summary.failed > 0;
        summary
    }

    /// `passed / (total - skipped)`; `None` when no entry counts.
    pub fn compliance_ratio(&self) -> Option<f64> {
        let countable = self.total - self.skipped;
        (countable > 0).then(|| self.passed as f64 / countable as f64)
    }

    /// Whole-number percentage, or `n/a`.
    pub fn compliance_percent(&self) -> String {
        match self.compliance_ratio() {
            Some(ratio) => format!("{:.0}%", ratio * 100.0),
            None => "n/a".to_string(),
        }
    }
}

/// One SDK's section of compliance.json.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SdkArtifact {
    pub name: String,
    pub repo: String,
    pub domain: Domain,
    pub passing: bool,
    pub matrix_digest: String,
    pub summary: ComplianceSummary,
    pub drift: Option<DriftRecord>,
    pub results: BTreeMap<String, BTreeMap<String, ResultEntry>>,
}

/// Canonical compliance artifact handed to rendering collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub sdks: Vec<SdkArtifact>,
}

impl ComplianceArtifact {
    /// Flatten a run into the serialized artifact layout.
    pub fn from_run(run: &ComplianceRun) -> Self {
        let sdks = run
            .sdks
            .iter()
            .map(|s| SdkArtifact {
                name: s.report.sdk.name.clone(),
                repo: s.report.sdk.repo.clone(),
                domain: s.report.sdk.domain,
                passing: s.report.is_passing(),
                matrix_digest: s.report.matrix_digest(),
                summary: ComplianceSummary::of(&s.report),
                drift: s.drift.clone(),
                results: s.report.results.clone(),
            })
            .collect();
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: run.generated_at,
            sdks,
        }
    }
}

/// Write compliance.json in pretty JSON format.
pub fn write_compliance_json(path: &Path, run: &ComplianceRun) -> Result<()> {
    let artifact = ComplianceArtifact::from_run(run);
    let content =
        serde_json::to_string_pretty(&artifact).context("serialize compliance artifact")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render the markdown matrix, one section per domain with reports.
pub fn render_compliance_md(run: &ComplianceRun) -> String {
    let mut out = String::new();
    out.push_str("# SDK Compliance\n\n");
    out.push_str(&format!(
        "_Generated {}_\n\n",
        run.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for domain in Domain::ALL {
        let sdks: Vec<&SdkCompliance> = run.domain(domain).collect();
        if sdks.is_empty() {
            continue;
        }
        out.push_str(&format!("## {}\n\n", domain));
        render_matrix(&mut out, &sdks);
        render_badges(&mut out, &sdks);
    }

    if run.sdks.is_empty() {
        out.push_str("No SDK reports were produced.\n");
    }
    out
}

fn render_matrix(out: &mut String, sdks: &[&SdkCompliance]) {
    out.push_str("| Feature | Vector |");
    for s in sdks {
        out.push_str(&format!(" {} |", s.report.sdk.name));
    }
    out.push_str("\n|---|---|");
    out.push_str(&"---|".repeat(sdks.len()));
    out.push('\n');

    let pairs: BTreeSet<(&str, &str)> = sdks
        .iter()
        .flat_map(|s| s.report.entries().map(|(f, v, _)| (f, v)))
        .collect();
    for (feature, vector) in pairs {
        out.push_str(&format!("| {} | {} |", feature, vector));
        for s in sdks {
            let cell = s
                .report
                .entry(feature, vector)
                .map(|e| e.status().symbol())
                .unwrap_or("-");
            out.push_str(&format!(" {} |", cell));
        }
        out.push('\n');
    }

    out.push_str("| | _drift_ |");
    for s in sdks {
        out.push_str(&format!(" {} |", drift_label(s.drift.as_ref())));
    }
    out.push_str("\n\n");
}

fn render_badges(out: &mut String, sdks: &[&SdkCompliance]) {
    out.push_str("| SDK | Status | Passed | Failed | Skipped | Not attempted | Compliance |\n");
    out.push_str("|---|---|---|---|---|---|---|\n");
    for s in sdks {
        let summary = ComplianceSummary::of(&s.report);
        let status = if s.report.is_passing() { "passing" } else { "failing" };
        out.push_str(&format!(
            "| [{}](https://github.com/{}) | {} | {} | {} | {} | {} | {} |\n",
            s.report.sdk.name,
            s.report.sdk.repo,
            status,
            summary.passed,
            summary.failed,
            summary.skipped,
            summary.not_attempted,
            summary.compliance_percent(),
        ));
    }
    out.push('\n');
}

fn drift_label(drift: Option<&DriftRecord>) -> String {
    match drift {
        None => "-".to_string(),
        Some(record) => match record.commits_behind() {
            Some(0) => format!("up to date ({})", record.short_commit()),
            Some(n) => format!("{} behind ({})", n, record.short_commit()),
            None => "unknown".to_string(),
        },
    }
}

/// Write compliance.md.
pub fn write_compliance_md(path: &Path, run: &ComplianceRun) -> Result<()> {
    std::fs::write(path, render_compliance_md(run)).with_context(|| format!("write {:?}", path))?;
    Ok(())
}
