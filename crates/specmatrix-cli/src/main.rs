//! specmatrix - cross-SDK test-vector compliance matrix
//!
//! ## Commands
//!
//! - `build`: reconcile every SDK's artifacts against the vector corpora and
//!   write `compliance.json` / `compliance.md`
//! - `catalog`: print the canonical feature/vector catalog
//! - `extract`: show what a descriptor pulls out of one JUnit report

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use specmatrix_core::{
    extract, parse_junit, reporting, select_vector_suites, ComplianceConfig, ComplianceRun,
    ComplianceSummary, Domain, DriftDetector, ExtractedResult, ReportAggregator, VectorCorpus,
};
use specmatrix_sources::{DirectoryArtifactFetcher, GithubHistorySource};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "specmatrix")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Cross-SDK test-vector compliance matrix", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the compliance matrix and write summary artifacts
    Build {
        /// TOML config (default: built-in reference configuration)
        #[arg(short, long, env = "SPECMATRIX_CONFIG")]
        config: Option<PathBuf>,

        /// Directory of extracted artifacts, one subdirectory per SDK
        #[arg(short, long)]
        artifacts: Option<PathBuf>,

        /// Output directory for compliance.json and compliance.md
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Skip submodule drift detection
        #[arg(long)]
        no_drift: bool,
    },

    /// Print the canonical vector catalog
    Catalog {
        #[arg(short, long, env = "SPECMATRIX_CONFIG")]
        config: Option<PathBuf>,

        /// Only this domain (web5 or tbdex)
        #[arg(short, long)]
        domain: Option<String>,
    },

    /// Run one SDK's extraction over a single JUnit report
    Extract {
        #[arg(short, long, env = "SPECMATRIX_CONFIG")]
        config: Option<PathBuf>,

        /// SDK name from the config
        #[arg(long)]
        sdk: String,

        /// JUnit XML report
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = specmatrix_core::telemetry::level_for(cli.verbose);
    specmatrix_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Build {
            config,
            artifacts,
            out,
            no_drift,
        } => cmd_build(config.as_deref(), artifacts, &out, no_drift).await,
        Commands::Catalog { config, domain } => {
            cmd_catalog(config.as_deref(), domain.as_deref())
        }
        Commands::Extract { config, sdk, file } => cmd_extract(config.as_deref(), &sdk, &file),
    }
}

fn load_config(path: Option<&Path>) -> Result<ComplianceConfig> {
    match path {
        Some(path) => ComplianceConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path)),
        None => ComplianceConfig::reference().context("Invalid reference configuration"),
    }
}

fn parse_domain(raw: &str) -> Result<Domain> {
    Domain::ALL
        .into_iter()
        .find(|d| d.as_str().eq_ignore_ascii_case(raw))
        .with_context(|| format!("Unknown domain '{}' (expected web5 or tbdex)", raw))
}

async fn cmd_build(
    config_path: Option<&Path>,
    artifacts: Option<PathBuf>,
    out: &Path,
    no_drift: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let catalogs = config
        .build_catalogs()
        .context("Failed to build vector catalogs")?;

    let artifacts_dir = artifacts.unwrap_or_else(|| config.run.artifacts_dir.clone());
    info!(artifacts = %artifacts_dir.display(), sdks = config.sdks.len(), "building compliance matrix");

    let fetcher = Arc::new(DirectoryArtifactFetcher::new(artifacts_dir));
    let aggregator = ReportAggregator::from_config(&config, catalogs, fetcher);
    let reports = aggregator
        .run(&config.sdks)
        .await
        .context("Compliance run aborted")?;

    let drift = if no_drift {
        BTreeMap::new()
    } else {
        match GithubHistorySource::from_env() {
            Ok(source) => {
                DriftDetector::new(Arc::new(source))
                    .with_deadline(config.run.sdk_deadline())
                    .detect(&config.sdks, &config.corpora)
                    .await
            }
            Err(e) => {
                warn!(error = %e, "drift detection unavailable");
                BTreeMap::new()
            }
        }
    };

    let run = ComplianceRun::assemble(reports, drift);

    std::fs::create_dir_all(out).with_context(|| format!("create {:?}", out))?;
    let json_path = out.join("compliance.json");
    let md_path = out.join("compliance.md");
    reporting::write_compliance_json(&json_path, &run)?;
    reporting::write_compliance_md(&md_path, &run)?;

    for sdk in &run.sdks {
        let summary = ComplianceSummary::of(&sdk.report);
        println!(
            "{:<14} {:<8} {:>4}/{:<4} {}",
            sdk.report.sdk.name,
            if sdk.report.is_passing() { "passing" } else { "failing" },
            summary.passed,
            summary.total - summary.skipped,
            summary.compliance_percent(),
        );
    }
    println!(
        "{} of {} SDKs reported",
        run.sdks.len(),
        config.sdks.len()
    );
    println!("Wrote {:?}", json_path);
    println!("Wrote {:?}", md_path);
    Ok(())
}

fn cmd_catalog(config_path: Option<&Path>, domain: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let only = domain.map(parse_domain).transpose()?;

    for corpus in &config.corpora {
        if only.is_some_and(|d| d != corpus.domain) {
            continue;
        }
        let catalog = VectorCorpus::build(&corpus.root, corpus.layout)
            .with_context(|| format!("Failed to build {} catalog", corpus.domain))?;

        println!(
            "{} ({} features, {} vectors)",
            corpus.domain,
            catalog.feature_count(),
            catalog.len()
        );
        for feature in catalog.features() {
            println!("  {}", feature);
            for vector in catalog.vectors(feature).into_iter().flatten() {
                println!("    {}", vector);
            }
        }
    }
    Ok(())
}

/// Results `build` would extract for `sdk_name` from one report.
fn extract_report(
    config: &ComplianceConfig,
    sdk_name: &str,
    file: &Path,
) -> Result<Vec<ExtractedResult>> {
    let Some(sdk) = config.sdk(sdk_name) else {
        bail!("No SDK named '{}' in config", sdk_name);
    };

    let bytes = std::fs::read(file).with_context(|| format!("read {:?}", file))?;
    let document = file.display().to_string();
    let suites = parse_junit(&document, &bytes)
        .with_context(|| format!("Failed to parse {:?}", file))?;

    let marker = config.corpus(sdk.domain).map(|c| c.suite_marker.as_str());
    let suites = select_vector_suites(suites, sdk, marker);
    Ok(extract(&suites, sdk))
}

fn cmd_extract(config_path: Option<&Path>, sdk_name: &str, file: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let results = extract_report(&config, sdk_name, file)?;
    if results.is_empty() {
        println!("No results matched the {} patterns", sdk_name);
        return Ok(());
    }
    for result in &results {
        let outcome = match result.failures.first() {
            None => "pass".to_string(),
            Some(cause) => format!("fail: {}", cause.to_string().lines().next().unwrap_or("")),
        };
        println!("{}/{}  {}", result.feature, result.vector, outcome);
    }
    println!("{} results", results.len());
    Ok(())
}
