//! Structured lifecycle events for a compliance run.
//!
//! Events are emitted through `tracing` with an `event` field so JSON log
//! output can be filtered by kind.

use std::fmt::Display;

use tracing::{info, warn};

/// Span covering one SDK's iteration; attach with `tracing::Instrument`.
pub fn sdk_span(sdk: &str) -> tracing::Span {
    tracing::info_span!("specmatrix.sdk", sdk = %sdk)
}

/// An SDK iteration began.
pub fn emit_sdk_started(sdk: &str, repo: &str) {
    info!(event = "sdk.started", sdk = %sdk, repo = %repo);
}

/// The SDK contributes no report this run.
pub fn emit_sdk_skipped(sdk: &str, reason: impl Display) {
    warn!(event = "sdk.skipped", sdk = %sdk, reason = %reason);
}

/// Extraction and reconciliation finished for one SDK.
pub fn emit_sdk_reconciled(sdk: &str, extracted: usize, entries: usize, passing: bool) {
    info!(
        event = "sdk.reconciled",
        sdk = %sdk,
        extracted = extracted,
        entries = entries,
        passing = passing,
    );
}

/// The pinned commit was found in the corpus history.
pub fn emit_drift_computed(sdk: &str, pinned: &str, commits_behind: usize) {
    info!(
        event = "drift.computed",
        sdk = %sdk,
        pinned = %pinned,
        commits_behind = commits_behind,
    );
}

/// Drift could not be determined for the SDK.
pub fn emit_drift_unknown(sdk: &str, reason: impl Display) {
    warn!(event = "drift.unknown", sdk = %sdk, reason = %reason);
}

/// Summary of a whole aggregation run.
pub fn emit_run_finished(configured: usize, reported: usize, duration_ms: u64) {
    info!(
        event = "run.finished",
        configured = configured,
        reported = reported,
        duration_ms = duration_ms,
    );
}
