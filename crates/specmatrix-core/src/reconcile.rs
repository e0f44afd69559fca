//! Reconciliation of extracted results against the canonical catalog.
//!
//! Catalog membership decides what exists in the matrix; extracted results
//! only fill in what was observed. Results outside the catalog are dropped and
//! duplicate observations resolve last-write-wins.

use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::VectorCorpus;
use crate::domain::report::{ConformanceReport, ResultEntry};
use crate::domain::sdk::SdkDescriptor;
use crate::extract::ExtractedResult;

/// Build the complete result matrix for one SDK.
pub fn reconcile(
    catalog: &VectorCorpus,
    extracted: &[ExtractedResult],
    sdk: &SdkDescriptor,
) -> ConformanceReport {
    let mut results: BTreeMap<String, BTreeMap<String, ResultEntry>> = BTreeMap::new();
    for (feature, vector) in catalog.pairs() {
        results
            .entry(feature.to_string())
            .or_default()
            .insert(vector.to_string(), ResultEntry::default());
    }

    let mut discarded = 0usize;
    for observed in extracted {
        match results
            .get_mut(&observed.feature)
            .and_then(|vectors| vectors.get_mut(&observed.vector))
        {
            Some(entry) => {
                *entry = ResultEntry::observed(observed.failures.clone(), observed.duration);
            }
            None => discarded += 1,
        }
    }

    if discarded > 0 {
        debug!(
            sdk = %sdk.name,
            discarded,
            "extracted results outside the vector catalog were dropped"
        );
    }

    ConformanceReport {
        sdk: sdk.clone(),
        results,
    }
}
