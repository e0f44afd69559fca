//! Result extraction: raw suites + naming descriptor → `(feature, vector)` results.
//!
//! Identifiers that do not match the descriptor's patterns contribute nothing.
//! SDKs routinely emit auxiliary suites unrelated to vector conformance.

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::pascal_case;
use crate::domain::report::FailureCause;
use crate::domain::sdk::{ExtractionStrategy, SdkDescriptor};
use crate::junit::{RawSuite, RawTestCase};

/// Participating capture groups the structured-name feature pattern must yield.
const STRUCTURED_MIN_GROUPS: usize = 3;

/// One observed vector outcome, keyed by catalog names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedResult {
    pub feature: String,
    pub vector: String,
    pub failures: Vec<FailureCause>,
    pub duration: Duration,
}

impl ExtractedResult {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Extract results from `suites` using the descriptor's strategy.
pub fn extract(suites: &[RawSuite], sdk: &SdkDescriptor) -> Vec<ExtractedResult> {
    match sdk.strategy {
        ExtractionStrategy::Standard => extract_standard(suites, sdk),
        ExtractionStrategy::StructuredName => extract_structured(suites, sdk),
    }
}

fn extract_standard(suites: &[RawSuite], sdk: &SdkDescriptor) -> Vec<ExtractedResult> {
    let mut out = Vec::new();
    for suite in suites {
        let Some(feature) = first_group(&sdk.feature_pattern, &suite.name) else {
            continue;
        };
        for test in &suite.tests {
            if let Some(vector) = last_group(&sdk.vector_pattern, &test.name) {
                out.push(result(feature.clone(), vector, test));
            }
        }
    }
    out
}

fn extract_structured(suites: &[RawSuite], sdk: &SdkDescriptor) -> Vec<ExtractedResult> {
    let mut out = Vec::new();
    for test in suites.iter().flat_map(|s| &s.tests) {
        let Some(caps) = sdk.feature_pattern.captures(&test.name) else {
            continue;
        };
        if caps.iter().skip(1).flatten().count() < STRUCTURED_MIN_GROUPS {
            continue;
        }
        let Some(raw_feature) = caps.get(2).map(|m| m.as_str()) else {
            continue;
        };
        let Some(vector) = last_group(&sdk.vector_pattern, &test.name) else {
            continue;
        };
        out.push(result(pascal_case(raw_feature), vector, test));
    }
    out
}

fn result(feature: String, vector: String, test: &RawTestCase) -> ExtractedResult {
    ExtractedResult {
        feature,
        vector,
        failures: test.failure.iter().cloned().collect(),
        duration: test.duration,
    }
}

/// First capture group; `None` when unmatched, group-less or empty.
fn first_group(pattern: &Regex, input: &str) -> Option<String> {
    let caps = pattern.captures(input)?;
    let m = caps.get(1)?;
    non_empty(m.as_str())
}

/// Last capture group, or the whole match for a group-less pattern.
fn last_group(pattern: &Regex, input: &str) -> Option<String> {
    let caps = pattern.captures(input)?;
    let m = caps.get(caps.len() - 1)?;
    non_empty(m.as_str())
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sdk::Domain;

    fn web5_js() -> SdkDescriptor {
        SdkDescriptor::new(
            "web5-js",
            "TBD54566975/web5-js",
            "junit-results",
            Domain::Web5,
            r"Web5TestVectors(\w+)",
            r".* Web5TestVectors\w+ (\w+)",
        )
        .unwrap()
    }

    fn web5_rs() -> SdkDescriptor {
        SdkDescriptor::new(
            "web5-rs",
            "TBD54566975/web5-rs",
            "rust-test-results",
            Domain::Web5,
            r"::(\w+)::(\w+)::(\w+)",
            r"::(\w+)$",
        )
        .unwrap()
        .with_strategy(ExtractionStrategy::StructuredName)
    }

    #[test]
    fn test_standard_strategy_extracts_feature_and_vector() {
        let suites = vec![RawSuite::new("Web5TestVectorsDidCreate")
            .with_test(RawTestCase::passed("web5 Web5TestVectorsDidCreate basic"))];
        let results = extract(&suites, &web5_js());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].feature, "DidCreate");
        assert_eq!(results[0].vector, "basic");
        assert!(results[0].passed());
    }

    #[test]
    fn test_standard_strategy_ignores_unmatched_suites_and_tests() {
        let suites = vec![
            RawSuite::new("CryptoUtils").with_test(RawTestCase::passed("random bytes")),
            RawSuite::new("Web5TestVectorsDidJwk").with_test(RawTestCase::passed("nospace")),
        ];
        assert!(extract(&suites, &web5_js()).is_empty());
    }

    #[test]
    fn test_standard_strategy_group_less_vector_pattern_uses_whole_match() {
        let sdk = SdkDescriptor::new(
            "x",
            "org/x",
            "a",
            Domain::Tbdex,
            r"TbdexTestVectors(\w+)",
            r"\w+",
        )
        .unwrap();
        let suites = vec![RawSuite::new("TbdexTestVectorsProtocol")
            .with_test(RawTestCase::passed("parse_rfq"))];
        let results = extract(&suites, &sdk);
        assert_eq!(results[0].vector, "parse_rfq");
    }

    #[test]
    fn test_failure_cause_carried_as_single_entry() {
        let suites = vec![RawSuite::new("Web5TestVectorsDidJwk").with_test(
            RawTestCase::failed("x Web5TestVectorsDidJwk resolve", FailureCause::message("boom"))
                .with_duration(Duration::from_millis(40)),
        )];
        let results = extract(&suites, &web5_js());
        assert_eq!(results[0].failures, vec![FailureCause::message("boom")]);
        assert_eq!(results[0].duration, Duration::from_millis(40));
        assert!(!results[0].passed());
    }

    #[test]
    fn test_structured_strategy_pascal_cases_second_group() {
        let suites = vec![RawSuite::new("").with_test(RawTestCase::passed(
            "web5::test_vectors::did_jwk::resolve::did_jwk_resolve_invalid",
        ))];
        let results = extract(&suites, &web5_rs());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].feature, "DidJwk");
        assert_eq!(results[0].vector, "did_jwk_resolve_invalid");
    }

    #[test]
    fn test_structured_strategy_requires_three_groups() {
        let sdk = SdkDescriptor::new("x", "org/x", "a", Domain::Web5, r"::(\w+)::(\w+)", r"::(\w+)$")
            .unwrap()
            .with_strategy(ExtractionStrategy::StructuredName);
        let suites = vec![RawSuite::new("").with_test(RawTestCase::passed("a::b::c::d"))];
        assert!(extract(&suites, &sdk).is_empty());
    }

    #[test]
    fn test_structured_strategy_counts_participating_groups() {
        let sdk = SdkDescriptor::new(
            "x",
            "org/x",
            "a",
            Domain::Web5,
            r"::(\w+)::(\w+)(?:::(\w+))?",
            r"::(\w+)$",
        )
        .unwrap()
        .with_strategy(ExtractionStrategy::StructuredName);
        let shallow = vec![RawSuite::new("").with_test(RawTestCase::passed("a::b::c"))];
        assert!(extract(&shallow, &sdk).is_empty());

        let deep = vec![RawSuite::new("").with_test(RawTestCase::passed("a::b::did_jwk::resolve"))];
        let results = extract(&deep, &sdk);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].feature, "DidJwk");
    }

    #[test]
    fn test_structured_strategy_scans_every_suite() {
        let suites = vec![
            RawSuite::new("one").with_test(RawTestCase::passed("crate::vectors::did_dht::resolve::a")),
            RawSuite::new("two").with_test(RawTestCase::passed("crate::vectors::did_web::resolve::b")),
        ];
        let results = extract(&suites, &web5_rs());
        let features: Vec<_> = results.iter().map(|r| r.feature.as_str()).collect();
        assert_eq!(features, vec!["DidDht", "DidWeb"]);
    }
}
