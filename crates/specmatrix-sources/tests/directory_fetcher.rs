use std::fs;
use std::sync::Arc;

use specmatrix_core::{
    ArtifactFetcher, CatalogSet, ComplianceConfig, Domain, FetchError, ReportAggregator,
    VectorCorpus,
};
use specmatrix_sources::DirectoryArtifactFetcher;

const SWIFT_REPORT: &str = r#"<testsuites>
  <testsuite name="Web5TestVectorsCryptoEs256k">
    <testcase name="test_sign" time="0.01"/>
    <testcase name="test_verify" time="0.02"/>
  </testsuite>
</testsuites>"#;

fn write(root: &std::path::Path, relative: &str, body: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

#[tokio::test]
async fn reads_every_xml_document_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "web5-swift/b/second.xml", SWIFT_REPORT);
    write(dir.path(), "web5-swift/a/first.xml", SWIFT_REPORT);
    write(dir.path(), "web5-swift/notes.txt", "ignore me");

    let config = ComplianceConfig::reference().unwrap();
    let fetcher = DirectoryArtifactFetcher::new(dir.path());
    let artifact = fetcher.fetch(config.sdk("web5-swift").unwrap()).await.unwrap();

    let names: Vec<_> = artifact.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(names[0].ends_with("first.xml"));
    assert!(names[1].ends_with("second.xml"));
}

#[tokio::test]
async fn missing_sdk_directory_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = ComplianceConfig::reference().unwrap();
    let err = DirectoryArtifactFetcher::new(dir.path())
        .fetch(config.sdk("tbdex-rs").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ArtifactUnavailable { .. }));
}

#[tokio::test]
async fn directory_without_reports_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tbdex-rs/README.md", "nothing here");
    let config = ComplianceConfig::reference().unwrap();
    let err = DirectoryArtifactFetcher::new(dir.path())
        .fetch(config.sdk("tbdex-rs").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ArtifactUnavailable { .. }));
}

#[tokio::test]
async fn aggregator_reads_artifacts_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "web5-swift/report.xml", SWIFT_REPORT);

    let mut corpus = VectorCorpus::new();
    corpus.insert("CryptoEs256k", "sign");
    corpus.insert("CryptoEs256k", "verify");
    corpus.insert("CryptoEs256k", "verify_invalid");
    let catalogs = CatalogSet::new().with(Domain::Web5, corpus);

    let config = ComplianceConfig::reference().unwrap();
    let aggregator = ReportAggregator::from_config(
        &config,
        catalogs,
        Arc::new(DirectoryArtifactFetcher::new(dir.path())),
    );
    let sdks: Vec<_> = ["web5-swift", "web5-kt"]
        .iter()
        .map(|n| config.sdk(n).unwrap().clone())
        .collect();
    let reports = aggregator.run(&sdks).await.unwrap();

    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert!(report.entry("CryptoEs256k", "sign").unwrap().exists);
    assert!(report.entry("CryptoEs256k", "verify").unwrap().exists);
    assert!(!report.entry("CryptoEs256k", "verify_invalid").unwrap().exists);
    assert!(report.is_passing());
}
