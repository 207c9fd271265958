use super::test_helpers::*;
use super::*;
use crate::capture::PageRenderer;
use crate::extraction::TableExtractor;
use crate::types::{
    ArtifactKind, Classification, Event, IdOutcome, MissReason, SweepOutcome, SweepState,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;


#[tokio::test]
async fn new_creates_both_tiers_and_starts_idle() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let harvester = create_test_harvester(test_config(&server, &dir));

    assert!(dir.path().join("raw").is_dir());
    assert!(dir.path().join("clean").is_dir());
    assert_eq!(harvester.state(), SweepState::Idle);
    assert_eq!(harvester.renderer.name(), "noop");
    assert_eq!(
        harvester.extraction.strategy_names(),
        vec!["tabula-lattice", "layout-stream"]
    );
}

#[tokio::test]
async fn new_rejects_invalid_config() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, &dir);
    config.network.notice_url_template = format!("{}/notice", server.uri());

    assert!(Harvester::new(config).is_err());
    assert!(!dir.path().join("raw").exists());
}

#[tokio::test]
async fn with_extractors_replaces_the_chain() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let harvester = create_test_harvester(test_config(&server, &dir))
        .with_extractors(vec![Arc::new(StubExtractor::new()) as Arc<dyn TableExtractor>]);

    assert_eq!(harvester.extraction.strategy_names(), vec!["stub"]);
}
