//! Shared test helpers for creating Harvester instances against a mock portal.

use crate::capture::PageRenderer;
use crate::config::Config;
use crate::error::{CaptureError, ExtractionError};
use crate::extraction::{Table, TableExtractor};
use crate::harvester::Harvester;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A page the portal serves for identifiers with no record behind them
pub(crate) const EMPTY_PAGE: &str =
    "<html><head><title>Bid Notice Abstract</title></head><body><p>No record found.</p></body></html>";

/// Minimal PDF body served as an attachment
pub(crate) const PDF_BYTES: &[u8] = b"%PDF-1.4\n% bill of quantities\ntrailer\n%%EOF\n";

/// Render a notice page the way the portal lays it out: label cell, value cell
pub(crate) fn notice_page(title: &str, category: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">{href}</a></li>"#))
        .collect();
    format!(
        r#"<html><head><title>Bid Notice Abstract</title></head><body>
<table>
  <tr><td><b>Project Title:</b></td><td><span>{title}</span></td></tr>
  <tr><td><b>Category:</b></td><td><span>{category}</span></td></tr>
</table>
<ul>{anchors}</ul>
</body></html>"#
    )
}

/// A relevant notice without attachment links
pub(crate) fn relevant_page() -> String {
    notice_page(
        "Repair of Barangay Hall",
        "Construction Projects – Roads",
        &[],
    )
}

/// Configuration pointing at the mock portal with tiers inside `dir`
///
/// No delay between identifiers and no external tool discovery.
pub(crate) fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.network.notice_url_template = format!("{}/notice?refID={{id}}", server.uri());
    config.sweep.request_delay = Duration::ZERO;
    config.storage.raw_dir = dir.path().join("raw");
    config.storage.clean_dir = dir.path().join("clean");
    config.tools.search_path = false;
    config
}

/// Build a harvester from a test configuration
pub(crate) fn create_test_harvester(config: Config) -> Harvester {
    Harvester::new(config).unwrap()
}

/// Serve `body` for one identifier
pub(crate) async fn mount_page(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/notice"))
        .and(query_param("refID", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Hold the response for one identifier past the page timeout
///
/// Pair with [`STALL_TIMEOUT`] as `page_timeout` to make the fetch fail in
/// transport.
pub(crate) async fn mount_stalled_page(server: &MockServer, id: &str) {
    Mock::given(method("GET"))
        .and(path("/notice"))
        .and(query_param("refID", id))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(EMPTY_PAGE)
                .set_delay(Duration::from_secs(5)),
        )
        .with_priority(1)
        .mount(server)
        .await;
}

/// Page timeout used together with [`mount_stalled_page`]
pub(crate) const STALL_TIMEOUT: Duration = Duration::from_millis(200);

/// Serve `body` for every identifier not mounted individually, expecting `hits` requests
pub(crate) async fn mount_fallback(server: &MockServer, body: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path("/notice"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(hits)
        .mount(server)
        .await;
}

/// Serve an attachment for HEAD and GET
pub(crate) async fn mount_attachment(server: &MockServer, file_path: &str, body: &'static [u8]) {
    Mock::given(method("HEAD"))
        .and(path(file_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-length", body.len().to_string().as_str())
                .set_body_bytes(body),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

/// Extractor returning a fixed bill of quantities and counting its calls
pub(crate) struct StubExtractor {
    pub(crate) calls: AtomicUsize,
}

impl StubExtractor {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableExtractor for StubExtractor {
    async fn extract(&self, _pdf: &Path) -> Result<Vec<Table>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Table::from_rows([
            ["Item", "Description", "Unit", "Qty"],
            ["1", "Mobilization", "l.s.", "1"],
            ["2", "Concrete works", "cu.m.", "35"],
        ])])
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Renderer that writes a placeholder PDF instead of driving a browser
pub(crate) struct FakeRenderer {
    pub(crate) fail: bool,
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn render_pdf(&self, url: &str, out_path: &Path) -> Result<(), CaptureError> {
        if self.fail {
            return Err(CaptureError::RenderFailed {
                url: url.to_string(),
                reason: "navigation timed out".into(),
            });
        }
        tokio::fs::write(out_path, b"%PDF-1.4\n% rendered notice\n%%EOF\n")
            .await
            .map_err(|e| CaptureError::RenderFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
