//! Mock notice portal and harvester configuration

use std::time::Duration;
use tempfile::TempDir;
use tender_sweep::Config;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointing at `server`, with both tiers inside `dir`
pub fn portal_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.network.notice_url_template = format!(
        "{}/GEPSNONPILOT/Tender/PrintableBidNoticeAbstractUI.aspx?refID={{id}}",
        server.uri()
    );
    config.sweep.request_delay = Duration::ZERO;
    config.storage.raw_dir = dir.path().join("boq_raw");
    config.storage.clean_dir = dir.path().join("boq_clean");
    config.tools.search_path = false;
    config
}

/// Serve `body` for one identifier
pub async fn serve_notice(server: &MockServer, id: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/GEPSNONPILOT/Tender/PrintableBidNoticeAbstractUI.aspx"))
        .and(query_param("refID", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .with_priority(1)
        .expect(1)
        .mount(server)
        .await;
}

/// Serve the placeholder page for every other identifier
pub async fn serve_placeholders(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/GEPSNONPILOT/Tender/PrintableBidNoticeAbstractUI.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serve an attachment for HEAD and GET
pub async fn serve_attachment(server: &MockServer, file_path: &str, body: &'static [u8]) {
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
        .expect(1)
        .mount(server)
        .await;
}
