//! Chromium-based renderer using chromiumoxide.

use super::renderer::PageRenderer;
use crate::error::CaptureError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

// A4 in inches
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;

/// Find a Chromium binary.
///
/// Checks `TENDER_SWEEP_CHROMIUM`, then the usual executable names in PATH.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("TENDER_SWEEP_CHROMIUM") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    ["chromium", "chromium-browser", "google-chrome", "google-chrome-stable"]
        .into_iter()
        .find_map(|name| which::which(name).ok())
}

/// Bound `work` by `limit`, turning an elapsed deadline into an error
///
/// The caller keeps control after a timeout, so its cleanup still runs.
async fn within<F>(limit: Duration, work: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    tokio::time::timeout(limit, work)
        .await
        .unwrap_or_else(|_| Err(format!("render timed out after {}s", limit.as_secs_f64())))
}

/// Renders notice pages to A4 PDFs with a headless Chromium.
///
/// Every call launches its own browser and closes it afterwards.
pub struct ChromiumRenderer {
    chrome_path: PathBuf,
    timeout: Duration,
}

impl ChromiumRenderer {
    /// Create a renderer for the given executable
    pub fn new(chrome_path: PathBuf, timeout: Duration) -> Self {
        Self {
            chrome_path,
            timeout,
        }
    }

    /// Create a renderer from an auto-discovered executable
    pub fn from_path(timeout: Duration) -> Option<Self> {
        find_chromium().map(|path| Self::new(path, timeout))
    }

    async fn render_in_fresh_browser(&self, url: &str, out_path: &Path) -> Result<(), String> {
        let config = BrowserConfig::builder()
            .chrome_executable(&self.chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| format!("failed to build browser config: {e}"))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| format!("failed to launch Chromium: {e}"))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let navigate_and_print = async {
            let page = browser
                .new_page(url)
                .await
                .map_err(|e| format!("navigation failed: {e}"))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| format!("page did not finish loading: {e}"))?;

            let params = PrintToPdfParams {
                paper_width: Some(A4_WIDTH_IN),
                paper_height: Some(A4_HEIGHT_IN),
                print_background: Some(true),
                ..PrintToPdfParams::default()
            };
            page.save_pdf(params, out_path)
                .await
                .map_err(|e| format!("print to PDF failed: {e}"))?;
            Ok::<(), String>(())
        };
        let result = within(self.timeout, navigate_and_print).await;

        // The browser is released whether or not the page printed
        if let Err(e) = browser.close().await {
            warn!(error = %e, "failed to close Chromium cleanly");
        }
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "failed to reap Chromium process");
        }
        handler_task.abort();

        result
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render_pdf(&self, url: &str, out_path: &Path) -> Result<(), CaptureError> {
        debug!(url, ?out_path, "rendering page snapshot");

        let Err(reason) = self.render_in_fresh_browser(url, out_path).await else {
            return Ok(());
        };

        // Do not leave a truncated snapshot behind
        if let Err(e) = tokio::fs::remove_file(out_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(?out_path, error = %e, "failed to remove partial snapshot");
        }
        Err(CaptureError::RenderFailed {
            url: url.to_string(),
            reason,
        })
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
