//! Page rendering capability

use crate::error::CaptureError;
use async_trait::async_trait;
use std::path::Path;

/// Renders a web page to a single PDF document
///
/// Implementations acquire whatever browser session they need per call and
/// release it before returning, so no rendering resources are held between
/// captures.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render `url` and write the PDF to `out_path`
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::RendererUnavailable`] when the implementation
    /// cannot render at all, or [`CaptureError::RenderFailed`] when this page
    /// could not be rendered.
    async fn render_pdf(&self, url: &str, out_path: &Path) -> Result<(), CaptureError>;

    /// Whether this renderer can produce snapshots
    fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Renderer used when no browser is available
///
/// Fails fast so relevant notices without an attachment are recorded as
/// "no capture" instead of stalling the sweep.
pub struct NoopRenderer;

#[async_trait]
impl PageRenderer for NoopRenderer {
    async fn render_pdf(&self, _url: &str, _out_path: &Path) -> Result<(), CaptureError> {
        Err(CaptureError::RendererUnavailable(
            "page snapshots require a Chromium browser. \
             Build with the `browser` feature and set chromium_path or put chromium in PATH."
                .into(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
