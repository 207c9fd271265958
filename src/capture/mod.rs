//! Document capture for relevant notices
//!
//! A notice is captured from the best source available:
//!
//! 1. A bill-of-quantities attachment linked from the page, downloaded as-is
//! 2. A full-page PDF rendering through a [`PageRenderer`]
//!
//! The renderer is a pluggable capability. [`NoopRenderer`] stands in when no
//! browser is available so the harvester keeps running with attachment
//! captures only.

#[cfg(feature = "browser")]
mod chromium;
mod renderer;

#[cfg(feature = "browser")]
pub use chromium::{ChromiumRenderer, find_chromium};
pub use renderer::{NoopRenderer, PageRenderer};

use crate::types::{AttachmentRef, RecordId};
use regex::Regex;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

// Infallible literal selector
#[allow(clippy::unwrap_used)]
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

/// File name used for full-page snapshots
pub const SNAPSHOT_NAME: &str = "notice.pdf";

/// Find the first link whose target matches the attachment pattern
///
/// The link is resolved against `page_url`. The stored file name is the last
/// path segment of the link as written, with spaces replaced by underscores.
pub fn find_attachment(document: &Html, page_url: &Url, pattern: &Regex) -> Option<AttachmentRef> {
    let href = document
        .select(&LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| pattern.is_match(href))?;

    let url = match page_url.join(href) {
        Ok(url) => url,
        Err(e) => {
            debug!(href, error = %e, "attachment link does not resolve");
            return None;
        }
    };

    let basename = href.rsplit(['/', '\\']).next().unwrap_or(href);
    Some(AttachmentRef {
        url,
        filename: basename.replace(' ', "_"),
    })
}

/// Raw-tier path for a downloaded attachment: `{id}_{filename}`
pub fn attachment_path(raw_dir: &Path, id: &RecordId, attachment: &AttachmentRef) -> PathBuf {
    raw_dir.join(format!("{}_{}", id, attachment.filename))
}

/// Raw-tier path for a rendered snapshot: `{id}_notice.pdf`
pub fn snapshot_path(raw_dir: &Path, id: &RecordId) -> PathBuf {
    raw_dir.join(format!("{}_{}", id, SNAPSHOT_NAME))
}
