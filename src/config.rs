//! Configuration types for tender-sweep
//!
//! A [`Config`] is built once at startup, validated, and shared read-only
//! (behind an `Arc`) by every component of the harvester.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the record identifier in the notice URL template
pub const ID_PLACEHOLDER: &str = "{id}";

/// Identifier sweep settings (range, miss threshold, politeness delay)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// First (highest) identifier of the sweep (default: 10098537)
    #[serde(default = "default_anchor_id")]
    pub anchor_id: u64,

    /// Number of identifiers below the anchor to visit (default: 10000)
    ///
    /// The sweep visits `anchor_id` down to `anchor_id - window` inclusive.
    #[serde(default = "default_window")]
    pub window: u64,

    /// Consecutive non-productive identifiers tolerated before the sweep
    /// assumes it has run past the end of valid data (default: 600)
    #[serde(default = "default_max_misses")]
    pub max_misses_in_a_row: u32,

    /// Pause between identifiers (default: 1 second)
    #[serde(default = "default_request_delay", with = "duration_serde")]
    pub request_delay: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            anchor_id: default_anchor_id(),
            window: default_window(),
            max_misses_in_a_row: default_max_misses(),
            request_delay: default_request_delay(),
        }
    }
}

/// Storage tiers and budget policy
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Raw tier: captured PDFs and their ZIP archives (default: "boq_raw")
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,

    /// Clean tier: extracted CSV tables (default: "boq_clean")
    #[serde(default = "default_clean_dir")]
    pub clean_dir: PathBuf,

    /// Combined byte cap for both tiers (default: 20 GiB)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Delete the uncompressed capture once its archive is written (default: true)
    #[serde(default = "default_true")]
    pub delete_raw_after_archive: bool,

    /// Abort the sweep once the cap is reached (default: false)
    #[serde(default)]
    pub stop_when_full: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            clean_dir: default_clean_dir(),
            max_bytes: default_max_bytes(),
            delete_raw_after_archive: true,
            stop_when_full: false,
        }
    }
}

/// The single storage budget policy in force for a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPolicy {
    /// Abort the sweep before processing an identifier once the cap is reached
    StopWhenFull,
    /// Evict the oldest raw archives before a download that would exceed the cap
    RollingPrune,
    /// No enforcement; deleting raw originals after archival is the only bound
    DeleteRaw,
}

impl StorageConfig {
    /// Derive the active budget policy
    ///
    /// Stop-when-full takes precedence. Rolling prune is only active when raw
    /// originals are retained and stop-when-full is off.
    pub fn budget_policy(&self) -> BudgetPolicy {
        if self.stop_when_full {
            BudgetPolicy::StopWhenFull
        } else if self.delete_raw_after_archive {
            BudgetPolicy::DeleteRaw
        } else {
            BudgetPolicy::RollingPrune
        }
    }
}

/// Portal endpoint, request identity and per-operation timeouts
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Notice page URL with an `{id}` placeholder
    #[serde(default = "default_notice_url_template")]
    pub notice_url_template: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for fetching a notice page (default: 30 seconds)
    #[serde(default = "default_page_timeout", with = "duration_serde")]
    pub page_timeout: Duration,

    /// Timeout for the attachment HEAD probe (default: 30 seconds)
    #[serde(default = "default_probe_timeout", with = "duration_serde")]
    pub probe_timeout: Duration,

    /// Timeout for an attachment download (default: 120 seconds)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download_timeout: Duration,

    /// Timeout for rendering one page to PDF (default: 60 seconds)
    #[serde(default = "default_render_timeout", with = "duration_serde")]
    pub render_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            notice_url_template: default_notice_url_template(),
            user_agent: default_user_agent(),
            page_timeout: default_page_timeout(),
            probe_timeout: default_probe_timeout(),
            download_timeout: default_download_timeout(),
            render_timeout: default_render_timeout(),
        }
    }
}

/// Relevance rules and attachment naming pattern
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Title relevance pattern, matched case-insensitively
    #[serde(default = "default_title_pattern")]
    pub title_pattern: String,

    /// Category prefix that marks a notice relevant, compared case-insensitively
    #[serde(default = "default_category_prefix")]
    pub category_prefix: String,

    /// Attachment link pattern, matched case-insensitively against `href`
    #[serde(default = "default_attachment_pattern")]
    pub attachment_pattern: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            title_pattern: default_title_pattern(),
            category_prefix: default_category_prefix(),
            attachment_pattern: default_attachment_pattern(),
        }
    }
}

/// External tool locations (table engines, browser)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to a `tabula` launcher (auto-detected if None)
    #[serde(default)]
    pub tabula_path: Option<PathBuf>,

    /// Path to the tabula-java jar; run through `java -jar` when set
    #[serde(default)]
    pub tabula_jar: Option<PathBuf>,

    /// Path to the java executable used with `tabula_jar` (auto-detected if None)
    #[serde(default)]
    pub java_path: Option<PathBuf>,

    /// Path to poppler's `pdftotext` (auto-detected if None)
    #[serde(default)]
    pub pdftotext_path: Option<PathBuf>,

    /// Path to a Chromium executable (auto-detected if None)
    #[serde(default)]
    pub chromium_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tabula_path: None,
            tabula_jar: None,
            java_path: None,
            pdftotext_path: None,
            chromium_path: None,
            search_path: true,
        }
    }
}

/// Main configuration for the harvester
///
/// Sub-configs are flattened, so the JSON form is a single flat object:
///
/// ```json
/// { "anchor_id": 10098537, "window": 500, "stop_when_full": true }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Identifier range and pacing
    #[serde(flatten)]
    pub sweep: SweepConfig,

    /// Storage tiers and budget
    #[serde(flatten)]
    pub storage: StorageConfig,

    /// Portal endpoint and timeouts
    #[serde(flatten)]
    pub network: NetworkConfig,

    /// Relevance and attachment patterns
    #[serde(flatten)]
    pub classifier: ClassifierConfig,

    /// External tool paths
    #[serde(flatten)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Load a configuration from a JSON file; missing keys take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Check the configuration for values the harvester cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(10_000_000..=99_999_999).contains(&self.sweep.anchor_id) {
            return Err(Error::config(
                "anchor_id",
                format!("{} is not an 8-digit identifier", self.sweep.anchor_id),
            ));
        }
        if self.sweep.max_misses_in_a_row == 0 {
            return Err(Error::config(
                "max_misses_in_a_row",
                "must be greater than zero",
            ));
        }
        if self.storage.max_bytes == 0 {
            return Err(Error::config("max_bytes", "must be greater than zero"));
        }
        if !self.network.notice_url_template.contains(ID_PLACEHOLDER) {
            return Err(Error::config(
                "notice_url_template",
                format!("must contain the {ID_PLACEHOLDER} placeholder"),
            ));
        }
        url::Url::parse(&self.notice_url(&"0".repeat(8)))?;

        for (key, pattern) in [
            ("title_pattern", &self.classifier.title_pattern),
            ("attachment_pattern", &self.classifier.attachment_pattern),
        ] {
            compile_pattern(key, pattern)?;
        }
        Ok(())
    }

    /// Notice page URL for one identifier
    pub fn notice_url(&self, id: &str) -> String {
        self.network.notice_url_template.replace(ID_PLACEHOLDER, id)
    }
}

/// Compile a case-insensitive pattern from configuration
///
/// The compiled size is capped so an oversized pattern is rejected up front
/// instead of exhausting memory during matching.
pub(crate) fn compile_pattern(key: &str, pattern: &str) -> Result<regex::Regex> {
    regex::RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(1 << 20)
        .build()
        .map_err(|e| Error::InvalidPattern {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

fn default_anchor_id() -> u64 {
    10_098_537
}

fn default_window() -> u64 {
    10_000
}

fn default_max_misses() -> u32 {
    600
}

fn default_request_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("boq_raw")
}

fn default_clean_dir() -> PathBuf {
    PathBuf::from("boq_clean")
}

fn default_max_bytes() -> u64 {
    20 * 1024 * 1024 * 1024 // 20 GiB
}

fn default_true() -> bool {
    true
}

fn default_notice_url_template() -> String {
    "https://notices.philgeps.gov.ph/GEPSNONPILOT/Tender/PrintableBidNoticeAbstractUI.aspx?refID={id}"
        .to_string()
}

fn default_user_agent() -> String {
    concat!("tender-sweep/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_page_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_render_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_title_pattern() -> String {
    r"\b(construction|building|structural)\b".to_string()
}

fn default_category_prefix() -> String {
    "construction projects".to_string()
}

fn default_attachment_pattern() -> String {
    r"(bill.*quantities|schedule.*prices|boq).*\.pdf$".to_string()
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
