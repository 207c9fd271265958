//! Stream extraction: whitespace-aligned columns in `pdftotext -layout` output

use super::{Table, TableExtractor};
use crate::config::ToolsConfig;
use crate::error::ExtractionError;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::debug;

const STRATEGY: &str = "layout-stream";

/// Fewest consecutive multi-column lines that count as a table
const MIN_TABLE_ROWS: usize = 2;

// Infallible literal pattern
#[allow(clippy::unwrap_used)]
static COLUMN_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Split laid-out text into tables
///
/// Pages are separated by form feeds. A line belongs to a table when it splits
/// into at least two cells on runs of two or more spaces; consecutive such
/// lines form one table.
pub fn parse_layout_text(text: &str) -> Vec<Table> {
    let mut tables = Vec::new();

    for page in text.split('\u{c}') {
        let mut current: Vec<Vec<String>> = Vec::new();
        for line in page.lines() {
            let cells = split_columns(line);
            if cells.len() >= 2 {
                current.push(cells);
            } else {
                flush(&mut current, &mut tables);
            }
        }
        flush(&mut current, &mut tables);
    }

    tables
}

fn split_columns(line: &str) -> Vec<String> {
    COLUMN_GAP
        .split(line.trim())
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

fn flush(current: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
    if current.len() >= MIN_TABLE_ROWS {
        tables.push(Table {
            rows: std::mem::take(current),
        });
    } else {
        current.clear();
    }
}

/// Whitespace-based table detection over poppler's `pdftotext -layout`
pub struct LayoutTextExtractor {
    binary_path: PathBuf,
}

impl LayoutTextExtractor {
    /// Create an extractor with an explicit `pdftotext` path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Resolve from configuration, then PATH
    pub fn from_config(tools: &ToolsConfig) -> Option<Self> {
        if let Some(path) = &tools.pdftotext_path {
            return Some(Self::new(path.clone()));
        }
        if tools.search_path {
            return which::which("pdftotext").ok().map(Self::new);
        }
        None
    }
}

#[async_trait]
impl TableExtractor for LayoutTextExtractor {
    async fn extract(&self, pdf: &Path) -> Result<Vec<Table>, ExtractionError> {
        debug!(?pdf, "running pdftotext -layout");
        let output = Command::new(&self.binary_path)
            .arg("-layout")
            .arg(pdf)
            .arg("-")
            .output()
            .await
            .map_err(|e| ExtractionError::StrategyFailed {
                strategy: STRATEGY,
                reason: format!("failed to execute pdftotext: {e}"),
            })?;

        if !output.status.success() {
            return Err(ExtractionError::StrategyFailed {
                strategy: STRATEGY,
                reason: format!(
                    "pdftotext exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let tables = parse_layout_text(&String::from_utf8_lossy(&output.stdout));
        if tables.is_empty() {
            return Err(ExtractionError::NoTables {
                pdf: pdf.to_path_buf(),
            });
        }
        Ok(tables)
    }

    fn name(&self) -> &'static str {
        STRATEGY
    }
}
