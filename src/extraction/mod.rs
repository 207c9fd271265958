//! Table extraction from bill-of-quantities PDFs
//!
//! Extraction runs an ordered list of strategies until one produces a
//! non-empty table:
//!
//! - [`TabulaExtractor`]: ruling-line (lattice) detection via tabula
//! - [`LayoutTextExtractor`]: whitespace (stream) detection over `pdftotext -layout`
//! - [`NoOpExtractor`]: placeholder when an engine is not installed
//!
//! The fragments of the winning strategy are merged into one normalized table
//! and written as CSV into the clean tier.

mod csv;
mod layout;
mod noop;
mod tabula;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use csv::write_csv;
pub use layout::{LayoutTextExtractor, parse_layout_text};
pub use noop::NoOpExtractor;
pub use tabula::{TabulaExtractor, parse_tabula_json};

use crate::config::ToolsConfig;
use crate::error::ExtractionError;
use crate::types::{ArtifactKind, CaptureArtifact, ExtractedTable};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One table fragment as returned by an extraction engine
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    /// Cell text, row-major; rows may have different lengths
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from rows of string slices
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }
}

/// A table extraction engine
///
/// An engine that runs but finds nothing returns `Ok` with an empty list; the
/// chain treats that the same as a failure and moves on.
#[async_trait]
pub trait TableExtractor: Send + Sync {
    /// Extract every table on every page of `pdf`
    async fn extract(&self, pdf: &Path) -> Result<Vec<Table>, ExtractionError>;

    /// Strategy name for logging and reports
    fn name(&self) -> &'static str;
}

/// Ordered fallback over extraction strategies
#[derive(Clone)]
pub struct ExtractionChain {
    strategies: Vec<Arc<dyn TableExtractor>>,
    clean_dir: PathBuf,
}

impl ExtractionChain {
    /// Create a chain writing into `clean_dir`
    pub fn new(strategies: Vec<Arc<dyn TableExtractor>>, clean_dir: PathBuf) -> Self {
        Self {
            strategies,
            clean_dir,
        }
    }

    /// Lattice first, then stream, each falling back to [`NoOpExtractor`]
    /// when its engine is not installed
    pub fn from_tools(tools: &ToolsConfig, clean_dir: PathBuf) -> Self {
        let lattice: Arc<dyn TableExtractor> = match TabulaExtractor::from_config(tools) {
            Some(tabula) => Arc::new(tabula),
            None => {
                warn!("tabula not found, lattice extraction disabled");
                Arc::new(NoOpExtractor::new("tabula-lattice"))
            }
        };
        let stream: Arc<dyn TableExtractor> = match LayoutTextExtractor::from_config(tools) {
            Some(layout) => Arc::new(layout),
            None => {
                warn!("pdftotext not found, stream extraction disabled");
                Arc::new(NoOpExtractor::new("layout-stream"))
            }
        };
        Self::new(vec![lattice, stream], clean_dir)
    }

    /// Names of the strategies in evaluation order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Extract a table from an attachment capture and persist it as CSV
    ///
    /// The CSV is named after the artifact stem, e.g. `10098537_BOQ.pdf`
    /// becomes `10098537_BOQ.csv`.
    pub async fn run(&self, artifact: &CaptureArtifact) -> Result<ExtractedTable, ExtractionError> {
        if artifact.kind != ArtifactKind::Attachment {
            return Err(ExtractionError::NotAnAttachment {
                path: artifact.path.clone(),
            });
        }
        let pdf = artifact.path.as_path();

        for strategy in &self.strategies {
            let tables = match strategy.extract(pdf).await {
                Ok(tables) => tables,
                Err(e) => {
                    warn!(strategy = strategy.name(), ?pdf, error = %e, "extraction strategy failed");
                    continue;
                }
            };

            let rows = normalize(tables);
            if rows.is_empty() {
                debug!(strategy = strategy.name(), ?pdf, "extraction strategy found no tables");
                continue;
            }

            let csv_path = self.csv_path(pdf);
            write_csv(&csv_path, &rows).await.map_err(|e| {
                ExtractionError::StrategyFailed {
                    strategy: strategy.name(),
                    reason: format!("failed to write {}: {}", csv_path.display(), e),
                }
            })?;

            let columns = rows.first().map(Vec::len).unwrap_or(0);
            info!(
                strategy = strategy.name(),
                ?csv_path,
                rows = rows.len(),
                columns,
                "table extracted"
            );
            return Ok(ExtractedTable {
                path: csv_path,
                rows: rows.len(),
                columns,
                strategy: strategy.name().to_string(),
            });
        }

        Err(ExtractionError::Exhausted {
            pdf: pdf.to_path_buf(),
        })
    }

    fn csv_path(&self, pdf: &Path) -> PathBuf {
        let stem = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "table".to_string());
        self.clean_dir.join(format!("{stem}.csv"))
    }
}

/// Merge table fragments into one rectangular table
///
/// Rows are concatenated in order and padded to the widest row. Cells are
/// trimmed, then rows and columns with no content are dropped.
pub fn normalize(tables: Vec<Table>) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = tables
        .into_iter()
        .flat_map(|t| t.rows)
        .map(|row| row.into_iter().map(|c| c.trim().to_string()).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }

    let keep: Vec<bool> = (0..width)
        .map(|col| rows.iter().any(|row| !row[col].is_empty()))
        .collect();

    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter_map(|(cell, keep)| keep.then_some(cell))
                .collect()
        })
        .collect()
}
