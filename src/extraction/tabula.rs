//! Lattice extraction through the tabula-java command line

use super::{Table, TableExtractor};
use crate::config::ToolsConfig;
use crate::error::ExtractionError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

const STRATEGY: &str = "tabula-lattice";

#[derive(Debug, Deserialize)]
struct TabulaTable {
    #[serde(default)]
    data: Vec<Vec<TabulaCell>>,
}

#[derive(Debug, Deserialize)]
struct TabulaCell {
    #[serde(default)]
    text: String,
}

/// Parse tabula's `--format JSON` output into tables
///
/// Tables without any rows are dropped.
pub fn parse_tabula_json(raw: &[u8]) -> Result<Vec<Table>, serde_json::Error> {
    let tables: Vec<TabulaTable> = serde_json::from_slice(raw)?;
    Ok(tables
        .into_iter()
        .filter(|t| !t.data.is_empty())
        .map(|t| Table {
            rows: t
                .data
                .into_iter()
                .map(|row| row.into_iter().map(|cell| cell.text).collect())
                .collect(),
        })
        .collect())
}

/// Ruling-line table detection with tabula
///
/// Runs `<program> [prefix args] --lattice --pages all --format JSON <pdf>`.
/// The program is either a `tabula` launcher or `java` with `-jar <jar>`.
pub struct TabulaExtractor {
    program: PathBuf,
    prefix_args: Vec<String>,
}

impl TabulaExtractor {
    /// Create an extractor for a `tabula` launcher
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            prefix_args: Vec::new(),
        }
    }

    /// Create an extractor that runs the tabula-java jar through `java -jar`
    pub fn with_jar(java: PathBuf, jar: &Path) -> Self {
        Self {
            program: java,
            prefix_args: vec!["-jar".to_string(), jar.to_string_lossy().into_owned()],
        }
    }

    /// Resolve from configuration: explicit jar, explicit launcher, then PATH
    pub fn from_config(tools: &ToolsConfig) -> Option<Self> {
        if let Some(jar) = &tools.tabula_jar {
            let java = tools
                .java_path
                .clone()
                .or_else(|| which::which("java").ok())?;
            return Some(Self::with_jar(java, jar));
        }
        if let Some(path) = &tools.tabula_path {
            return Some(Self::new(path.clone()));
        }
        if tools.search_path {
            return which::which("tabula").ok().map(Self::new);
        }
        None
    }
}

#[async_trait]
impl TableExtractor for TabulaExtractor {
    async fn extract(&self, pdf: &Path) -> Result<Vec<Table>, ExtractionError> {
        debug!(?pdf, program = ?self.program, "running tabula");
        let output = Command::new(&self.program)
            .args(&self.prefix_args)
            .args(["--lattice", "--pages", "all", "--format", "JSON"])
            .arg(pdf)
            .output()
            .await
            .map_err(|e| ExtractionError::StrategyFailed {
                strategy: STRATEGY,
                reason: format!("failed to execute tabula: {e}"),
            })?;

        if !output.status.success() {
            return Err(ExtractionError::StrategyFailed {
                strategy: STRATEGY,
                reason: format!(
                    "tabula exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let tables = parse_tabula_json(&output.stdout).map_err(|e| ExtractionError::StrategyFailed {
            strategy: STRATEGY,
            reason: format!("unreadable tabula output: {e}"),
        })?;
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
