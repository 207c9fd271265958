//! Placeholder extractor for engines that are not installed

use super::{Table, TableExtractor};
use crate::error::ExtractionError;
use async_trait::async_trait;
use std::path::Path;

/// Extractor that always fails
///
/// Occupies a strategy slot when its engine is missing so the chain keeps its
/// order and the remaining strategies still run.
pub struct NoOpExtractor {
    name: &'static str,
}

impl NoOpExtractor {
    /// Create a placeholder for the named strategy
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl TableExtractor for NoOpExtractor {
    async fn extract(&self, _pdf: &Path) -> Result<Vec<Table>, ExtractionError> {
        Err(ExtractionError::StrategyFailed {
            strategy: self.name,
            reason: "extraction engine not installed".into(),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
