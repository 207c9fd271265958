//! Storage budget for the raw and clean tiers
//!
//! Sizes are recomputed from disk on every query; the sweep is the only
//! writer, so nothing is cached between checks.

use crate::config::{BudgetPolicy, StorageConfig};
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension of raw-tier archives eligible for rolling prune
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Total size in bytes of all files under `path`
///
/// A missing directory counts as empty. Entries that vanish or cannot be read
/// while walking are skipped.
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|meta| meta.len())
        .sum()
}

/// Archives removed by a rolling prune
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Removed archives, oldest first
    pub removed: Vec<PathBuf>,
    /// Bytes freed
    pub freed: u64,
    /// Combined tier size after pruning
    pub size_after: u64,
    /// Whether the pending download fits under the cap after pruning
    pub fits: bool,
}

/// Byte budget over the raw and clean tiers
#[derive(Clone, Debug)]
pub struct StorageBudget {
    raw_dir: PathBuf,
    clean_dir: PathBuf,
    cap: u64,
    policy: BudgetPolicy,
}

impl StorageBudget {
    /// Create the budget and make sure both tier directories exist
    pub fn new(config: &StorageConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.raw_dir)?;
        std::fs::create_dir_all(&config.clean_dir)?;
        Ok(Self {
            raw_dir: config.raw_dir.clone(),
            clean_dir: config.clean_dir.clone(),
            cap: config.max_bytes,
            policy: config.budget_policy(),
        })
    }

    /// The active policy
    pub fn policy(&self) -> BudgetPolicy {
        self.policy
    }

    /// The byte cap
    pub fn cap(&self) -> u64 {
        self.cap
    }

    /// Raw tier directory
    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    /// Clean tier directory
    pub fn clean_dir(&self) -> &Path {
        &self.clean_dir
    }

    /// Combined size of the raw and clean tiers
    pub fn current_size(&self) -> u64 {
        dir_size(&self.raw_dir) + dir_size(&self.clean_dir)
    }

    /// Stop-when-full check; always false under other policies
    pub fn is_full(&self) -> bool {
        if self.policy != BudgetPolicy::StopWhenFull {
            return false;
        }
        let size = self.current_size();
        if size >= self.cap {
            info!(size, cap = self.cap, "storage cap reached");
            return true;
        }
        false
    }

    /// Rolling-prune pre-check before a download of `pending` bytes
    ///
    /// Returns `None` when rolling prune is not the active policy. Otherwise
    /// evicts raw-tier archives, oldest modification time first, until
    /// `current + pending <= cap` or no archives remain.
    pub fn make_room(&self, pending: u64) -> Result<Option<PruneReport>> {
        if self.policy != BudgetPolicy::RollingPrune {
            return Ok(None);
        }
        self.prune_for(pending).map(Some)
    }

    /// Evict oldest raw-tier archives until `pending` more bytes fit under the cap
    pub fn prune_for(&self, pending: u64) -> Result<PruneReport> {
        let mut total = self.current_size();
        let mut report = PruneReport {
            size_after: total,
            fits: total.saturating_add(pending) <= self.cap,
            ..PruneReport::default()
        };
        if report.fits {
            return Ok(report);
        }

        for (path, len) in self.archives_oldest_first()? {
            if total.saturating_add(pending) <= self.cap {
                break;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(?path, bytes = len, "pruned raw archive");
                    total = total.saturating_sub(len);
                    report.freed += len;
                    report.removed.push(path);
                }
                Err(e) => warn!(?path, error = %e, "failed to prune raw archive"),
            }
        }

        report.size_after = total;
        report.fits = total.saturating_add(pending) <= self.cap;
        if !report.fits {
            warn!(
                size = total,
                pending,
                cap = self.cap,
                "no archives left to prune, download will exceed the cap"
            );
        }
        Ok(report)
    }

    fn archives_oldest_first(&self) -> Result<Vec<(PathBuf, u64)>> {
        let mut archives: Vec<(PathBuf, u64, SystemTime)> = Vec::new();
        for entry in std::fs::read_dir(&self.raw_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_archive = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION));
            if !is_archive {
                continue;
            }
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            archives.push((path, meta.len(), modified));
        }

        archives.sort_by_key(|(_, _, modified)| *modified);
        debug!(count = archives.len(), "raw archives eligible for pruning");
        Ok(archives
            .into_iter()
            .map(|(path, len, _)| (path, len))
            .collect())
    }
}
