//! Deflate archiving of raw captures
//!
//! Each capture becomes a single-entry zip next to it, named `<file>.zip`.
//! Entries carry a fixed timestamp so archiving the same bytes twice yields
//! the same archive.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Archive path for a capture: the capture path with `.zip` appended
pub fn archive_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_os_string();
    name.push(".zip");
    PathBuf::from(name)
}

/// Compress `artifact` into `<artifact>.zip`, optionally removing the original
///
/// The original is only removed once the archive has been fully written.
pub fn archive_artifact(artifact: &Path, delete_original: bool) -> Result<PathBuf> {
    let dest = archive_path(artifact);
    if let Err(e) = write_archive(artifact, &dest) {
        if dest.exists()
            && let Err(rm) = std::fs::remove_file(&dest)
        {
            warn!(?dest, error = %rm, "failed to remove incomplete archive");
        }
        return Err(e);
    }
    debug!(?artifact, ?dest, "capture archived");

    if delete_original {
        std::fs::remove_file(artifact)?;
        debug!(?artifact, "raw capture removed after archiving");
    }
    Ok(dest)
}

/// [`archive_artifact`] on the blocking pool
pub async fn archive_artifact_async(artifact: &Path, delete_original: bool) -> Result<PathBuf> {
    let owned = artifact.to_path_buf();
    spawn_blocking(move || archive_artifact(&owned, delete_original))
        .await
        .map_err(|e| Error::Archive {
            path: artifact.to_path_buf(),
            reason: format!("archive task panicked: {e}"),
        })?
}

fn write_archive(artifact: &Path, dest: &Path) -> Result<()> {
    let entry_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Archive {
            path: artifact.to_path_buf(),
            reason: "capture path has no file name".into(),
        })?;

    let mut source = File::open(artifact)?;
    let mut zip = ZipWriter::new(BufWriter::new(File::create(dest)?));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let zip_err = |e: zip::result::ZipError| Error::Archive {
        path: artifact.to_path_buf(),
        reason: e.to_string(),
    };

    zip.start_file(entry_name, options).map_err(zip_err)?;
    std::io::copy(&mut source, &mut zip)?;
    let mut out = zip.finish().map_err(zip_err)?;
    out.flush()?;
    Ok(())
}
