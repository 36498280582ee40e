//! Archive extraction
//!
//! Two capabilities exist behind [`ArchiveExtractor`]:
//!
//! - [`ZipExtractor`] enumerates entries up front, reports progress per entry
//!   and skips entries whose output file already exists.
//! - [`TarExtractor`] unpacks a (optionally gzipped) tar stream in one pass
//!   and reports no progress.
//!
//! The host picks one of them once, through [`for_host`].

pub mod error;
pub mod tarball;
pub mod zipfile;

pub use error::{ExtractError, Result};
pub use tarball::TarExtractor;
pub use zipfile::{ArchiveEntry, ZipExtractor};

use crate::downloader::{FileOperation, ProgressCallback};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Counters for an extraction that enumerated its entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub extracted_entries: usize,
    /// Entries whose output already existed on disk
    pub skipped_entries: usize,
    pub extracted_bytes: u64,
}

/// Outcome of a successful extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Directory the archive was unpacked into
    pub destination: PathBuf,
    /// Present only for extractors that enumerate entries
    pub stats: Option<ExtractionStats>,
    pub archive_deleted: bool,
}

/// Unpacks an archive into the directory that contains it
pub trait ArchiveExtractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Extract `archive` next to itself, removing it afterwards when
    /// `delete_after` is set.
    fn extract(
        &self,
        archive: &Path,
        delete_after: bool,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<ExtractionSummary>;
}

/// Available extraction capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    Zip,
    Tar,
}

impl ExtractorKind {
    /// The capability this host uses by default
    pub fn for_host() -> Option<Self> {
        if cfg!(windows) {
            Some(ExtractorKind::Zip)
        } else if cfg!(unix) {
            Some(ExtractorKind::Tar)
        } else {
            None
        }
    }

    pub fn build(self) -> Box<dyn ArchiveExtractor> {
        match self {
            ExtractorKind::Zip => Box::new(ZipExtractor),
            ExtractorKind::Tar => Box::new(TarExtractor),
        }
    }
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zip" => Ok(ExtractorKind::Zip),
            "tar" => Ok(ExtractorKind::Tar),
            other => Err(format!("unknown archive format '{}' (expected zip or tar)", other)),
        }
    }
}

/// Select the extractor for this host. Call once at startup.
pub fn for_host() -> Result<Box<dyn ArchiveExtractor>> {
    let kind = ExtractorKind::for_host().ok_or(ExtractError::Unsupported)?;
    debug!("Using {:?} extractor for this host", kind);
    Ok(kind.build())
}

/// Absolute archive path and the directory it will be unpacked into
pub(crate) fn resolve_archive(archive: &Path) -> Result<(PathBuf, PathBuf)> {
    let archive_path = std::path::absolute(archive).map_err(|e| ExtractError::Open {
        path: archive.to_path_buf(),
        source: e,
    })?;
    let destination = archive_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((archive_path, destination))
}

/// Remove the archive once its contents are on disk
pub(crate) fn delete_archive(archive_path: &Path) -> Result<()> {
    std::fs::remove_file(archive_path)
        .map_err(|e| ExtractError::file_system(archive_path, FileOperation::Delete, e))?;
    debug!("Deleted archive {}", archive_path.display());
    Ok(())
}
