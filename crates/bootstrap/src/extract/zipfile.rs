//! Zip extraction with per-entry progress and idempotent re-runs

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use super::{
    ArchiveExtractor, ExtractError, ExtractionStats, ExtractionSummary, Result, delete_archive,
    resolve_archive,
};
use crate::downloader::{FileOperation, ProgressCallback, ProgressEvent, ProgressState};

/// One entry of a zip archive, enumerated before anything is extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    pub is_dir: bool,
    /// Where the entry lands on disk
    pub target: PathBuf,
}

impl ArchiveEntry {
    /// A file entry whose output already exists counts as extracted
    pub fn already_present(&self) -> bool {
        !self.is_dir && self.target.is_file()
    }
}

/// Enumerable-entry extractor for zip archives
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ZipExtractor {
    /// List every entry of `archive_path` with its size and output path
    pub fn entries(archive_path: &Path, destination: &Path) -> Result<Vec<ArchiveEntry>> {
        let mut archive = open_archive(archive_path)?;
        enumerate_entries(&mut archive, archive_path, destination)
    }

    fn extract_entries(
        &self,
        archive_path: &Path,
        destination: &Path,
        progress_callback: &Option<ProgressCallback>,
    ) -> Result<ExtractionStats> {
        let mut archive = open_archive(archive_path)?;
        let entries = enumerate_entries(&mut archive, archive_path, destination)?;

        // Sizes come straight from the central directory and may be forged.
        let total = entries
            .iter()
            .filter(|entry| !entry.already_present())
            .try_fold(0u64, |total, entry| total.checked_add(entry.size))
            .ok_or_else(|| ExtractError::SizeOverflow {
                path: archive_path.to_path_buf(),
            })?;
        debug!("{} entries, {} bytes left to extract", entries.len(), total);

        let label = archive_path.display().to_string();
        if let Some(callback) = progress_callback {
            callback(ProgressEvent::ExtractionStarted {
                archive: label.clone(),
                total_size: total,
            });
        }

        let mut progress = ProgressState::new(Some(total));
        if total == 0 {
            report_progress(&label, &progress, progress_callback);
        }

        let mut stats = ExtractionStats::default();
        for (index, entry) in entries.iter().enumerate() {
            if entry.is_dir {
                fs::create_dir_all(&entry.target)
                    .map_err(|e| ExtractError::file_system(&entry.target, FileOperation::CreateDir, e))?;
                continue;
            }

            if let Some(parent) = entry.target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| ExtractError::file_system(parent, FileOperation::CreateDir, e))?;
            }

            if entry.already_present() {
                debug!("Skipping {}, already extracted", entry.name);
                stats.skipped_entries += 1;
            } else {
                extract_entry(&mut archive, index, archive_path, entry)?;
                progress.advance(entry.size);
                stats.extracted_entries += 1;
                stats.extracted_bytes += entry.size;
            }

            report_progress(&label, &progress, progress_callback);
        }

        if let Some(callback) = progress_callback {
            callback(ProgressEvent::ExtractionComplete {
                archive: label,
                extracted: stats.extracted_bytes,
            });
        }

        Ok(stats)
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn extract(
        &self,
        archive: &Path,
        delete_after: bool,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<ExtractionSummary> {
        let (archive_path, destination) = resolve_archive(archive)?;
        info!("Extracting {} into {}", archive_path.display(), destination.display());

        // The archive handle is closed when this returns, before any deletion.
        let stats = self.extract_entries(&archive_path, &destination, &progress_callback)?;

        if delete_after {
            delete_archive(&archive_path)?;
        }

        Ok(ExtractionSummary {
            destination,
            stats: Some(stats),
            archive_deleted: delete_after,
        })
    }
}

fn open_archive(archive_path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(archive_path).map_err(|e| ExtractError::Open {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| ExtractError::Corrupt {
        path: archive_path.to_path_buf(),
        source: e,
    })
}

fn enumerate_entries(
    archive: &mut ZipArchive<BufReader<File>>,
    archive_path: &Path,
    destination: &Path,
) -> Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let file = archive.by_index_raw(index).map_err(|e| ExtractError::Corrupt {
            path: archive_path.to_path_buf(),
            source: e,
        })?;

        let name = file.name().to_string();
        let relative = file
            .enclosed_name()
            .ok_or_else(|| ExtractError::UnsafeEntry { name: name.clone() })?;

        entries.push(ArchiveEntry {
            size: file.size(),
            is_dir: file.is_dir(),
            target: destination.join(relative),
            name,
        });
    }

    Ok(entries)
}

fn extract_entry(
    archive: &mut ZipArchive<BufReader<File>>,
    index: usize,
    archive_path: &Path,
    entry: &ArchiveEntry,
) -> Result<()> {
    let mut file = archive.by_index(index).map_err(|e| ExtractError::Corrupt {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    let mut outfile = File::create(&entry.target)
        .map_err(|e| ExtractError::file_system(&entry.target, FileOperation::Create, e))?;
    io::copy(&mut file, &mut outfile)
        .map_err(|e| ExtractError::file_system(&entry.target, FileOperation::Write, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = file.unix_mode() {
            fs::set_permissions(&entry.target, fs::Permissions::from_mode(mode))
                .map_err(|e| ExtractError::file_system(&entry.target, FileOperation::Write, e))?;
        }
    }

    Ok(())
}

fn report_progress(label: &str, progress: &ProgressState, progress_callback: &Option<ProgressCallback>) {
    if let Some(callback) = progress_callback {
        callback(ProgressEvent::ExtractionProgress {
            archive: label.to_string(),
            progress: *progress,
        });
    }
}
