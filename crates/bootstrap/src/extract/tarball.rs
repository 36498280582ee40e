//! Stream-only tar extraction

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{info, warn};

use super::{ArchiveExtractor, ExtractError, ExtractionSummary, Result, delete_archive, resolve_archive};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Sequential extractor for `.tar` and `.tar.gz` archives.
///
/// Entries are only reachable by reading the stream front to back, so the
/// whole archive is unpacked in one operation without progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarExtractor;

impl ArchiveExtractor for TarExtractor {
    fn name(&self) -> &'static str {
        "tar"
    }

    fn extract(
        &self,
        archive: &Path,
        delete_after: bool,
        progress_callback: Option<crate::downloader::ProgressCallback>,
    ) -> Result<ExtractionSummary> {
        let (archive_path, destination) = resolve_archive(archive)?;
        info!("Extracting {} into {}", archive_path.display(), destination.display());
        if progress_callback.is_some() {
            // TODO: decide whether stream extraction should report progress by compressed bytes read
            warn!("Progress is not reported for tar archives");
        }

        {
            let reader = open_stream(&archive_path)?;
            let mut tarball = tar::Archive::new(reader);
            tarball.unpack(&destination).map_err(|e| ExtractError::Unpack {
                path: archive_path.clone(),
                source: e,
            })?;
        }

        if delete_after {
            delete_archive(&archive_path)?;
        }

        Ok(ExtractionSummary {
            destination,
            stats: None,
            archive_deleted: delete_after,
        })
    }
}

/// Open the archive, transparently decompressing gzip
fn open_stream(archive_path: &Path) -> Result<Box<dyn Read>> {
    let open_error = |e| ExtractError::Open {
        path: archive_path.to_path_buf(),
        source: e,
    };

    let mut file = File::open(archive_path).map_err(open_error)?;
    let mut magic = [0u8; 2];
    let read = file.read(&mut magic).map_err(open_error)?;
    file.seek(SeekFrom::Start(0)).map_err(open_error)?;

    let reader = BufReader::new(file);
    if read == GZIP_MAGIC.len() && magic == GZIP_MAGIC {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}
