//! HTTP-based file downloader with chunked progress reporting

use crate::downloader::{
    config::DownloadConfig,
    core::{DownloadError, FileOperation, ProgressCallback, ProgressEvent, ProgressState, Result},
    registry::FileDownloader,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{Instrument, debug, info_span};

/// HTTP-based file downloader
pub struct HttpDownloader {
    client: Client,
    config: DownloadConfig,
}

impl HttpDownloader {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DownloadError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    async fn download_file(
        &self,
        url: &str,
        dest_path: &Path,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::HttpRequest {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total_size = response.content_length();
        debug!("Content length: {:?}", total_size);

        if let Some(ref callback) = progress_callback {
            callback(ProgressEvent::DownloadStarted {
                url: url.to_string(),
                total_size,
            });
        }

        let mut file = fs::File::create(dest_path)
            .await
            .map_err(|e| DownloadError::file_system(dest_path, FileOperation::Create, e))?;

        let downloaded = match total_size {
            // Without a size hint there is nothing to report, take the body whole.
            None => {
                let body = response.bytes().await.map_err(|e| DownloadError::HttpRequest {
                    url: url.to_string(),
                    source: e,
                })?;
                write_chunk(&mut file, dest_path, &body).await?;
                body.len() as u64
            }
            Some(total) => {
                let chunk_size = self.config.chunk_size_for(total);
                debug!("Streaming in chunks of {} bytes", chunk_size);

                let mut progress = ProgressState::new(Some(total));
                let mut buffer: Vec<u8> = Vec::with_capacity(chunk_size);
                let mut stream = response.bytes_stream();

                while let Some(chunk_result) = stream.next().await {
                    let chunk = chunk_result.map_err(|e| DownloadError::HttpRequest {
                        url: url.to_string(),
                        source: e,
                    })?;
                    buffer.extend_from_slice(&chunk);

                    while buffer.len() >= chunk_size {
                        let rest = buffer.split_off(chunk_size);
                        write_chunk(&mut file, dest_path, &buffer).await?;
                        progress.advance(buffer.len() as u64);
                        report_progress(url, &progress, &progress_callback);
                        buffer = rest;
                    }
                }

                if !buffer.is_empty() {
                    write_chunk(&mut file, dest_path, &buffer).await?;
                    progress.advance(buffer.len() as u64);
                    report_progress(url, &progress, &progress_callback);
                }

                progress.transferred
            }
        };

        file.flush()
            .await
            .map_err(|e| DownloadError::file_system(dest_path, FileOperation::Write, e))?;
        file.sync_all()
            .await
            .map_err(|e| DownloadError::file_system(dest_path, FileOperation::Write, e))?;

        if let Some(ref callback) = progress_callback {
            callback(ProgressEvent::DownloadComplete {
                url: url.to_string(),
                final_size: downloaded,
            });
        }

        debug!("Download completed: {} bytes", downloaded);
        Ok(downloaded)
    }
}

async fn write_chunk(file: &mut fs::File, dest_path: &Path, bytes: &[u8]) -> Result<()> {
    file.write_all(bytes)
        .await
        .map_err(|e| DownloadError::file_system(dest_path, FileOperation::Write, e))
}

fn report_progress(url: &str, progress: &ProgressState, progress_callback: &Option<ProgressCallback>) {
    if let Some(callback) = progress_callback {
        callback(ProgressEvent::DownloadProgress {
            url: url.to_string(),
            progress: *progress,
        });
    }
}

#[async_trait]
impl FileDownloader for HttpDownloader {
    async fn download_to_file(
        &self,
        url: &str,
        dest_path: &Path,
        progress_callback: Option<ProgressCallback>,
    ) -> Result<u64> {
        self.download_file(url, dest_path, progress_callback)
            .instrument(info_span!("http_download", url = %url))
            .await
    }

    fn schemes(&self) -> &[&'static str] {
        &["http", "https"]
    }
}
