//! Configuration types for the downloader system

/// Browser-like user agent sent with every request.
///
/// Some SDK mirrors refuse requests from generic HTTP clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh Intel Mac Os X 10_15_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.97 Safari/537.36";

/// Configuration for download operations
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub user_agent: String,
    /// Lower bound for a streamed chunk, in bytes
    pub min_chunk_size: usize,
    /// The payload is split into roughly this many chunks
    pub chunks_per_download: u64,
}

impl DownloadConfig {
    /// Chunk size for a download of `total` bytes: `total / chunks_per_download`,
    /// never smaller than `min_chunk_size`.
    pub fn chunk_size_for(&self, total: u64) -> usize {
        let divisor = self.chunks_per_download.max(1);
        let proportional = usize::try_from(total / divisor).unwrap_or(usize::MAX);
        proportional.max(self.min_chunk_size)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_chunk_size: 1024 * 1024, // 1 MiB
            chunks_per_download: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_downloads_use_minimum_chunk() {
        let config = DownloadConfig::default();
        assert_eq!(config.chunk_size_for(0), 1024 * 1024);
        assert_eq!(config.chunk_size_for(50_000_000), 1024 * 1024);
    }

    #[test]
    fn large_downloads_scale_chunk_with_total() {
        let config = DownloadConfig::default();
        assert_eq!(config.chunk_size_for(4_000_000_000), 4_000_000);
    }

    #[test]
    fn zero_divisor_is_treated_as_one() {
        let config = DownloadConfig {
            chunks_per_download: 0,
            min_chunk_size: 1,
            ..Default::default()
        };
        assert_eq!(config.chunk_size_for(10), 10);
    }
}
