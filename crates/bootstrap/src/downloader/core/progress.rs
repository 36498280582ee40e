//! Progress tracking and reporting for downloads and extractions
//!
//! Both the downloader and the zip extractor describe their work with the same
//! [`ProgressState`], so a single reporter can render either.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Width of the console progress bar, in cells
pub const BAR_WIDTH: usize = 50;

/// Progress callback for download and extraction operations
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Transient progress of one transfer or extraction.
///
/// Created fresh for every call and updated per chunk or entry.
#[derive(Debug, Clone, Copy)]
pub struct ProgressState {
    /// Bytes handled so far
    pub transferred: u64,
    /// Expected bytes, when known up front
    pub total: Option<u64>,
    pub started: Instant,
}

impl ProgressState {
    pub fn new(total: Option<u64>) -> Self {
        Self {
            transferred: 0,
            total,
            started: Instant::now(),
        }
    }

    pub fn advance(&mut self, bytes: u64) {
        self.transferred = self.transferred.saturating_add(bytes);
    }

    /// Completed share in `0.0..=1.0`, or `None` when the total is unknown.
    ///
    /// A zero total counts as complete.
    pub fn fraction(&self) -> Option<f64> {
        let total = self.total?;
        if total == 0 {
            return Some(1.0);
        }
        Some((self.transferred as f64 / total as f64).min(1.0))
    }

    pub fn percentage(&self) -> Option<f64> {
        self.fraction().map(|fraction| fraction * 100.0)
    }

    /// Number of filled cells in a bar of `width` cells
    pub fn filled_cells(&self, width: usize) -> usize {
        let fraction = self.fraction().unwrap_or(0.0);
        ((width as f64 * fraction) as usize).min(width)
    }

    /// Average throughput since `started`, in KB/s
    pub fn average_kbps(&self) -> f64 {
        self.average_kbps_over(self.started.elapsed())
    }

    /// Average throughput over `elapsed`, in KB/s. Zero elapsed time reports zero speed.
    pub fn average_kbps_over(&self, elapsed: Duration) -> f64 {
        let seconds = elapsed.as_secs_f64();
        if seconds <= 0.0 {
            return 0.0;
        }
        (self.transferred as f64 / 1024.0) / seconds
    }
}

/// Format a KB/s figure, switching to MB/s above 1024 KB/s
pub fn format_speed(kbps: f64) -> String {
    if kbps > 1024.0 {
        format!("{:.2} MB/s", kbps / 1024.0)
    } else {
        format!("{:.2} KB/s", kbps)
    }
}

/// Render one bar line, e.g. `[█████.....] 50.00% (1.20 MB/s)`
pub fn render_bar(state: &ProgressState, width: usize, kbps: f64) -> String {
    let done = state.filled_cells(width);
    format!(
        "[{}{}] {:.2}% ({})",
        "█".repeat(done),
        ".".repeat(width - done),
        state.percentage().unwrap_or(0.0),
        format_speed(kbps)
    )
}

/// Events emitted during download and extraction operations
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    DownloadStarted {
        url: String,
        total_size: Option<u64>,
    },
    DownloadProgress {
        url: String,
        progress: ProgressState,
    },
    DownloadComplete {
        url: String,
        final_size: u64,
    },
    /// One mirror failed and the next one will be tried
    MirrorFailed {
        url: String,
        error: String,
    },
    ExtractionStarted {
        archive: String,
        total_size: u64,
    },
    ExtractionProgress {
        archive: String,
        progress: ProgressState,
    },
    ExtractionComplete {
        archive: String,
        extracted: u64,
    },
}

/// Trait for progress reporting with more granular control
pub trait ProgressReporter: Send + Sync {
    fn on_download_started(&self, _url: &str, _total_size: Option<u64>) {}
    fn on_download_progress(&self, _url: &str, _progress: &ProgressState) {}
    fn on_download_complete(&self, _url: &str, _final_size: u64) {}
    fn on_mirror_failed(&self, _url: &str, _error: &str) {}
    fn on_extraction_started(&self, _archive: &str, _total_size: u64) {}
    fn on_extraction_progress(&self, _archive: &str, _progress: &ProgressState) {}
    fn on_extraction_complete(&self, _archive: &str, _extracted: u64) {}
}

/// Extension trait to convert ProgressReporter to ProgressCallback
pub trait IntoProgressCallback {
    fn into_callback(self) -> ProgressCallback;
}

impl<T: ProgressReporter + 'static> IntoProgressCallback for T {
    fn into_callback(self) -> ProgressCallback {
        Arc::new(move |event| match event {
            ProgressEvent::DownloadStarted { url, total_size } => {
                self.on_download_started(&url, total_size);
            }
            ProgressEvent::DownloadProgress { url, progress } => {
                self.on_download_progress(&url, &progress);
            }
            ProgressEvent::DownloadComplete { url, final_size } => {
                self.on_download_complete(&url, final_size);
            }
            ProgressEvent::MirrorFailed { url, error } => {
                self.on_mirror_failed(&url, &error);
            }
            ProgressEvent::ExtractionStarted { archive, total_size } => {
                self.on_extraction_started(&archive, total_size);
            }
            ProgressEvent::ExtractionProgress { archive, progress } => {
                self.on_extraction_progress(&archive, &progress);
            }
            ProgressEvent::ExtractionComplete { archive, extracted } => {
                self.on_extraction_complete(&archive, extracted);
            }
        })
    }
}

/// Console reporter that redraws a single fixed-width bar on stdout
#[derive(Debug, Default)]
pub struct ConsoleProgressReporter {
    line_open: AtomicBool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn redraw(&self, progress: &ProgressState) {
        let line = render_bar(progress, BAR_WIDTH, progress.average_kbps());
        let mut stdout = io::stdout().lock();
        // Trailing spaces wipe leftovers from a longer previous line.
        let _ = write!(stdout, "\r{}     ", line);
        let _ = stdout.flush();
        self.line_open.store(true, Ordering::Relaxed);
    }

    fn finish_line(&self) {
        if self.line_open.swap(false, Ordering::Relaxed) {
            println!();
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_download_started(&self, url: &str, _total_size: Option<u64>) {
        println!("Downloading {}", url);
    }

    fn on_download_progress(&self, _url: &str, progress: &ProgressState) {
        self.redraw(progress);
    }

    fn on_download_complete(&self, _url: &str, _final_size: u64) {
        self.finish_line();
    }

    fn on_mirror_failed(&self, _url: &str, _error: &str) {
        self.finish_line();
    }

    fn on_extraction_started(&self, archive: &str, _total_size: u64) {
        println!("Extracting {}", archive);
    }

    fn on_extraction_progress(&self, _archive: &str, progress: &ProgressState) {
        self.redraw(progress);
    }

    fn on_extraction_complete(&self, _archive: &str, _extracted: u64) {
        self.finish_line();
    }
}

/// Null progress reporter that does nothing
#[derive(Debug, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_reports_complete() {
        let state = ProgressState::new(Some(0));
        assert_eq!(state.percentage(), Some(100.0));
        assert_eq!(state.filled_cells(BAR_WIDTH), BAR_WIDTH);
    }

    #[test]
    fn unknown_total_has_no_percentage() {
        let mut state = ProgressState::new(None);
        state.advance(10);
        assert_eq!(state.percentage(), None);
        assert_eq!(state.filled_cells(BAR_WIDTH), 0);
    }

    #[test]
    fn overshoot_is_clamped() {
        let mut state = ProgressState::new(Some(10));
        state.advance(15);
        assert_eq!(state.percentage(), Some(100.0));
        assert_eq!(state.filled_cells(BAR_WIDTH), BAR_WIDTH);
    }

    #[test]
    fn advance_saturates_instead_of_wrapping() {
        let mut state = ProgressState::new(Some(u64::MAX));
        state.advance(u64::MAX - 1);
        state.advance(10);
        assert_eq!(state.transferred, u64::MAX);
        assert_eq!(state.percentage(), Some(100.0));
    }

    #[test]
    fn zero_elapsed_reports_zero_speed() {
        let mut state = ProgressState::new(Some(2048));
        state.advance(2048);
        assert_eq!(state.average_kbps_over(Duration::ZERO), 0.0);
        assert_eq!(state.average_kbps_over(Duration::from_secs(2)), 1.0);
    }

    #[test]
    fn speed_switches_to_megabytes_above_1024_kb() {
        assert_eq!(format_speed(1024.0), "1024.00 KB/s");
        assert_eq!(format_speed(2048.0), "2.00 MB/s");
        assert_eq!(format_speed(0.0), "0.00 KB/s");
    }

    #[test]
    fn bar_has_fixed_width() {
        let mut state = ProgressState::new(Some(1000));
        state.advance(500);
        let line = render_bar(&state, BAR_WIDTH, 512.0);
        assert_eq!(
            line,
            format!("[{}{}] 50.00% (512.00 KB/s)", "█".repeat(25), ".".repeat(25))
        );
    }

    #[test]
    fn reporter_callback_forwards_events() {
        use std::sync::Mutex;

        #[derive(Default)]
        struct Recorder(Arc<Mutex<Vec<String>>>);

        impl ProgressReporter for Recorder {
            fn on_mirror_failed(&self, url: &str, error: &str) {
                self.0.lock().unwrap().push(format!("{url}: {error}"));
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let callback = Recorder(seen.clone()).into_callback();
        callback(ProgressEvent::MirrorFailed {
            url: "https://a".to_string(),
            error: "boom".to_string(),
        });
        callback(ProgressEvent::DownloadComplete {
            url: "https://a".to_string(),
            final_size: 1,
        });

        assert_eq!(*seen.lock().unwrap(), vec!["https://a: boom".to_string()]);
    }
}
