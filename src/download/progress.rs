//! Progress reporting for media downloads
//!
//! The downloader only talks to [`ProgressObserver`]; the terminal bar is one
//! implementation of it.

use indicatif::{ProgressBar, ProgressStyle};

/// Receives cumulative byte counts while a download runs
pub trait ProgressObserver: Send + Sync {
    /// Called once the response headers are in, before any bytes are written
    fn start(&self, _total: Option<u64>) {}

    /// Called after every chunk with the bytes written so far
    fn advance(&self, bytes_so_far: u64, total: Option<u64>);

    /// Called after the file has been flushed
    fn finish(&self) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn advance(&self, _bytes_so_far: u64, _total: Option<u64>) {}
}

/// Terminal progress bar. Falls back to a byte counter when the size is unknown.
pub struct TerminalProgress {
    pb: ProgressBar,
}

impl TerminalProgress {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_message(message.to_string());
        Self { pb }
    }
}

impl ProgressObserver for TerminalProgress {
    fn start(&self, total: Option<u64>) {
        match total {
            Some(total) => {
                self.pb.set_length(total);
                self.pb.set_style(bar_style());
            }
            None => self.pb.set_style(counter_style()),
        }
    }

    fn advance(&self, bytes_so_far: u64, _total: Option<u64>) {
        self.pb.set_position(bytes_so_far);
    }

    fn finish(&self) {
        self.pb.finish();
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {bytes_per_sec} ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn counter_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} {bytes} ({bytes_per_sec})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
