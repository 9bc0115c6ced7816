use std::path::PathBuf;
use std::time::Duration;

/// One row of the server-side report queue.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// Queue id from the download link, stable across polls
    pub id: String,
    /// Relative download link as served
    pub href: String,
    /// Joined HTML fragments, inspected for status and label
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStatus {
    Downloaded,
    GenerationFailed,
    PollTimedOut,
    DownloadFailed,
}

impl RangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeStatus::Downloaded => "Downloaded",
            RangeStatus::GenerationFailed => "GenerationFailed",
            RangeStatus::PollTimedOut => "PollTimedOut",
            RangeStatus::DownloadFailed => "DownloadFailed",
        }
    }
}

#[derive(Debug)]
pub struct RangeReport {
    pub label: String,
    pub status: RangeStatus,
    pub bytes_downloaded: u64,
    pub duration: Duration,
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub total_ranges: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub total_bytes: u64,
    pub total_duration: Duration,
    pub reports: Vec<RangeReport>,
}
