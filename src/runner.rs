use crate::auth;
use crate::config::Config;
use crate::dates::{monthly_ranges, DateRange};
use crate::downloader;
use crate::error::ScrapeError;
use crate::fetch::HttpSession;
use crate::queue;
use crate::report;
use crate::types::{RangeReport, RangeStatus, RunSummary};
use chrono::NaiveDate;
use log::{error, info};
use std::path::Path;
use std::time::{Duration, Instant};

/// Drive the whole scrape: one session, one login, then every monthly
/// range in sequence. A failed range is recorded and the run moves on;
/// only login failure aborts.
pub async fn run(config: &Config) -> Result<RunSummary, ScrapeError> {
    let start = parse_date(&config.scraping_parameters.start_date, "start_date")?;
    let end = parse_date(&config.scraping_parameters.end_date, "end_date")?;

    let session = HttpSession::new(&config.user_agent)?;
    auth::login(&session, config).await?;

    let pacing = Duration::from_secs_f64(config.rate_limit_seconds);
    let run_started = Instant::now();
    let mut reports = Vec::new();

    for range in monthly_ranges(start, end) {
        reports.push(process_range(&session, config, &range).await);
        info!("Waiting for {:?} before next request...", pacing);
        tokio::time::sleep(pacing).await;
    }

    let summary = summarize(reports, run_started.elapsed());
    if let Err(e) = write_stats_csv(&summary, Path::new(&config.output.directory)) {
        error!("Failed to write stats CSV: {}", e);
    }

    info!("Scraping process finished");
    Ok(summary)
}

async fn process_range(
    session: &HttpSession,
    config: &Config,
    range: &DateRange,
) -> RangeReport {
    let started = Instant::now();

    if let Err(e) = report::request_generation(session, config, range).await {
        error!(
            "Failed to request report generation for {}: {}",
            range.label, e
        );
        return failed(range, RangeStatus::GenerationFailed, started, e);
    }

    let url = match queue::poll_queue(session, config, &range.label).await {
        Ok(url) => url,
        Err(e) => {
            error!(
                "Could not retrieve download URL for report {}. Skipping.",
                range.label
            );
            return failed(range, RangeStatus::PollTimedOut, started, e);
        }
    };

    match downloader::download(session, url, Path::new(&config.output.directory)).await {
        Ok(done) => RangeReport {
            label: range.label.clone(),
            status: RangeStatus::Downloaded,
            bytes_downloaded: done.bytes,
            duration: started.elapsed(),
            output_path: Some(done.path),
            error: None,
        },
        Err(e) => {
            error!("Failed to download report for {}: {}", range.label, e);
            failed(range, RangeStatus::DownloadFailed, started, e)
        }
    }
}

fn failed(
    range: &DateRange,
    status: RangeStatus,
    started: Instant,
    err: ScrapeError,
) -> RangeReport {
    RangeReport {
        label: range.label.clone(),
        status,
        bytes_downloaded: 0,
        duration: started.elapsed(),
        output_path: None,
        error: Some(err.to_string()),
    }
}

fn summarize(reports: Vec<RangeReport>, total_duration: Duration) -> RunSummary {
    let total_ranges = reports.len();
    let downloaded = reports
        .iter()
        .filter(|r| r.status == RangeStatus::Downloaded)
        .count();
    let total_bytes = reports.iter().map(|r| r.bytes_downloaded).sum();

    RunSummary {
        total_ranges,
        downloaded,
        failed: total_ranges - downloaded,
        total_bytes,
        total_duration,
        reports,
    }
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, ScrapeError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        ScrapeError::Config(format!("invalid {} '{}': {}", field, value, e))
    })
}

fn write_stats_csv(summary: &RunSummary, output_dir: &Path) -> Result<(), ScrapeError> {
    std::fs::create_dir_all(output_dir)?;

    let stats_path = output_dir.join("run_stats.csv");
    let mut wtr = csv::WriterBuilder::new().from_path(stats_path)?;

    wtr.write_record(["Label", "Status", "Size (MB)", "Duration (s)", "File", "Error"])?;

    for report in &summary.reports {
        let filename = report
            .output_path
            .as_deref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("");
        wtr.write_record([
            report.label.clone(),
            report.status.as_str().to_string(),
            format!("{:.2}", report.bytes_downloaded as f64 / 1_048_576.0),
            format!("{:.2}", report.duration.as_secs_f64()),
            filename.to_string(),
            report.error.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
