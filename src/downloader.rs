use crate::error::ScrapeError;
use crate::fetch::HttpSession;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Url;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[derive(Debug)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Filename preference: `content-disposition` header first, then the URL's
/// trailing `=`-suffix with the spreadsheet extension appended.
pub(crate) fn resolve_filename(content_disposition: Option<&str>, url: &Url) -> String {
    if let Some(header) = content_disposition {
        if let Ok(pattern) = Regex::new(r#"filename="(.+?)""#) {
            if let Some(caps) = pattern.captures(header) {
                return caps[1].to_string();
            }
        }
    }
    let tail = url.as_str().rsplit('=').next().unwrap_or("report");
    format!("{}.xlsx", tail)
}

/// Stream a ready report to `output_dir`, creating the directory if needed.
///
/// Failures part-way leave the partial file in place for inspection.
pub async fn download(
    session: &HttpSession,
    url: Url,
    output_dir: &Path,
) -> Result<Downloaded, ScrapeError> {
    tokio::fs::create_dir_all(output_dir).await?;

    info!("Starting download: {}", url);
    let resp = session.get(url.clone()).await?;

    let disposition = resp
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let filename = resolve_filename(disposition.as_deref(), &url);
    let output_path = output_dir.join(&filename);

    // Length header is advisory: without it the bar degrades to a spinner
    // but the write path is unchanged
    let pb = match resp.content_length() {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
                .unwrap()
                .progress_chars("#>-"));
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg} {bytes} ({bytes_per_sec})")
                    .unwrap(),
            );
            pb
        }
    };
    pb.set_message(filename.clone());

    let mut file = File::create(&output_path).await?;
    let mut stream = resp.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush().await?;
    pb.finish();
    info!(
        "Successfully downloaded and saved report to {}",
        output_path.display()
    );

    Ok(Downloaded {
        path: output_path,
        bytes: downloaded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_filename_from_content_disposition() {
        let name = resolve_filename(
            Some(r#"attachment; filename="sales_2024-01.xlsx""#),
            &url("https://portal.example.com/site/download-queue?id=42"),
        );
        assert_eq!(name, "sales_2024-01.xlsx");
    }

    #[test]
    fn test_filename_falls_back_to_url_suffix() {
        let name = resolve_filename(
            None,
            &url("https://portal.example.com/site/download-queue?id=42"),
        );
        assert_eq!(name, "42.xlsx");
    }

    #[test]
    fn test_filename_fallback_ignores_malformed_header() {
        let name = resolve_filename(
            Some("attachment"),
            &url("https://portal.example.com/site/download-queue?id=7"),
        );
        assert_eq!(name, "7.xlsx");
    }
}
