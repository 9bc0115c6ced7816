mod auth;
mod cli;
mod config;
mod dates;
mod downloader;
mod error;
mod fetch;
mod parser;
mod queue;
mod report;
mod runner;
mod types;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use colored::*;
use log::{error, info};
use types::RangeStatus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("Starting ESB sales report downloader");

    let cli = Cli::parse();
    info!("CLI arguments parsed: config={}", cli.config.display());

    let config = config::Config::load(&cli.config)
        .with_context(|| format!("cannot load configuration from {}", cli.config.display()))?;

    match runner::run(&config).await {
        Ok(summary) => {
            println!("\n{}", "Run Summary:".bold());
            println!("Date ranges processed: {}", summary.total_ranges);
            println!(
                "Reports downloaded: {}",
                summary.downloaded.to_string().green()
            );
            if summary.failed > 0 {
                println!("Failed ranges: {}", summary.failed.to_string().red());
            }
            println!(
                "Total data transferred: {:.2} MB",
                summary.total_bytes as f64 / 1_048_576.0
            );
            println!("Total duration: {:.2?}", summary.total_duration);

            for report in &summary.reports {
                match report.status {
                    RangeStatus::Downloaded => {
                        let filename = report
                            .output_path
                            .as_deref()
                            .and_then(|p| p.file_name())
                            .and_then(|n| n.to_str())
                            .unwrap_or("unknown");
                        println!(
                            "✓ {} -> {} ({:.2} MB in {:.2?})",
                            report.label.green(),
                            filename,
                            report.bytes_downloaded as f64 / 1_048_576.0,
                            report.duration
                        );
                    }
                    _ => {
                        println!(
                            "✗ {} - {}: {}",
                            report.label.red(),
                            report.status.as_str(),
                            report.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
            }

            if summary.failed > 0 {
                error!("{} date ranges failed", summary.failed);
                Err(anyhow::anyhow!("some date ranges failed"))
            } else {
                println!("\n{}", "All reports downloaded successfully".green());
                Ok(())
            }
        }
        Err(e) => {
            error!("Stopping scraper: {}", e);
            eprintln!("{}", "Run aborted".red());
            Err(e.into())
        }
    }
}
