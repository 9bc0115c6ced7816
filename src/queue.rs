use crate::config::Config;
use crate::error::ScrapeError;
use crate::fetch::{self, HttpSession};
use crate::parser;
use log::{debug, error, info, warn};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Queue-status endpoint, relative to the login URL's origin.
pub const QUEUE_PATH: &str = "/site/get-data-report-queue";

const COMPLETED_MARKER: &str = "Completed";

/// Wire shape of the queue endpoint: each item is a row of HTML fragments.
#[derive(Debug, Deserialize)]
pub struct QueuePayload {
    #[serde(default)]
    pub data: Vec<Vec<String>>,
}

/// Poll the report queue until a completed job matching `label` shows up,
/// or the configured timeout elapses.
pub async fn poll_queue(
    session: &HttpSession,
    config: &Config,
    label: &str,
) -> Result<Url, ScrapeError> {
    let queue_url = fetch::join_url(&config.urls.login, QUEUE_PATH)?;
    let base = Url::parse(&config.urls.login)
        .map_err(|e| ScrapeError::Url(format!("{}: {}", config.urls.login, e)))?;

    let timeout = Duration::from_secs(config.polling_settings.timeout_seconds);
    let interval = Duration::from_secs(config.polling_settings.interval_seconds);

    poll_with(
        || {
            let url = queue_url.clone();
            async move {
                let body = session.get(url).await?.text().await?;
                let payload: QueuePayload = serde_json::from_str(&body)?;
                Ok(payload)
            }
        },
        base,
        label,
        timeout,
        interval,
    )
    .await
}

/// Driver loop for the poll state machine, generic over the payload source
/// so tests can feed canned queues under a paused clock.
pub(crate) async fn poll_with<F, Fut>(
    mut tick: F,
    base: Url,
    label: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<Url, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<QueuePayload, ScrapeError>>,
{
    let deadline = Instant::now() + timeout;
    let mut state = PollState::new(base, label);

    info!("Polling report queue for a report matching '{}'", label);

    while Instant::now() < deadline {
        match tick().await {
            Ok(payload) => {
                if let Some(url) = state.inspect(&payload) {
                    return Ok(url);
                }
            }
            Err(e) => warn!("Could not poll report queue: {}", e),
        }

        debug!("Report not ready, waiting {:?}", interval);
        tokio::time::sleep(interval).await;
    }

    error!("Timeout reached while waiting for report '{}'", label);
    Err(ScrapeError::PollTimeout(label.to_string()))
}

/// State carried across poll ticks: the target label and the ids of jobs
/// already judged completed-but-non-matching.
struct PollState {
    base: Url,
    label: String,
    processed: HashSet<String>,
}

impl PollState {
    fn new(base: Url, label: &str) -> Self {
        Self {
            base,
            label: label.to_string(),
            processed: HashSet::new(),
        }
    }

    /// Evaluate one payload. First completed item matching the label wins,
    /// in server-returned order; completed non-matches are remembered and
    /// never re-examined, even if they reappear in a later tick.
    fn inspect(&mut self, payload: &QueuePayload) -> Option<Url> {
        for item in &payload.data {
            let Some(entry) = parser::queue_entry(item) else {
                continue;
            };
            if self.processed.contains(&entry.id) {
                continue;
            }

            let completed = entry.text.contains(COMPLETED_MARKER);
            if completed && entry.text.contains(&self.label) {
                match self.base.join(&entry.href) {
                    Ok(url) => {
                        info!(
                            "Found completed report for {} (ID: {}). URL: {}",
                            self.label, entry.id, url
                        );
                        return Some(url);
                    }
                    Err(e) => {
                        warn!(
                            "Completed report {} has an unusable link '{}': {}",
                            entry.id, entry.href, e
                        );
                        continue;
                    }
                }
            }

            if completed {
                self.processed.insert(entry.id);
            }
        }
        None
    }
}
