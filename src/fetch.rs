use crate::error::ScrapeError;
use log::{debug, warn};
use reqwest::{Client, Method, Response, Url};
use std::time::Duration;

/// Retry behaviour for every request issued through [`HttpSession`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            backoff_cap: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff delay for a zero-based attempt index, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base_ms = self.backoff_base.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay_ms.min(self.backoff_cap.as_millis() as u64))
    }
}

/// Cookie-carrying HTTP client shared by every component of a run.
///
/// All portal traffic goes through `get`/`post_form` so the retry policy
/// lives in exactly one place.
pub struct HttpSession {
    client: Client,
    retry: RetryPolicy,
}

impl HttpSession {
    pub fn new(user_agent: &str) -> Result<Self, ScrapeError> {
        // Connect timeout only: report downloads stream for minutes, so a
        // whole-request deadline would cut them off
        let client = Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub async fn get(&self, url: Url) -> Result<Response, ScrapeError> {
        self.execute(Method::GET, url, None).await
    }

    pub async fn post_form(
        &self,
        url: Url,
        form: &[(&str, String)],
    ) -> Result<Response, ScrapeError> {
        self.execute(Method::POST, url, Some(form)).await
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        form: Option<&[(&str, String)]>,
    ) -> Result<Response, ScrapeError> {
        let mut attempt = 0;
        loop {
            debug!("Requesting {} {}", method, url);
            match self.send_once(&method, &url, form).await {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        return Err(err);
                    }
                    let delay = self.retry.delay(attempt - 1);
                    warn!(
                        "{} {} failed (attempt {}/{}), retrying in {:?}: {}",
                        method, url, attempt, self.retry.max_attempts, delay, err
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &Url,
        form: Option<&[(&str, String)]>,
    ) -> Result<Response, ScrapeError> {
        let request = match form {
            Some(fields) => self.client.post(url.clone()).form(fields),
            None => self.client.get(url.clone()),
        };

        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(ScrapeError::Http {
                status: resp.status(),
                url: url.to_string(),
            });
        }
        Ok(resp)
    }
}

/// Resolve `path` against a base URL taken from the configuration.
pub fn join_url(base: &str, path: &str) -> Result<Url, ScrapeError> {
    let base = Url::parse(base).map_err(|e| ScrapeError::Url(format!("{}: {}", base, e)))?;
    base.join(path)
        .map_err(|e| ScrapeError::Url(format!("{}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(2));
        assert_eq!(policy.delay(1), Duration::from_secs(4));
        assert_eq!(policy.delay(2), Duration::from_secs(8));
        // Capped at 10s from the third retry onwards
        assert_eq!(policy.delay(3), Duration::from_secs(10));
        assert_eq!(policy.delay(10), Duration::from_secs(10));
    }

    #[test]
    fn test_default_policy_attempts() {
        assert_eq!(RetryPolicy::default().max_attempts, 3);
    }

    #[test]
    fn test_join_url_absolute_path() {
        let url = join_url(
            "https://portal.example.com/site/login",
            "/site/get-data-report-queue",
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://portal.example.com/site/get-data-report-queue"
        );
    }

    #[test]
    fn test_join_url_invalid_base() {
        assert!(join_url("not a url", "/x").is_err());
    }
}
