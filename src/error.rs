use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error: {status} for URL: {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("No CSRF token found on {0} page")]
    MissingCsrfToken(&'static str),

    #[error("Login rejected for user '{0}'")]
    LoginRejected(String),

    #[error("Timed out waiting for report '{0}'")]
    PollTimeout(String),

    #[error("Queue decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid URL: {0}")]
    Url(String),
}
