use crate::config::Config;
use crate::error::ScrapeError;
use crate::fetch::HttpSession;
use crate::parser;
use log::{error, info};
use reqwest::Url;

/// CSRF form field expected by the portal backend.
pub const CSRF_FIELD: &str = "_csrf-esb-fnb-backend";

const LOGIN_PATH_MARKER: &str = "site/login";
const LOGIN_FORM_MARKER: &str = "login-form";

/// The portal answers rejected credentials with HTTP 200, so failure is
/// detected from content: still on the login URL, or the login form is
/// still present in the body.
pub(crate) fn rejected(final_url: &str, body: &str) -> bool {
    final_url.contains(LOGIN_PATH_MARKER) || body.contains(LOGIN_FORM_MARKER)
}

pub async fn login(session: &HttpSession, config: &Config) -> Result<(), ScrapeError> {
    let login_url = Url::parse(&config.urls.login)
        .map_err(|e| ScrapeError::Url(format!("{}: {}", config.urls.login, e)))?;

    info!("Fetching login page at {}", login_url);
    let page = session.get(login_url.clone()).await?.text().await?;

    let token = parser::csrf_token(&page).ok_or(ScrapeError::MissingCsrfToken("login"))?;
    let preview: String = token.chars().take(10).collect();
    info!("Found CSRF token: {}...", preview);

    let form = [
        (CSRF_FIELD, token),
        ("LoginForm[username]", config.credentials.username.clone()),
        ("LoginForm[password]", config.credentials.password.clone()),
    ];

    info!("Attempting login for user '{}'", config.credentials.username);
    let resp = session.post_form(login_url, &form).await?;

    let final_url = resp.url().to_string();
    let body = resp.text().await?;
    if rejected(&final_url, &body) {
        error!("Login failed: redirected back to login page or form is still present");
        return Err(ScrapeError::LoginRejected(
            config.credentials.username.clone(),
        ));
    }

    info!("Login successful");
    Ok(())
}
