use crate::auth::CSRF_FIELD;
use crate::config::Config;
use crate::dates::DateRange;
use crate::error::ScrapeError;
use crate::fetch::HttpSession;
use crate::parser;
use log::info;
use reqwest::Url;

/// Trigger server-side generation of the report covering `range`.
///
/// Generation is asynchronous: an accepted POST is all the confirmation
/// the portal offers, completion shows up in the queue later.
pub async fn request_generation(
    session: &HttpSession,
    config: &Config,
    range: &DateRange,
) -> Result<(), ScrapeError> {
    let report_url = Url::parse(&config.urls.report)
        .map_err(|e| ScrapeError::Url(format!("{}: {}", config.urls.report, e)))?;

    info!("Fetching report page for CSRF token for {}", range.label);
    let page = session.get(report_url.clone()).await?.text().await?;
    let token = parser::csrf_token(&page).ok_or(ScrapeError::MissingCsrfToken("report"))?;

    let form = [
        (CSRF_FIELD, token),
        ("SalesReport[reportDate]", range.report_date()),
        ("SalesReport[dateFrom]", range.start_field()),
        ("SalesReport[dateTo]", range.end_field()),
        ("SalesReport[companyID][]", String::new()),
        ("SalesReport[branchID][]", String::new()),
        // Empty company/branch filters mean "all"; full-export flag set
        ("export-full-xls", "1".to_string()),
    ];

    info!("Requesting report generation for {}...", range.label);
    session.post_form(report_url, &form).await?;
    info!("Report generation request sent successfully");
    Ok(())
}
