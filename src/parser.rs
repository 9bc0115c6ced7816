use crate::types::QueueEntry;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashMap;

const DOWNLOAD_HREF_PATTERN: &str = r"/site/download-queue\?id=(\d+)";

/// Content of the `csrf-token` meta tag, if the page has one.
pub fn csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="csrf-token"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
}

/// Render one queue item's HTML fragments and pull out its download link.
///
/// Items without a `/site/download-queue?id=<N>` anchor yield `None`; the
/// joined text is kept for status/label inspection by the poller.
pub fn queue_entry(fragments: &[String]) -> Option<QueueEntry> {
    let text = fragments.join(" ");
    let document = Html::parse_fragment(&text);
    let selector = Selector::parse("a[href]").ok()?;
    let pattern = Regex::new(DOWNLOAD_HREF_PATTERN).ok()?;

    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if let Some(caps) = pattern.captures(href) {
            return Some(QueueEntry {
                id: caps[1].to_string(),
                href: href.to_string(),
                text,
            });
        }
    }
    None
}

/// Selector-driven extraction rules for a list page.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorSpec {
    pub list_selector: String,
    pub fields: HashMap<String, FieldSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub selector: String,
    #[serde(default, rename = "type")]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Html,
}

/// Extract one record per list row, one value per configured field.
/// Rows missing a field simply omit that key.
pub fn parse_list_page(html: &str, spec: &ExtractorSpec) -> Vec<HashMap<String, String>> {
    let document = Html::parse_document(html);
    let Ok(row_selector) = Selector::parse(&spec.list_selector) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for row in document.select(&row_selector) {
        let mut record = HashMap::new();
        for (name, field) in &spec.fields {
            let Ok(field_selector) = Selector::parse(&field.selector) else {
                continue;
            };
            if let Some(el) = row.select(&field_selector).next() {
                let value = match field.kind {
                    FieldKind::Text => el.text().collect::<String>().trim().to_string(),
                    FieldKind::Html => el.inner_html(),
                };
                record.insert(name.clone(), value);
            }
        }
        rows.push(record);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csrf_token_present() {
        let html = r#"
            <html><head>
            <meta name="viewport" content="width=device-width">
            <meta name="csrf-token" content="abc123XYZ">
            </head><body></body></html>
        "#;
        assert_eq!(csrf_token(html), Some("abc123XYZ".to_string()));
    }

    #[test]
    fn test_csrf_token_missing() {
        let html = "<html><head><title>Login</title></head><body></body></html>";
        assert_eq!(csrf_token(html), None);
    }

    #[test]
    fn test_queue_entry_extracts_id() {
        let fragments = vec![
            "<td>Sales Report 2024-01</td>".to_string(),
            "<td>Completed</td>".to_string(),
            r#"<td><a href="/site/download-queue?id=42">Download</a></td>"#.to_string(),
        ];
        let entry = queue_entry(&fragments).unwrap();
        assert_eq!(entry.id, "42");
        assert_eq!(entry.href, "/site/download-queue?id=42");
        assert!(entry.text.contains("Completed"));
        assert!(entry.text.contains("2024-01"));
    }

    #[test]
    fn test_queue_entry_without_download_link() {
        let fragments = vec![
            "<td>Sales Report 2024-01</td>".to_string(),
            "<td>Pending</td>".to_string(),
            r#"<td><a href="/site/cancel-queue?id=42">Cancel</a></td>"#.to_string(),
        ];
        assert!(queue_entry(&fragments).is_none());
    }

    fn company_spec() -> ExtractorSpec {
        let mut fields = HashMap::new();
        fields.insert(
            "company_name".to_string(),
            FieldSpec {
                selector: ".company-name".to_string(),
                kind: FieldKind::Text,
            },
        );
        fields.insert(
            "period".to_string(),
            FieldSpec {
                selector: ".period".to_string(),
                kind: FieldKind::Text,
            },
        );
        fields.insert(
            "sales".to_string(),
            FieldSpec {
                selector: ".sales".to_string(),
                kind: FieldKind::Text,
            },
        );
        ExtractorSpec {
            list_selector: ".company-row".to_string(),
            fields,
        }
    }

    #[test]
    fn test_parse_list_page_basic() {
        let html = r#"
            <html><body>
            <div class="company-row">
              <span class="company-name">ABC Corp</span>
              <span class="period">2024-Q1</span>
              <span class="sales">1,000,000</span>
            </div>
            <div class="company-row">
              <span class="company-name">XYZ Ltd</span>
              <span class="period">2024-Q1</span>
              <span class="sales">500,000</span>
            </div>
            </body></html>
        "#;
        let rows = parse_list_page(html, &company_spec());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["company_name"], "ABC Corp");
        assert_eq!(rows[1]["sales"], "500,000");
    }

    #[test]
    fn test_parse_list_page_missing_field_omitted() {
        let html = r#"
            <div class="company-row">
              <span class="company-name">ABC Corp</span>
            </div>
        "#;
        let rows = parse_list_page(html, &company_spec());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("company_name").unwrap(), "ABC Corp");
        assert!(rows[0].get("sales").is_none());
    }

    #[test]
    fn test_extractor_spec_from_yaml() {
        let yaml = r#"
list_selector: ".company-row"
fields:
  company_name:
    selector: ".company-name"
    type: text
  logo:
    selector: ".logo"
    type: html
"#;
        let spec: ExtractorSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.list_selector, ".company-row");
        assert_eq!(spec.fields["company_name"].kind, FieldKind::Text);
        assert_eq!(spec.fields["logo"].kind, FieldKind::Html);
    }
}
