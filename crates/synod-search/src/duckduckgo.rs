//! DuckDuckGo HTML search provider (no API key required)
//!
//! Scrapes the `html.duckduckgo.com` endpoint. Uses POST because GET with
//! non-ASCII queries triggers a CAPTCHA page.

use crate::error::{Error, Result};
use crate::provider::{SearchHit, SearchProvider};
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of search results to return
const MAX_RESULTS: usize = 10;

/// Search endpoint
const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";

/// DuckDuckGo region code
const DEFAULT_REGION: &str = "us-en";

/// HTTP timeout for the search request
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// User-Agent header to avoid bot blocking
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// DuckDuckGo wraps each result in <div class="result ...">
// Title:   <a class="result__a" href="...">TITLE</a>
// Snippet: <a class="result__snippet">SNIPPET</a>
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]+class="result__a"[^>]+href="([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("title regex is a compile-time constant")
});
static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]+class="result__snippet"[^>]*>(.*?)</a>"#)
        .expect("snippet regex is a compile-time constant")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex is a compile-time constant"));

/// DuckDuckGo HTML-based search provider.
pub struct DuckDuckGoProvider {
    client: Client,
    region: String,
}

impl DuckDuckGoProvider {
    /// Create a new DuckDuckGo provider
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            region: DEFAULT_REGION.to_string(),
        })
    }

    /// Set the region code (e.g. "us-en", "kr-kr")
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".to_string()));
        }

        let form_data = format!(
            "q={}&kl={}",
            urlencoding::encode(query),
            urlencoding::encode(&self.region),
        );

        debug!(query = %query, region = %self.region, "Fetching DuckDuckGo search results");

        let response = self
            .client
            .post(SEARCH_URL)
            .header("User-Agent", USER_AGENT)
            .header("Referer", "https://html.duckduckgo.com/")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(form_data)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let html = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        debug!(status = %status, html_len = html.len(), "DuckDuckGo response received");

        if html.contains("anomaly-modal") {
            warn!("DuckDuckGo returned CAPTCHA page, bot detection triggered");
            return Err(Error::Blocked(
                "DuckDuckGo CAPTCHA triggered; search temporarily blocked".to_string(),
            ));
        }

        if !status.is_success() {
            return Err(Error::Network(format!("search returned HTTP {status}")));
        }

        Ok(parse_search_results(&html, MAX_RESULTS))
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Parse search results from DuckDuckGo HTML.
fn parse_search_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let titles: Vec<(String, String)> = TITLE_RE
        .captures_iter(html)
        .map(|cap| {
            let raw_url = cap.get(1).map_or("", |m| m.as_str());
            let url = extract_real_url(raw_url);
            let title = strip_html_tags(cap.get(2).map_or("", |m| m.as_str()));
            (url, title)
        })
        .collect();

    let snippets: Vec<String> = SNIPPET_RE
        .captures_iter(html)
        .map(|cap| strip_html_tags(cap.get(1).map_or("", |m| m.as_str())))
        .collect();

    titles
        .into_iter()
        .enumerate()
        .take(max_results)
        .map(|(i, (url, title))| {
            let snippet = snippets.get(i).cloned().unwrap_or_default();
            let date = parse_snippet_date(&snippet);
            SearchHit {
                title,
                url,
                date,
                snippet,
            }
        })
        .filter(|hit| !hit.url.is_empty() && !hit.title.is_empty())
        .collect()
}

/// DuckDuckGo wraps URLs in a redirect: `//duckduckgo.com/l/?uddg=REAL_URL&...`
/// Extract the actual destination URL.
fn extract_real_url(raw: &str) -> String {
    if let Some(pos) = raw.find("uddg=") {
        let rest = &raw[pos + 5..];
        let end = rest.find('&').unwrap_or(rest.len());
        urlencoding::decode(&rest[..end])
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| rest[..end].to_string())
    } else {
        raw.to_string()
    }
}

/// Remove HTML tags and decode common HTML entities.
fn strip_html_tags(s: &str) -> String {
    let stripped = TAG_RE.replace_all(s, "");
    stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}

/// Parse the date prefix DuckDuckGo places on dated snippets
/// (e.g. `"Jan 5, 2026 — The release notes ..."`).
fn parse_snippet_date(snippet: &str) -> Option<NaiveDate> {
    let prefix_end = snippet
        .char_indices()
        .find(|(_, c)| matches!(c, '—' | '·' | '-'))
        .map(|(i, _)| i)?;
    let prefix = snippet[..prefix_end].trim();

    NaiveDate::parse_from_str(prefix, "%b %d, %Y").ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<b>hello</b> world"), "hello world");
        assert_eq!(strip_html_tags("a &amp; b"), "a & b");
        assert_eq!(strip_html_tags("no tags"), "no tags");
    }

    #[test]
    fn test_extract_real_url() {
        let raw = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=abc";
        assert_eq!(extract_real_url(raw), "https://example.com");

        // Direct URL (no redirect)
        assert_eq!(
            extract_real_url("https://example.com"),
            "https://example.com"
        );
    }

    #[test]
    fn test_parse_empty_html() {
        assert!(parse_search_results("", 5).is_empty());
    }

    #[test]
    fn test_parse_sample_html() {
        let html = r#"
            <div class="result">
                <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com">Example Title</a>
                <a class="result__snippet">Jan 5, 2026 — This is a snippet about example.</a>
            </div>
        "#;
        let results = parse_search_results(html, 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Example Title");
        assert_eq!(results[0].url, "https://example.com");
        assert_eq!(
            results[0].date,
            Some(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
        );
        assert!(results[0].snippet.contains("snippet about example"));
    }

    #[test]
    fn test_parse_snippet_date() {
        assert_eq!(
            parse_snippet_date("Mar 12, 2025 — CVE roundup for the quarter"),
            Some(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap())
        );
        assert_eq!(
            parse_snippet_date("Dec 1, 2024 · release notes"),
            Some(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap())
        );
        assert_eq!(parse_snippet_date("An undated snippet about nothing"), None);
        assert_eq!(parse_snippet_date(""), None);
    }

    #[test]
    fn test_max_results_cap() {
        let one_result = r#"
            <a class="result__a" href="https://example.com/a">A</a>
            <a class="result__snippet">s</a>
        "#;
        let html = one_result.repeat(20).replace("example.com/a", "example.com");
        let results = parse_search_results(&html, 10);
        assert!(results.len() <= 10);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let provider = DuckDuckGoProvider::new().unwrap();
        let result = provider.search("  ").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
