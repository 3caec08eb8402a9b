use std::sync::LazyLock;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Client;

use super::{non_empty, rank_hits, transport, RawHit, SearchBackend};
use crate::domain::host_of;
use crate::error::{FailureReason, SearchError};
use crate::html::{clean_text, decode_entities};
use crate::types::{BackendKind, SearchResult};

/// Desktop browser identity; the results page is served differently (or not
/// at all) to obvious bots.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*"([^"]+)"[^>]*>(.*?)</a>"#)
        .expect("valid anchor regex")
});
static H3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h3\b[^>]*>(.*?)</h3>").expect("valid h3 regex"));

/// Last-resort tier: fetches the public results page and parses organic
/// result links out of the HTML. Fragile by nature; any layout change shows
/// up here as [`FailureReason::Empty`].
pub struct ScrapeBackend {
    client: Client,
    base_url: String,
    lang: String,
}

impl ScrapeBackend {
    #[must_use]
    pub fn new(client: Client, base_url: &str, lang: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: lang.to_string(),
        }
    }
}

#[async_trait]
impl SearchBackend for ScrapeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Scrape
    }

    async fn search(
        &self,
        phrase: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let kind = self.kind();
        let num = max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("q", phrase),
                ("hl", self.lang.as_str()),
                ("num", num.as_str()),
                ("gl", "us"),
            ])
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .header(
                reqwest::header::ACCEPT_LANGUAGE,
                format!("{}-US,{};q=0.9", self.lang, self.lang),
            )
            .send()
            .await
            .map_err(|e| transport(kind, &e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SearchError::unavailable(
                kind,
                FailureReason::from_status(status.as_u16()),
            ));
        }

        let html = response.text().await.map_err(|e| transport(kind, &e))?;
        let own_host = host_of(&self.base_url);
        let hits = parse_results(&html, own_host.as_deref());
        non_empty(rank_hits(hits, max_results, kind), kind)
    }
}

/// Extracts `(url, title, "")` for each organic result, in page order.
///
/// Anchors wrapping an `<h3>` are the organic results; if the page has none
/// of those, every external anchor is taken instead.
pub(crate) fn parse_results(html: &str, own_host: Option<&str>) -> Vec<RawHit> {
    let mut with_heading = Vec::new();
    let mut without_heading = Vec::new();

    for cap in ANCHOR_RE.captures_iter(html) {
        let href = cap.get(1).map_or("", |m| m.as_str());
        let inner = cap.get(2).map_or("", |m| m.as_str());
        let Some(url) = unwrap_result_href(href) else {
            continue;
        };
        let Some(host) = host_of(&url) else {
            continue;
        };
        if is_search_engine_host(&host) || own_host.is_some_and(|own| own == host) {
            continue;
        }
        match H3_RE.captures(inner).and_then(|h| h.get(1)) {
            Some(h3) => with_heading.push((url, clean_text(h3.as_str()), String::new())),
            None => without_heading.push((url, clean_text(inner), String::new())),
        }
    }

    if with_heading.is_empty() {
        without_heading
    } else {
        with_heading
    }
}

/// Turns `/url?q=<target>&sa=..` redirects into the target URL and passes
/// absolute http(s) links through. Anything else is not a result link.
fn unwrap_result_href(href: &str) -> Option<String> {
    let href = decode_entities(href);
    if let Some(rest) = href.strip_prefix("/url?") {
        let target = rest
            .split('&')
            .find_map(|pair| pair.strip_prefix("q=").or_else(|| pair.strip_prefix("url=")))?;
        let decoded = percent_decode_str(target).decode_utf8_lossy().into_owned();
        return is_http(&decoded).then_some(decoded);
    }
    is_http(&href).then_some(href)
}

fn is_http(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn is_search_engine_host(host: &str) -> bool {
    host.contains("google.") || host.ends_with("googleusercontent.com")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_redirect_links_and_decodes() {
        assert_eq!(
            unwrap_result_href("/url?q=https://a.example/path%3Fx%3D1&amp;sa=U&amp;ved=abc")
                .as_deref(),
            Some("https://a.example/path?x=1")
        );
        assert_eq!(
            unwrap_result_href("https://b.example/").as_deref(),
            Some("https://b.example/")
        );
        assert!(unwrap_result_href("/search?q=more").is_none());
        assert!(unwrap_result_href("#").is_none());
    }

    #[test]
    fn parses_heading_anchors_and_skips_engine_links() {
        let html = r#"
            <a href="https://www.google.com/preferences">Settings</a>
            <div class="g"><a href="/url?q=https://one.example/&amp;sa=U"><h3 class="x">First <b>result</b></h3></a></div>
            <div class="g"><a href="https://two.example/page"><h3>Second</h3></a></div>
            <a href="https://maps.google.com/x"><h3>Maps</h3></a>
            <a href="https://footer.example/">Footer</a>
        "#;
        let hits = parse_results(html, None);
        assert_eq!(
            hits,
            vec![
                (
                    "https://one.example/".to_string(),
                    "First result".to_string(),
                    String::new()
                ),
                (
                    "https://two.example/page".to_string(),
                    "Second".to_string(),
                    String::new()
                ),
            ]
        );
    }

    #[test]
    fn falls_back_to_plain_anchors_without_headings() {
        let html = r#"<a href="https://one.example/">One</a><a href="/url?q=https://two.example/">Two</a>"#;
        let urls: Vec<String> = parse_results(html, None)
            .into_iter()
            .map(|(url, _, _)| url)
            .collect();
        assert_eq!(urls, vec!["https://one.example/", "https://two.example/"]);
    }

    #[test]
    fn own_host_links_are_skipped() {
        let html = r#"<a href="http://127.0.0.1:9999/next"><h3>Next</h3></a><a href="https://x.example"><h3>X</h3></a>"#;
        let hits = parse_results(html, Some("127.0.0.1"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "https://x.example");
    }
}
