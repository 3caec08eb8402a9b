//! Regex-based extraction of SEO-relevant facts from raw HTML.
//!
//! No DOM is built: pages come from arbitrary third parties and only a
//! handful of head tags plus the visible text are needed. Every helper is
//! tolerant of malformed markup and returns `None`/empty instead of failing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("valid title regex"));
static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid meta regex"));
static LINK_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("valid link regex"));
static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid img regex"));
static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<html\b[^>]*>").expect("valid html regex"));
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid attribute regex")
});
static JSONLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script\b[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid json-ld regex")
});
static INVISIBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<head\b[^>]*>.*?</head>|<script\b[^>]*>.*?</script>|<style\b[^>]*>.*?</style>|<noscript\b[^>]*>.*?</noscript>|<template\b[^>]*>.*?</template>|<svg\b[^>]*>.*?</svg>",
    )
    .expect("valid invisible-content regex")
});
static TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid tags regex"));
static JS_REDIRECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:window\.location|location\.href)\s*=\s*["']([^"']+)["']"#)
        .expect("valid js redirect regex")
});

/// Strips tags, decodes the common entities, and collapses whitespace.
#[must_use]
pub fn clean_text(input: &str) -> String {
    let no_tags = TAGS_RE.replace_all(input, " ");
    decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes the handful of entities that routinely appear in titles and
/// meta content.
#[must_use]
pub fn decode_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// First `<title>` text, if non-empty.
#[must_use]
pub fn extract_title(html: &str) -> Option<String> {
    let cap = TITLE_RE.captures(html)?;
    non_empty(clean_text(cap.get(1).map_or("", |m| m.as_str())))
}

/// Cleaned inner text of every `<tag>` element, in document order.
///
/// `tag` must be a plain element name such as `"h1"`.
#[must_use]
pub fn extract_tag_texts(html: &str, tag: &str) -> Vec<String> {
    let pattern = format!(
        r"(?is)<{tag}\b[^>]*>(.*?)</{tag}\s*>",
        tag = regex::escape(tag)
    );
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Value of a tag attribute, matched case-insensitively by name.
#[must_use]
pub fn extract_attr(tag: &str, attr: &str) -> Option<String> {
    ATTR_RE.captures_iter(tag).find_map(|cap| {
        let name = cap.get(1)?.as_str();
        if !name.eq_ignore_ascii_case(attr) {
            return None;
        }
        let value = cap.get(2).or_else(|| cap.get(3)).or_else(|| cap.get(4))?;
        Some(decode_entities(value.as_str().trim()))
    })
}

/// `content` of the first `<meta>` whose `name` or `property` equals `key`.
#[must_use]
pub fn extract_meta(html: &str, key: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let matches_key = ["name", "property"].iter().any(|attr| {
            extract_attr(tag, attr).is_some_and(|value| value.eq_ignore_ascii_case(key))
        });
        if matches_key {
            extract_attr(tag, "content").and_then(non_empty)
        } else {
            None
        }
    })
}

/// `href` of the first `<link>` whose `rel` list contains `rel`.
#[must_use]
pub fn find_link_href(html: &str, rel: &str) -> Option<String> {
    LINK_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        let rels = extract_attr(tag, "rel")?;
        if rels.split_whitespace().any(|r| r.eq_ignore_ascii_case(rel)) {
            extract_attr(tag, "href").and_then(non_empty)
        } else {
            None
        }
    })
}

/// `lang` attribute of the `<html>` element.
#[must_use]
pub fn extract_html_lang(html: &str) -> Option<String> {
    let tag = HTML_TAG_RE.find(html)?;
    extract_attr(tag.as_str(), "lang").and_then(non_empty)
}

/// `url=` target of a `<meta http-equiv="refresh">`, as written.
#[must_use]
pub fn meta_refresh_target(html: &str) -> Option<String> {
    META_TAG_RE.find_iter(html).find_map(|m| {
        let tag = m.as_str();
        if !extract_attr(tag, "http-equiv").is_some_and(|v| v.eq_ignore_ascii_case("refresh")) {
            return None;
        }
        let content = extract_attr(tag, "content")?;
        let at = content.to_ascii_lowercase().find("url=")?;
        let target = content[at + 4..].trim().trim_matches(['\'', '"']).trim();
        non_empty(target.to_string())
    })
}

/// First `window.location = ".."` or `location.href = ".."` assignment.
#[must_use]
pub fn js_redirect_target(html: &str) -> Option<String> {
    let cap = JS_REDIRECT_RE.captures(html)?;
    non_empty(cap[1].trim().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hreflang {
    pub lang: String,
    pub href: String,
}

/// Every `<link hreflang=.. href=..>` alternate, first occurrence per language.
#[must_use]
pub fn extract_hreflangs(html: &str) -> Vec<Hreflang> {
    let mut out: Vec<Hreflang> = Vec::new();
    for m in LINK_TAG_RE.find_iter(html) {
        let tag = m.as_str();
        let (Some(lang), Some(href)) = (extract_attr(tag, "hreflang"), extract_attr(tag, "href"))
        else {
            continue;
        };
        if lang.is_empty() || out.iter().any(|h| h.lang == lang) {
            continue;
        }
        out.push(Hreflang { lang, href });
    }
    out
}

/// Parsed JSON-LD blocks. Top-level arrays and `@graph` members are
/// flattened into `blocks`; scripts that are not valid JSON are counted in
/// `invalid_blocks`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonLd {
    pub blocks: Vec<Value>,
    pub invalid_blocks: usize,
}

impl JsonLd {
    /// `@type` values across all blocks, in order, without duplicates.
    #[must_use]
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for block in &self.blocks {
            let found = match block.get("@type") {
                Some(Value::String(t)) => vec![t.clone()],
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect(),
                _ => Vec::new(),
            };
            for t in found {
                if !types.contains(&t) {
                    types.push(t);
                }
            }
        }
        types
    }

    #[must_use]
    pub fn has_any_type(&self, wanted: &[&str]) -> bool {
        self.types().iter().any(|t| wanted.contains(&t.as_str()))
    }
}

#[must_use]
pub fn extract_jsonld(html: &str) -> JsonLd {
    let mut out = JsonLd::default();
    for cap in JSONLD_RE.captures_iter(html) {
        let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
        if raw.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => flatten_jsonld(value, &mut out.blocks),
            Err(_) => out.invalid_blocks += 1,
        }
    }
    out
}

fn flatten_jsonld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_jsonld(item, out);
            }
        }
        Value::Object(mut map) => {
            let graph = map.remove("@graph");
            if map.keys().any(|k| k != "@context") {
                out.push(Value::Object(map));
            }
            if let Some(graph) = graph {
                flatten_jsonld(graph, out);
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageStats {
    pub total: usize,
    pub missing_alt: usize,
}

/// Counts `<img>` tags and those whose `alt` is absent or blank.
#[must_use]
pub fn image_alt_stats(html: &str) -> ImageStats {
    let mut stats = ImageStats::default();
    for m in IMG_TAG_RE.find_iter(html) {
        stats.total += 1;
        let has_alt = extract_attr(m.as_str(), "alt").is_some_and(|alt| !alt.trim().is_empty());
        if !has_alt {
            stats.missing_alt += 1;
        }
    }
    stats
}

/// Body text a reader would see: head, scripts, styles and comments
/// removed, tags stripped, whitespace collapsed.
#[must_use]
pub fn visible_text(html: &str) -> String {
    let without_invisible = INVISIBLE_RE.replace_all(html, " ");
    clean_text(&without_invisible)
}

#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html lang="en-US">
<head>
  <title> Best AI Tools &amp; Apps | Example </title>
  <meta name="description" content="A curated list of the best AI tools for writers.">
  <meta content="https://example.com/og.png" property="og:image">
  <meta name='viewport' content='width=device-width'>
  <link rel="canonical" href="https://example.com/tools/">
  <link rel="alternate" hreflang="en" href="https://example.com/tools/">
  <link rel="alternate" hreflang="x-default" href="https://example.com/">
  <script type="application/ld+json">{"@context":"https://schema.org","@type":"Organization","name":"Example"}</script>
  <script type="application/ld+json">[{"@type":"FAQPage"},{"@type":["Article","BlogPosting"]}]</script>
  <script type="application/ld+json">{not json}</script>
</head>
<body>
  <h1>Best <em>AI</em> tools</h1>
  <p>Writers love these tools.</p>
  <script>var hidden = "do not count";</script>
  <img src="a.png" alt="A chart">
  <img src="b.png">
  <img src="c.png" alt="  ">
  <h1>Second heading</h1>
</body>
</html>"#;

    #[test]
    fn title_is_cleaned_and_decoded() {
        assert_eq!(
            extract_title(PAGE).as_deref(),
            Some("Best AI Tools & Apps | Example")
        );
    }

    #[test]
    fn title_missing_returns_none() {
        assert!(extract_title("<html><title>   </title></html>").is_none());
        assert!(extract_title("<html></html>").is_none());
    }

    #[test]
    fn meta_matches_name_or_property_in_any_order() {
        assert_eq!(
            extract_meta(PAGE, "description").as_deref(),
            Some("A curated list of the best AI tools for writers.")
        );
        assert_eq!(
            extract_meta(PAGE, "og:image").as_deref(),
            Some("https://example.com/og.png")
        );
        assert_eq!(
            extract_meta(PAGE, "viewport").as_deref(),
            Some("width=device-width")
        );
        assert!(extract_meta(PAGE, "robots").is_none());
    }

    #[test]
    fn meta_ignores_data_prefixed_attributes() {
        let html = r#"<meta data-name="description" content="wrong"><meta name="description" content="right">"#;
        assert_eq!(extract_meta(html, "description").as_deref(), Some("right"));
    }

    #[test]
    fn h1_texts_are_collected_in_order() {
        assert_eq!(
            extract_tag_texts(PAGE, "h1"),
            vec!["Best AI tools".to_string(), "Second heading".to_string()]
        );
    }

    #[test]
    fn canonical_and_lang() {
        assert_eq!(
            find_link_href(PAGE, "canonical").as_deref(),
            Some("https://example.com/tools/")
        );
        assert_eq!(extract_html_lang(PAGE).as_deref(), Some("en-US"));
    }

    #[test]
    fn hreflangs_are_extracted() {
        let langs: Vec<String> = extract_hreflangs(PAGE).into_iter().map(|h| h.lang).collect();
        assert_eq!(langs, vec!["en".to_string(), "x-default".to_string()]);
    }

    #[test]
    fn meta_refresh_target_reads_url_from_content() {
        let html = r#"<meta http-equiv="Refresh" content="0; URL='/en/home'">"#;
        assert_eq!(meta_refresh_target(html).as_deref(), Some("/en/home"));
        assert!(meta_refresh_target(r#"<meta http-equiv="refresh" content="30">"#).is_none());
        assert!(meta_refresh_target(PAGE).is_none());
    }

    #[test]
    fn js_redirect_target_matches_location_assignments() {
        let html = r#"<script>if (true) { window.location.href = "/ru/"; }</script>"#;
        assert_eq!(js_redirect_target(html).as_deref(), Some("/ru/"));
        let html = "<script>window.location='https://example.com/en/'</script>";
        assert_eq!(
            js_redirect_target(html).as_deref(),
            Some("https://example.com/en/")
        );
        assert!(js_redirect_target(PAGE).is_none());
    }

    #[test]
    fn jsonld_flattens_arrays_and_counts_invalid_blocks() {
        let ld = extract_jsonld(PAGE);
        assert_eq!(ld.blocks.len(), 3);
        assert_eq!(ld.invalid_blocks, 1);
        assert_eq!(
            ld.types(),
            vec!["Organization", "FAQPage", "Article", "BlogPosting"]
        );
        assert!(ld.has_any_type(&["FAQPage", "HowTo"]));
        assert!(!ld.has_any_type(&["Product"]));
    }

    #[test]
    fn jsonld_graph_members_are_flattened() {
        let html = r#"<script type="application/ld+json">{"@context":"https://schema.org","@graph":[{"@type":"WebSite"},{"@type":"Product"}]}</script>"#;
        let ld = extract_jsonld(html);
        assert_eq!(ld.types(), vec!["WebSite", "Product"]);
    }

    #[test]
    fn image_stats_count_missing_and_blank_alt() {
        assert_eq!(
            image_alt_stats(PAGE),
            ImageStats {
                total: 3,
                missing_alt: 2
            }
        );
    }

    #[test]
    fn visible_text_skips_head_and_scripts() {
        let text = visible_text(PAGE);
        assert!(text.contains("Writers love these tools."));
        assert!(!text.contains("do not count"));
        assert!(!text.contains("curated list"));
        assert!(!text.contains("Example </title>"));
    }

    #[test]
    fn word_count_ignores_punctuation_tokens() {
        assert_eq!(word_count("one two - three —"), 3);
        assert_eq!(word_count(""), 0);
    }
}
