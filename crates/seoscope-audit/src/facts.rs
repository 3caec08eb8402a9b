use serde::{Deserialize, Serialize};
use seoscope_search::html::{self, Hreflang};

use crate::content::{analyze_content, ContentAnalysis, Placement};
use crate::score::{DESCRIPTION_LEN, TITLE_LEN};
use crate::site_files::SiteFiles;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Everything observed about a page, independent of how it is scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageFacts {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Vec<String>,
    pub canonical: Option<String>,
    pub viewport: bool,
    pub html_lang: Option<String>,
    pub open_graph: OpenGraph,
    pub twitter_card: Option<String>,
    pub jsonld_blocks: usize,
    pub jsonld_types: Vec<String>,
    pub invalid_jsonld_blocks: usize,
    pub noindex: bool,
    pub https: bool,
    pub hreflangs: Vec<Hreflang>,
    pub has_x_default: bool,
    pub images: usize,
    pub images_missing_alt: usize,
    pub word_count: usize,
    #[serde(default)]
    pub content: ContentAnalysis,
    pub site: SiteFiles,
    pub speed_score: Option<f64>,
}

impl PageFacts {
    /// Page-level facts from the fetched HTML. Site files and speed are
    /// filled in by the auditor afterwards.
    #[must_use]
    pub fn extract(url: &str, page: &str) -> Self {
        let jsonld = html::extract_jsonld(page);
        let hreflangs = html::extract_hreflangs(page);
        let images = html::image_alt_stats(page);
        let body = html::visible_text(page);
        let title = html::extract_title(page);
        let meta_description = html::extract_meta(page, "description");
        let h1 = html::extract_tag_texts(page, "h1");
        let content = analyze_content(
            &body,
            Placement {
                title: title.as_deref(),
                h1: h1.first().map(String::as_str),
                description: meta_description.as_deref(),
            },
        );
        Self {
            title,
            meta_description,
            h1,
            canonical: html::find_link_href(page, "canonical"),
            viewport: html::extract_meta(page, "viewport").is_some(),
            html_lang: html::extract_html_lang(page),
            open_graph: OpenGraph {
                title: html::extract_meta(page, "og:title"),
                description: html::extract_meta(page, "og:description"),
                image: html::extract_meta(page, "og:image"),
                url: html::extract_meta(page, "og:url"),
                kind: html::extract_meta(page, "og:type"),
            },
            twitter_card: html::extract_meta(page, "twitter:card"),
            jsonld_blocks: jsonld.blocks.len(),
            jsonld_types: jsonld.types(),
            invalid_jsonld_blocks: jsonld.invalid_blocks,
            noindex: html::extract_meta(page, "robots")
                .is_some_and(|robots| robots.to_ascii_lowercase().contains("noindex")),
            https: url.trim_start().to_ascii_lowercase().starts_with("https://"),
            has_x_default: hreflangs.iter().any(|h| h.lang.eq_ignore_ascii_case("x-default")),
            hreflangs,
            images: images.total,
            images_missing_alt: images.missing_alt,
            word_count: html::word_count(&body),
            content,
            site: SiteFiles::default(),
            speed_score: None,
        }
    }

    /// Concrete fixes suggested by these facts, most basic first.
    #[must_use]
    pub fn action_items(&self) -> Vec<String> {
        let mut items = Vec::new();

        match &self.title {
            None => items.push("Add a <title> tag".to_string()),
            Some(title) if title.chars().count() > *TITLE_LEN.end() => items.push(format!(
                "Shorten the title to {} characters or fewer (currently {})",
                TITLE_LEN.end(),
                title.chars().count()
            )),
            Some(_) => {}
        }

        match &self.meta_description {
            None => items.push("Add a meta description".to_string()),
            Some(desc) if desc.chars().count() > *DESCRIPTION_LEN.end() => items.push(format!(
                "Shorten the meta description to {} characters or fewer (currently {})",
                DESCRIPTION_LEN.end(),
                desc.chars().count()
            )),
            Some(_) => {}
        }

        if self.h1.is_empty() {
            items.push("Add an H1 heading".to_string());
        }
        if self.canonical.is_none() {
            items.push("Add a canonical URL".to_string());
        }
        if !self.viewport {
            items.push("Add a viewport meta tag for mobile".to_string());
        }
        if self.html_lang.is_none() {
            items.push("Add a lang attribute to the <html> tag".to_string());
        }
        if self.open_graph.image.is_none() {
            items.push("Add an og:image for social previews".to_string());
        }
        if self.jsonld_blocks == 0 {
            items.push("Add JSON-LD structured data".to_string());
        }
        if self.noindex {
            items.push("Remove noindex from the robots meta tag".to_string());
        }
        if !self.https {
            items.push("Serve the page over HTTPS".to_string());
        }
        if !self.site.llms_txt {
            items.push("Publish /llms.txt for AI agent discovery".to_string());
        }
        if !self.site.blocked_ai_bots.is_empty() {
            items.push(format!(
                "Allow AI crawlers in robots.txt (blocked: {})",
                self.site.blocked_ai_bots.join(", ")
            ));
        }
        if self.images_missing_alt > 0 {
            items.push(format!(
                "Add alt text to {} image(s)",
                self.images_missing_alt
            ));
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"<html lang="en"><head>
        <title>Seoscope: audit pages fast</title>
        <meta name="description" content="Seoscope audits pages for search engines and AI agents with one command.">
        <meta name="viewport" content="width=device-width">
        <meta name="robots" content="index,follow">
        <meta property="og:image" content="https://seoscope.example/og.png">
        <meta property="og:type" content="website">
        <meta name="twitter:card" content="summary">
        <link rel="canonical" href="https://seoscope.example/">
        <link rel="alternate" hreflang="x-default" href="https://seoscope.example/">
        <script type="application/ld+json">{"@type":"WebSite"}</script>
        </head><body><h1>Seoscope</h1><img src="a.png" alt="logo"></body></html>"#;

    #[test]
    fn extracts_head_facts() {
        let facts = PageFacts::extract("https://seoscope.example/", COMPLETE);
        assert_eq!(facts.title.as_deref(), Some("Seoscope: audit pages fast"));
        assert!(facts.viewport);
        assert_eq!(facts.html_lang.as_deref(), Some("en"));
        assert_eq!(facts.open_graph.kind.as_deref(), Some("website"));
        assert_eq!(facts.twitter_card.as_deref(), Some("summary"));
        assert_eq!(facts.jsonld_types, vec!["WebSite"]);
        assert!(facts.has_x_default);
        assert!(!facts.noindex);
        assert!(facts.https);
        assert_eq!(facts.images, 1);
        assert_eq!(facts.images_missing_alt, 0);
    }

    #[test]
    fn content_terms_note_where_they_are_placed() {
        let facts = PageFacts::extract("https://seoscope.example/", COMPLETE);
        assert_eq!(facts.content.lang, "en");
        assert_eq!(facts.content.counted_words, 1);
        let term = &facts.content.top_terms[0];
        assert_eq!(term.word, "seoscope");
        assert!((term.density - 100.0).abs() < 1e-9);
        assert!(term.in_title && term.in_h1 && term.in_desc);
    }

    #[test]
    fn complete_page_only_lacks_site_files() {
        let mut facts = PageFacts::extract("https://seoscope.example/", COMPLETE);
        assert_eq!(
            facts.action_items(),
            vec!["Publish /llms.txt for AI agent discovery".to_string()]
        );
        facts.site.llms_txt = true;
        assert!(facts.action_items().is_empty());
    }

    #[test]
    fn bare_page_gets_every_basic_hint() {
        let mut facts = PageFacts::extract(
            "http://bare.example/",
            r#"<html><head><meta name="robots" content="NOINDEX"></head><body><img src="x.png"></body></html>"#,
        );
        facts.site.blocked_ai_bots = vec!["gptbot".to_string()];
        let items = facts.action_items();
        for expected in [
            "Add a <title> tag",
            "Add a meta description",
            "Add an H1 heading",
            "Add a canonical URL",
            "Add a viewport meta tag for mobile",
            "Add a lang attribute to the <html> tag",
            "Add an og:image for social previews",
            "Add JSON-LD structured data",
            "Remove noindex from the robots meta tag",
            "Serve the page over HTTPS",
            "Publish /llms.txt for AI agent discovery",
            "Allow AI crawlers in robots.txt (blocked: gptbot)",
            "Add alt text to 1 image(s)",
        ] {
            assert!(items.iter().any(|i| i == expected), "missing: {expected}");
        }
    }

    #[test]
    fn overlong_title_is_flagged() {
        let title = "x".repeat(75);
        let facts = PageFacts::extract(
            "https://a.example/",
            &format!("<html><head><title>{title}</title></head></html>"),
        );
        assert!(facts
            .action_items()
            .iter()
            .any(|i| i.starts_with("Shorten the title") && i.contains("75")));
    }
}
