//! Integration tests for `PageAuditor::audit` with the page, its site files
//! and the autocomplete source served by `wiremock`, and speed injected
//! through stub providers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seoscope_audit::{AuditError, NoSpeedProvider, PageAuditor, SpeedProvider};
use seoscope_core::{Category, ScoreWeights};
use seoscope_search::{build_http_client, AutocompleteClient, FailureReason, KeywordExpander};

struct FixedSpeed(f64);

#[async_trait]
impl SpeedProvider for FixedSpeed {
    async fn measure_speed(&self, _url: &str) -> Result<f64, FailureReason> {
        Ok(self.0)
    }
}

fn auditor(server: &MockServer, speed: Arc<dyn SpeedProvider>) -> PageAuditor {
    let http = build_http_client(5, "seoscope-test/0.1").expect("client");
    let expander = KeywordExpander::new(Arc::new(AutocompleteClient::new(
        http.clone(),
        &server.uri(),
        "en",
    )));
    PageAuditor::new(http, expander, speed, ScoreWeights::default())
}

const FULL_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <title>Best AI tools for writers</title>
  <meta name="description" content="Hand-picked AI tools that help writers draft, edit and publish faster than ever.">
  <meta name="viewport" content="width=device-width">
  <link rel="canonical" href="/">
  <script type="application/ld+json">{"@context":"https://schema.org","@type":"Organization","name":"Tools"}</script>
  <script type="application/ld+json">{"@type":"FAQPage"}</script>
</head>
<body>
  <h1>Best AI tools for writers</h1>
  <p>These are the best AI tools for writers. Every AI writing tool here was tested.</p>
</body>
</html>"#;

async fn mount_site(server: &MockServer, page: &str) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: GPTBot\nDisallow: /\n"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<urlset><url><loc>https://a.example/</loc></url><url><loc>https://a.example/b</loc></url></urlset>",
        ))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/llms.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Tools\n"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/llms-full.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

fn never_requested(server_path: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(server_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_PAGE))
        .expect(0)
}

#[tokio::test]
async fn full_audit_scores_every_category() {
    let server = MockServer::start().await;
    mount_site(&server, FULL_PAGE).await;
    never_requested("/en/").mount(&server).await;
    never_requested("/ru/").mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/complete/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "best ai tools for writers",
            ["best ai tools for writers free", "ai tools for writers"]
        ])))
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let audit = auditor(&server, Arc::new(FixedSpeed(90.0)))
        .audit(&url)
        .await
        .expect("audit should succeed");

    let score = &audit.score;
    assert!((score.category(Category::Meta) - 100.0).abs() < 1e-9);
    assert!((score.category(Category::StructuredData) - 100.0).abs() < 1e-9);
    assert!((score.category(Category::Performance) - 90.0).abs() < 1e-9);
    assert!((score.category(Category::MachineReadability) - 80.0).abs() < 1e-9);
    // 2 of 3 candidates ("...free" is absent) appear in the body.
    assert!((score.category(Category::Keywords) - 200.0 / 3.0).abs() < 1e-6);
    assert!(score.unavailable.is_empty());

    let expected_overall =
        0.25 * 100.0 + 0.20 * 100.0 + 0.20 * 90.0 + 0.20 * (200.0 / 3.0) + 0.15 * 80.0;
    assert!((score.overall - expected_overall).abs() < 1e-6);

    let facts = &audit.facts;
    assert!(facts.site.robots_txt);
    assert_eq!(facts.site.blocked_ai_bots, vec!["gptbot"]);
    assert_eq!(facts.site.sitemap_url_count, Some(2));
    assert!(facts.site.llms_txt);
    assert!(!facts.site.llms_full_txt);
    assert_eq!(facts.speed_score, Some(90.0));
    assert!(!facts.https);
    assert!(audit
        .action_items()
        .iter()
        .any(|i| i == "Serve the page over HTTPS"));
    assert_eq!(audit.locale_url, None);

    let content = &facts.content;
    assert_eq!(content.lang, "en");
    assert_eq!(content.counted_words, 17);
    let words: Vec<&str> = content.top_terms[..4].iter().map(|t| t.word.as_str()).collect();
    assert_eq!(words, vec!["best", "tools", "for", "writers"]);
    let best = &content.top_terms[0];
    assert_eq!(best.count, 2);
    assert!((best.density - 11.8).abs() < 1e-9);
    assert!(best.in_title && best.in_h1 && !best.in_desc);
    assert!(content.top_terms[1].in_desc);
}

#[tokio::test]
async fn missing_signals_score_zero_and_are_listed_unavailable() {
    let server = MockServer::start().await;
    mount_site(&server, "<html><body><p>nothing here</p></body></html>").await;

    let url = format!("{}/", server.uri());
    let audit = auditor(&server, Arc::new(NoSpeedProvider))
        .audit(&url)
        .await
        .expect("audit should still complete");

    let score = &audit.score;
    assert!(score.category(Category::Meta).abs() < 1e-9);
    assert!(score.category(Category::Performance).abs() < 1e-9);
    assert!(score.category(Category::Keywords).abs() < 1e-9);
    assert_eq!(
        score.unavailable,
        vec![Category::Performance, Category::Keywords]
    );
    // Only machine readability (llms.txt) contributes.
    assert!((score.overall - 0.15 * 80.0).abs() < 1e-9);
}

#[tokio::test]
async fn autocomplete_failure_still_scores_keywords_from_title() {
    let server = MockServer::start().await;
    mount_site(&server, FULL_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/complete/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let audit = auditor(&server, Arc::new(FixedSpeed(50.0)))
        .audit(&url)
        .await
        .unwrap();

    // The title itself is the only candidate, and the body repeats it.
    assert!((audit.score.category(Category::Keywords) - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn unreachable_page_fails_without_partial_score() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = auditor(&server, Arc::new(FixedSpeed(100.0)))
        .audit(&url)
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            AuditError::FetchFailed {
                reason: FailureReason::Status(404),
                ..
            }
        ),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn non_http_url_is_rejected() {
    let server = MockServer::start().await;
    let err = auditor(&server, Arc::new(NoSpeedProvider))
        .audit("ftp://example.com/")
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::InvalidUrl { .. }));
}

// ---------------------------------------------------------------------------
// Locale routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn thin_root_is_audited_through_its_x_default_page() {
    let server = MockServer::start().await;
    mount_site(
        &server,
        r#"<html><head>
        <link rel="alternate" hreflang="en" href="/en/">
        <link rel="alternate" hreflang="x-default" href="/intl/">
        </head><body></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/intl/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_PAGE))
        .expect(1)
        .mount(&server)
        .await;
    never_requested("/en/").mount(&server).await;

    let url = format!("{}/", server.uri());
    let audit = auditor(&server, Arc::new(FixedSpeed(80.0)))
        .audit(&url)
        .await
        .unwrap();

    assert_eq!(audit.url, url);
    assert_eq!(audit.locale_url, Some(format!("{}/intl/", server.uri())));
    assert_eq!(audit.facts.title.as_deref(), Some("Best AI tools for writers"));
    assert!((audit.score.category(Category::StructuredData) - 100.0).abs() < 1e-9);
    // Site files still come from the audited origin.
    assert!(audit.facts.site.llms_txt);
}

#[tokio::test]
async fn locale_path_with_longer_title_replaces_thin_root() {
    let server = MockServer::start().await;
    mount_site(
        &server,
        "<html><head><title>Hi</title></head><body>loading</body></html>",
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/en/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ru/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>Лучшие инструменты для авторов</title></head>\
             <body><h1>Инструменты</h1><p>Инструменты для текстов и инструменты для идей.</p></body></html>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let audit = auditor(&server, Arc::new(NoSpeedProvider))
        .audit(&url)
        .await
        .unwrap();

    assert_eq!(audit.locale_url, Some(format!("{}/ru/", server.uri())));
    let content = &audit.facts.content;
    assert_eq!(content.lang, "ru");
    let top = &content.top_terms[0];
    assert_eq!(top.word, "инструменты");
    assert_eq!(top.count, 3);
    assert!(top.in_title && top.in_h1 && !top.in_desc);
}

#[tokio::test]
async fn locale_pointing_back_at_the_input_keeps_the_root() {
    let server = MockServer::start().await;
    mount_site(
        &server,
        r#"<html><head><link rel="alternate" hreflang="x-default" href="/"></head>
        <body><p>plain root</p></body></html>"#,
    )
    .await;
    never_requested("/en/").mount(&server).await;
    never_requested("/ru/").mount(&server).await;

    let url = server.uri();
    let audit = auditor(&server, Arc::new(NoSpeedProvider))
        .audit(&url)
        .await
        .unwrap();

    assert_eq!(audit.locale_url, None);
    assert_eq!(audit.facts.title, None);
    assert_eq!(audit.facts.content.top_terms[0].word, "plain");
}
