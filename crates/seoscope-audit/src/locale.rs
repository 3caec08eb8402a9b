//! Locale routing: a root that only redirects or links to its language
//! versions is audited through the locale page that carries the content.

use reqwest::{Client, Url};
use seoscope_search::{fetch_page, html};

/// Paths tried, in order, when the root names no locale page itself.
const LOCALE_PATHS: [&str; 2] = ["en", "ru"];

/// The page to audit in place of a thin root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LocalePage {
    pub url: String,
    pub body: String,
}

/// Resolves the locale page behind `page`, the body fetched from `url`.
///
/// A root with both a title and JSON-LD is kept as is. Otherwise the first
/// hit wins: the `x-default` hreflang, an `en*` hreflang, any hreflang, a
/// meta refresh, a JS redirect, then `/en/` and `/ru/` on the same origin
/// when they carry a longer title than the root. A candidate that is the
/// input URL itself (ignoring a trailing `/`), or that cannot be fetched,
/// leaves the root in place.
pub(crate) async fn resolve_locale(client: &Client, url: &Url, page: &str) -> Option<LocalePage> {
    let title = html::extract_title(page);
    if title.is_some() && !html::extract_jsonld(page).blocks.is_empty() {
        return None;
    }

    let origin = url.origin().ascii_serialization();
    let (target, body) = match declared_target(page) {
        Some(href) => (url.join(&href).ok()?.to_string(), None),
        None => {
            let (target, body) = locale_path(client, &origin, title.as_deref()).await?;
            (target, Some(body))
        }
    };

    if target.trim_end_matches('/') == url.as_str().trim_end_matches('/') {
        return None;
    }

    let body = match body {
        Some(body) => body,
        None => match fetch_page(client, &target).await {
            Ok(body) => body,
            Err(reason) => {
                tracing::warn!(
                    url = %url,
                    locale_url = %target,
                    error = %reason,
                    "locale page unavailable; auditing root"
                );
                return None;
            }
        },
    };
    tracing::info!(url = %url, locale_url = %target, "auditing locale page");
    Some(LocalePage { url: target, body })
}

/// A locale target named by the page itself, as written.
fn declared_target(page: &str) -> Option<String> {
    let hreflangs = html::extract_hreflangs(page);
    hreflangs
        .iter()
        .find(|h| h.lang.eq_ignore_ascii_case("x-default"))
        .or_else(|| {
            hreflangs
                .iter()
                .find(|h| h.lang.to_ascii_lowercase().starts_with("en"))
        })
        .or_else(|| hreflangs.first())
        .map(|h| h.href.clone())
        .or_else(|| html::meta_refresh_target(page))
        .or_else(|| html::js_redirect_target(page))
}

async fn locale_path(
    client: &Client,
    origin: &str,
    root_title: Option<&str>,
) -> Option<(String, String)> {
    for locale in LOCALE_PATHS {
        let candidate = format!("{origin}/{locale}/");
        let Ok(body) = fetch_page(client, &candidate).await else {
            continue;
        };
        let Some(title) = html::extract_title(&body) else {
            continue;
        };
        if root_title.is_none_or(|root| title.chars().count() > root.chars().count()) {
            return Some((candidate, body));
        }
    }
    None
}
