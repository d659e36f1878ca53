//! Content-redirect detection in HTML bodies.
//!
//! Two families are recognized:
//! - `<meta http-equiv="refresh">` tags with a `url=` directive
//! - inline scripts that assign a literal URL to `location`
//!
//! Meta-refresh wins over JavaScript when both are present, matching how a
//! browser would behave with an immediate refresh. Malformed instructions
//! are never errors; anything that does not parse cleanly is skipped.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::resolve::types::ContentRedirect;

// CSS selector strings
const META_SELECTOR_STR: &str = "meta[http-equiv]";
const SCRIPT_SELECTOR_STR: &str = "script";

static META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(META_SELECTOR_STR).expect("meta selector is a valid CSS selector")
});

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(SCRIPT_SELECTOR_STR).expect("script selector is a valid CSS selector")
});

// Literal-URL navigation assignments: window.location = '...',
// location.href = "...", document.location = '...', and friends.
static LOCATION_ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:(?:window|document|top|self)\.)?location(?:\.href)?\s*=\s*["']([^"']+)["']"#)
        .expect("location assignment pattern is a valid regex")
});

// location.replace('...') and location.assign("...") calls.
static LOCATION_CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:(?:window|document|top|self)\.)?location\.(?:replace|assign)\s*\(\s*["']([^"']+)["']\s*\)"#)
        .expect("location call pattern is a valid regex")
});

/// Scans an HTML body for a redirect instruction.
///
/// Meta-refresh tags are checked first across the whole document; when
/// several declare a target, the last one wins. Only if no meta-refresh
/// matches are inline scripts scanned, in document order, for the first
/// literal navigation. URLs built at runtime are invisible to this pass
/// and only surface under the rendered strategy.
///
/// # Arguments
///
/// * `html` - The response body.
/// * `base` - The URL the body was fetched from, for resolving relative
///   targets.
///
/// # Returns
///
/// The redirect to follow, or `None` when the body holds no usable
/// instruction.
pub fn scan(html: &str, base: &Url) -> Option<ContentRedirect> {
    let document = Html::parse_document(html);
    if let Some(found) = find_meta_refresh(&document, base) {
        return Some(found);
    }
    find_javascript_redirect(&document, base)
}

fn find_meta_refresh(document: &Html, base: &Url) -> Option<ContentRedirect> {
    let mut last_match = None;
    for element in document.select(&META_SELECTOR) {
        let Some(http_equiv) = element.value().attr("http-equiv") else {
            continue;
        };
        if !http_equiv.trim().eq_ignore_ascii_case("refresh") {
            continue;
        }
        let Some(content) = element.value().attr("content") else {
            continue;
        };
        let Some((delay_seconds, raw_target)) = parse_refresh_content(content) else {
            log::debug!("Ignoring malformed refresh content {:?}", content);
            continue;
        };
        let Ok(target) = base.join(&raw_target) else {
            log::debug!("Ignoring unresolvable refresh target {:?}", raw_target);
            continue;
        };
        if !matches!(target.scheme(), "http" | "https") {
            continue;
        }
        last_match = Some(ContentRedirect::MetaRefresh {
            delay_seconds,
            target,
        });
    }
    last_match
}

fn find_javascript_redirect(document: &Html, base: &Url) -> Option<ContentRedirect> {
    for script in document.select(&SCRIPT_SELECTOR) {
        // External scripts are never fetched here.
        if script.value().attr("src").is_some() {
            continue;
        }
        let source: String = script.text().collect();
        if source.is_empty() {
            continue;
        }

        let mut earliest: Option<(usize, &str)> = None;
        for pattern in [&*LOCATION_ASSIGN_RE, &*LOCATION_CALL_RE] {
            if let Some(captures) = pattern.captures(&source) {
                let offset = captures.get(0).map_or(usize::MAX, |m| m.start());
                if let Some(target) = captures.get(1) {
                    if earliest.is_none_or(|(best, _)| offset < best) {
                        earliest = Some((offset, target.as_str()));
                    }
                }
            }
        }

        let Some((_, raw_target)) = earliest else {
            continue;
        };
        let Ok(target) = base.join(raw_target) else {
            log::debug!("Ignoring unresolvable script target {:?}", raw_target);
            continue;
        };
        if matches!(target.scheme(), "http" | "https") {
            return Some(ContentRedirect::JavaScript { target });
        }
    }
    None
}

/// Parses the `content` attribute of a refresh tag.
///
/// Accepts `<delay>` or `<delay>;url=<target>` with optional whitespace
/// and optional quoting around the target. A delay with no target is a
/// reload, not a redirect, and returns `None`. Anything that does not fit
/// the shape returns `None`.
fn parse_refresh_content(content: &str) -> Option<(f64, String)> {
    let mut pieces = content.split(';');
    let delay_seconds: f64 = pieces.next()?.trim().parse().ok()?;
    if !delay_seconds.is_finite() || delay_seconds < 0.0 {
        return None;
    }
    for piece in pieces {
        let piece = piece.trim();
        let Some(prefix) = piece.get(..4) else {
            continue;
        };
        if !prefix.eq_ignore_ascii_case("url=") {
            continue;
        }
        let target = piece[4..]
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim();
        if target.is_empty() {
            return None;
        }
        return Some((delay_seconds, target.to_string()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/page/index.html").unwrap()
    }

    fn scan_for(html: &str) -> Option<ContentRedirect> {
        scan(html, &base())
    }

    #[test]
    fn test_immediate_meta_refresh() {
        let html = r#"<html><head>
            <meta http-equiv="refresh" content="0;url=/next">
        </head></html>"#;
        match scan_for(html) {
            Some(ContentRedirect::MetaRefresh {
                delay_seconds,
                target,
            }) => {
                assert_eq!(delay_seconds, 0.0);
                assert_eq!(target.as_str(), "https://example.com/next");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_delayed_refresh_with_absolute_target() {
        let html = r#"<meta http-equiv="refresh" content="5; url=https://other.example/landing">"#;
        match scan_for(html) {
            Some(ContentRedirect::MetaRefresh {
                delay_seconds,
                target,
            }) => {
                assert_eq!(delay_seconds, 5.0);
                assert_eq!(target.as_str(), "https://other.example/landing");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_refresh_directive_is_case_insensitive() {
        let html = r#"<META HTTP-EQUIV="Refresh" CONTENT="0;URL=/caps">"#;
        match scan_for(html) {
            Some(ContentRedirect::MetaRefresh { target, .. }) => {
                assert_eq!(target.as_str(), "https://example.com/caps");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_quoted_target_is_unwrapped() {
        let html = r#"<meta http-equiv="refresh" content="0;url='/quoted'">"#;
        match scan_for(html) {
            Some(ContentRedirect::MetaRefresh { target, .. }) => {
                assert_eq!(target.as_str(), "https://example.com/quoted");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_last_refresh_tag_wins() {
        let html = r#"
            <meta http-equiv="refresh" content="0;url=/first">
            <meta http-equiv="refresh" content="0;url=/second">
        "#;
        match scan_for(html) {
            Some(ContentRedirect::MetaRefresh { target, .. }) => {
                assert_eq!(target.as_str(), "https://example.com/second");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_reload_without_target_is_not_a_redirect() {
        assert_eq!(scan_for(r#"<meta http-equiv="refresh" content="30">"#), None);
    }

    #[test]
    fn test_malformed_delay_is_ignored() {
        assert_eq!(
            scan_for(r#"<meta http-equiv="refresh" content="soon;url=/next">"#),
            None
        );
        assert_eq!(
            scan_for(r#"<meta http-equiv="refresh" content="-1;url=/next">"#),
            None
        );
    }

    #[test]
    fn test_unrelated_meta_tags_are_ignored() {
        assert_eq!(
            scan_for(r#"<meta http-equiv="content-type" content="text/html">"#),
            None
        );
        assert_eq!(scan_for(r#"<meta name="description" content="hi">"#), None);
    }

    #[test]
    fn test_window_location_assignment() {
        let html = r#"<script>window.location.href = "/landing";</script>"#;
        match scan_for(html) {
            Some(ContentRedirect::JavaScript { target }) => {
                assert_eq!(target.as_str(), "https://example.com/landing");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_bare_location_assignment() {
        let html = r#"<script>location = 'https://other.example/';</script>"#;
        match scan_for(html) {
            Some(ContentRedirect::JavaScript { target }) => {
                assert_eq!(target.as_str(), "https://other.example/");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_location_replace_call() {
        let html = r#"<script>window.location.replace('/replaced');</script>"#;
        match scan_for(html) {
            Some(ContentRedirect::JavaScript { target }) => {
                assert_eq!(target.as_str(), "https://example.com/replaced");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_first_navigation_in_document_order_wins() {
        let html = r#"
            <script>var greeting = "hello";</script>
            <script>location.replace('/first'); window.location.href = '/second';</script>
        "#;
        match scan_for(html) {
            Some(ContentRedirect::JavaScript { target }) => {
                assert_eq!(target.as_str(), "https://example.com/first");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_computed_urls_are_invisible() {
        let html = r#"<script>window.location.href = base + "/path";</script>"#;
        assert_eq!(scan_for(html), None);
    }

    #[test]
    fn test_similar_identifiers_do_not_match() {
        let html = r#"<script>var myLocation = "/not-a-redirect";</script>"#;
        assert_eq!(scan_for(html), None);
    }

    #[test]
    fn test_external_scripts_are_skipped() {
        let html = r#"<script src="/app.js">window.location.href = "/nope";</script>"#;
        assert_eq!(scan_for(html), None);
    }

    #[test]
    fn test_meta_refresh_beats_javascript() {
        let html = r#"
            <script>window.location.href = "/from-script";</script>
            <meta http-equiv="refresh" content="0;url=/from-meta">
        "#;
        match scan_for(html) {
            Some(ContentRedirect::MetaRefresh { target, .. }) => {
                assert_eq!(target.as_str(), "https://example.com/from-meta");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }

    #[test]
    fn test_javascript_scheme_targets_are_rejected() {
        let html = r#"<meta http-equiv="refresh" content="0;url=javascript:alert(1)">"#;
        assert_eq!(scan_for(html), None);
    }

    #[test]
    fn test_plain_page_has_no_redirect() {
        let html = "<html><body><h1>Landing</h1><p>No redirects here.</p></body></html>";
        assert_eq!(scan_for(html), None);
    }

    #[test]
    fn test_refresh_with_extra_directives() {
        let html = r#"<meta http-equiv="refresh" content="0; url=/next; charset=utf-8">"#;
        match scan_for(html) {
            Some(ContentRedirect::MetaRefresh { target, .. }) => {
                assert_eq!(target.as_str(), "https://example.com/next");
            }
            other => panic!("unexpected scan result: {:?}", other),
        }
    }
}
