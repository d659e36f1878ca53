//! Single-hop HTTP probing.
//!
//! The resolver never lets the HTTP client follow redirects on its own.
//! Each hop is dereferenced with exactly one request, and the 3xx family
//! surfaces as an observation the chain walker acts on.

use reqwest::header::{self, HeaderName};
use reqwest::{Client, Method, RequestBuilder};
use std::sync::Arc;
use url::Url;

use crate::config::constants::MAX_RESPONSE_BODY_SIZE;
use crate::config::ProbeMethod;
use crate::error_handling::{ProcessingStats, ResolveError, WarningType};
use crate::resolve::types::HopObservation;

/// Dereferences one URL at a time against a manual-redirect client.
pub struct HttpHopResolver {
    client: Arc<Client>,
    stats: Arc<ProcessingStats>,
}

impl HttpHopResolver {
    /// Creates a resolver over a shared client and statistics sink.
    pub fn new(client: Arc<Client>, stats: Arc<ProcessingStats>) -> Self {
        HttpHopResolver { client, stats }
    }

    /// Performs a single probe of `url` and classifies the response.
    ///
    /// A redirect status with a usable Location header becomes
    /// [`HopObservation::Redirect`] carrying the absolute target. Anything
    /// else becomes [`HopObservation::Terminal`]; for GET probes of
    /// successful responses the body is fetched so the caller can scan it
    /// for content redirects.
    ///
    /// # Errors
    /// [`ResolveError::Network`] on transport failure, or a protocol
    /// variant when a canonical redirect status arrives without a
    /// resolvable Location.
    pub async fn resolve_one(
        &self,
        url: &Url,
        method: ProbeMethod,
    ) -> Result<HopObservation, ResolveError> {
        let request = apply_browser_headers(self.client.request(http_method(method), url.clone()));
        let response = request.send().await.map_err(|source| ResolveError::Network {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        log::debug!("{} {} -> {}", http_method(method), url, status.as_u16());

        if status.is_redirection() {
            if let Some(raw) = response.headers().get(header::LOCATION) {
                let raw = raw.to_str().unwrap_or("").trim();
                if !raw.is_empty() {
                    let location = Url::parse(raw).or_else(|_| url.join(raw)).map_err(|source| {
                        ResolveError::BadLocation {
                            url: url.to_string(),
                            location: raw.to_string(),
                            source,
                        }
                    })?;
                    return Ok(HopObservation::Redirect {
                        status: status.as_u16(),
                        location,
                    });
                }
            }
            if matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308) {
                return Err(ResolveError::MissingLocation {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            // 300 and 304 promise no Location; fall through to terminal.
        }

        let body = if method == ProbeMethod::Get && status.is_success() {
            self.read_scannable_body(response, url).await
        } else {
            None
        };
        Ok(HopObservation::Terminal {
            status: status.as_u16(),
            body,
        })
    }

    /// Reads a response body when it is worth scanning for content
    /// redirects. Non-HTML and oversized bodies are skipped with a
    /// warning counted against the run.
    async fn read_scannable_body(&self, response: reqwest::Response, url: &Url) -> Option<String> {
        if let Some(content_type) = response.headers().get(header::CONTENT_TYPE) {
            let value = content_type.to_str().unwrap_or("");
            if !value.is_empty() && !value.to_ascii_lowercase().contains("html") {
                log::debug!("Skipping content scan for {} ({})", url, value);
                self.stats.increment_warning(WarningType::UnscannableBody);
                return None;
            }
        }
        if let Some(declared) = response.content_length() {
            if declared > MAX_RESPONSE_BODY_SIZE as u64 {
                log::debug!("Skipping content scan for {} ({} byte body)", url, declared);
                self.stats.increment_warning(WarningType::OversizedBody);
                return None;
            }
        }
        match response.text().await {
            Ok(text) if text.len() <= MAX_RESPONSE_BODY_SIZE => Some(text),
            Ok(text) => {
                log::debug!("Skipping content scan for {} ({} byte body)", url, text.len());
                self.stats.increment_warning(WarningType::OversizedBody);
                None
            }
            Err(e) => {
                log::debug!("Failed to read body from {}: {}", url, e);
                self.stats.increment_warning(WarningType::UnscannableBody);
                None
            }
        }
    }
}

fn http_method(method: ProbeMethod) -> Method {
    match method {
        ProbeMethod::Head => Method::HEAD,
        ProbeMethod::Get => Method::GET,
    }
}

/// Attaches the header set a desktop browser would send on a top-level
/// navigation. Shorteners and bot-gating CDNs answer differently, or not
/// at all, without these.
fn apply_browser_headers(builder: RequestBuilder) -> RequestBuilder {
    builder
        .header(
            header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        )
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .header(header::REFERER, "https://www.google.com/")
        .header(header::UPGRADE_INSECURE_REQUESTS, "1")
        .header(HeaderName::from_static("sec-fetch-dest"), "document")
        .header(HeaderName::from_static("sec-fetch-mode"), "navigate")
        .header(HeaderName::from_static("sec-fetch-site"), "cross-site")
        .header(HeaderName::from_static("sec-fetch-user"), "?1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::initialization::init_probe_client;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn resolver() -> HttpHopResolver {
        let client = init_probe_client(&Config::default()).expect("client builds");
        HttpHopResolver::new(client, Arc::new(ProcessingStats::new()))
    }

    fn resolver_with_stats(stats: Arc<ProcessingStats>) -> HttpHopResolver {
        let client = init_probe_client(&Config::default()).expect("client builds");
        HttpHopResolver::new(client, stats)
    }

    #[tokio::test]
    async fn test_relative_location_resolves_against_source() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/start"))
                .times(1)
                .respond_with(status_code(301).append_header("Location", "/target")),
        );

        let url = Url::parse(&server.url_str("/start")).unwrap();
        let observation = resolver().resolve_one(&url, ProbeMethod::Get).await.unwrap();
        match observation {
            HopObservation::Redirect { status, location } => {
                assert_eq!(status, 301);
                assert_eq!(location.path(), "/target");
                assert_eq!(location.host_str(), url.host_str());
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_absolute_location_is_taken_verbatim() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/start"))
                .times(1)
                .respond_with(
                    status_code(302).append_header("Location", "https://elsewhere.example/landing"),
                ),
        );

        let url = Url::parse(&server.url_str("/start")).unwrap();
        let observation = resolver()
            .resolve_one(&url, ProbeMethod::Head)
            .await
            .unwrap();
        match observation {
            HopObservation::Redirect { status, location } => {
                assert_eq!(status, 302);
                assert_eq!(location.as_str(), "https://elsewhere.example/landing");
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_canonical_redirect_without_location_is_an_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/broken"))
                .times(1)
                .respond_with(status_code(301)),
        );

        let url = Url::parse(&server.url_str("/broken")).unwrap();
        let err = resolver()
            .resolve_one(&url, ProbeMethod::Get)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingLocation { status: 301, .. }));
    }

    #[tokio::test]
    async fn test_not_modified_without_location_is_terminal() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/cached"))
                .times(1)
                .respond_with(status_code(304)),
        );

        let url = Url::parse(&server.url_str("/cached")).unwrap();
        let observation = resolver().resolve_one(&url, ProbeMethod::Get).await.unwrap();
        assert!(matches!(
            observation,
            HopObservation::Terminal { status: 304, body: None }
        ));
    }

    #[tokio::test]
    async fn test_get_probe_captures_html_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/page"))
                .times(1)
                .respond_with(
                    status_code(200)
                        .append_header("Content-Type", "text/html")
                        .body("<html><body>hi</body></html>"),
                ),
        );

        let url = Url::parse(&server.url_str("/page")).unwrap();
        let observation = resolver().resolve_one(&url, ProbeMethod::Get).await.unwrap();
        match observation {
            HopObservation::Terminal { status, body } => {
                assert_eq!(status, 200);
                assert!(body.unwrap().contains("hi"));
            }
            other => panic!("expected terminal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_head_probe_carries_no_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/page"))
                .times(1)
                .respond_with(status_code(200).append_header("Content-Type", "text/html")),
        );

        let url = Url::parse(&server.url_str("/page")).unwrap();
        let observation = resolver()
            .resolve_one(&url, ProbeMethod::Head)
            .await
            .unwrap();
        assert!(matches!(
            observation,
            HopObservation::Terminal { status: 200, body: None }
        ));
    }

    #[tokio::test]
    async fn test_non_html_body_is_skipped_with_warning() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/data"))
                .times(1)
                .respond_with(
                    status_code(200)
                        .append_header("Content-Type", "application/json")
                        .body("{\"redirect\":\"/nope\"}"),
                ),
        );

        let stats = Arc::new(ProcessingStats::new());
        let url = Url::parse(&server.url_str("/data")).unwrap();
        let observation = resolver_with_stats(Arc::clone(&stats))
            .resolve_one(&url, ProbeMethod::Get)
            .await
            .unwrap();
        assert!(matches!(
            observation,
            HopObservation::Terminal { status: 200, body: None }
        ));
        assert_eq!(stats.get_warning_count(WarningType::UnscannableBody), 1);
    }

    #[tokio::test]
    async fn test_error_statuses_keep_their_code() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/gone"))
                .times(1)
                .respond_with(status_code(410)),
        );

        let url = Url::parse(&server.url_str("/gone")).unwrap();
        let observation = resolver().resolve_one(&url, ProbeMethod::Get).await.unwrap();
        assert!(matches!(
            observation,
            HopObservation::Terminal { status: 410, .. }
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_network_error() {
        // Nothing listens on this port.
        let url = Url::parse("http://127.0.0.1:9/unreachable").unwrap();
        let err = resolver()
            .resolve_one(&url, ProbeMethod::Get)
            .await
            .unwrap_err();
        assert!(err.is_network());
    }
}
