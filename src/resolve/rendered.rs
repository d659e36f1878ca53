//! Browser-backed chain resolution.
//!
//! The rendered strategy drives a headless Chromium instance and records
//! the navigations the browser actually performs: server redirects,
//! meta-refresh, and script-driven navigation including URLs assembled at
//! runtime, which the static scanner cannot see. One browser process is
//! shared across the run; each resolution gets its own page, which is
//! always torn down before the result is returned.
//!
//! Compiled only with the `browser` feature. Without it a stub with the
//! same surface reports the missing capability as an error.

use std::sync::Arc;

use crate::error_handling::{InitializationError, ProcessingStats, ResolveError};
use crate::resolve::types::{ChainResult, ResolveRequest};

#[cfg(feature = "browser")]
use chromiumoxide::browser::{Browser, BrowserConfig};
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, EventResponseReceived, ResourceType,
};
#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::page::EventFrameNavigated;
#[cfg(feature = "browser")]
use chromiumoxide::Page;
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::time::{sleep_until, timeout, Instant};
#[cfg(feature = "browser")]
use url::Url;

#[cfg(feature = "browser")]
use crate::config::constants::{RENDER_NAVIGATION_TIMEOUT, RENDER_SETTLE_WINDOW};
#[cfg(feature = "browser")]
use crate::error_handling::InfoType;
#[cfg(feature = "browser")]
use crate::resolve::content;
#[cfg(feature = "browser")]
use crate::resolve::tracker::ChainTracker;
#[cfg(feature = "browser")]
use crate::resolve::types::{ContentRedirect, StrategyTag};

/// Resolves chains by observing a real browser session.
#[cfg(feature = "browser")]
pub struct RenderedChainResolver {
    browser: Arc<Browser>,
    stats: Arc<ProcessingStats>,
}

/// A navigation-relevant event captured during the settle window.
#[cfg(feature = "browser")]
#[derive(Debug)]
enum RenderEvent {
    /// The browser followed a server-issued redirect.
    HttpHop {
        source: String,
        status: u16,
        target: String,
    },
    /// The top-level frame committed a new document.
    Navigated { url: String },
}

#[cfg(feature = "browser")]
impl RenderedChainResolver {
    /// Launches the shared headless browser.
    pub async fn launch(stats: Arc<ProcessingStats>) -> Result<Self, InitializationError> {
        let (browser, mut handler) = Browser::launch(
            BrowserConfig::builder()
                .no_sandbox()
                .window_size(1920, 1080)
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .build()
                .map_err(InitializationError::BrowserError)?,
        )
        .await
        .map_err(|e| InitializationError::BrowserError(e.to_string()))?;

        // The handler stream must be drained for the browser connection
        // to make progress.
        tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(RenderedChainResolver {
            browser: Arc::new(browser),
            stats,
        })
    }

    /// Resolves one URL by rendering it.
    ///
    /// Opens a fresh page, navigates to the seed, and lets the page
    /// settle so delayed redirects can fire. The chain is then rebuilt
    /// from the captured navigation events, with the settled DOM checked
    /// once more for a still-pending meta-refresh. The page is closed on
    /// every path, success or failure.
    pub async fn resolve(&self, request: &ResolveRequest) -> Result<ChainResult, ResolveError> {
        let seed = Url::parse(&request.url).map_err(|source| ResolveError::InvalidUrl {
            url: request.url.clone(),
            source,
        })?;

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| self.session_error(&request.url, e))?;

        let outcome = self.drive(&page, &seed, request).await;
        if let Err(e) = page.close().await {
            log::debug!("Failed to close page for {}: {}", request.url, e);
        }
        let result = outcome?;

        if result.https_upgrade {
            self.stats.increment_info(InfoType::HttpsUpgrade);
        }
        if result.domain_changes {
            self.stats.increment_info(InfoType::DomainChange);
        }
        Ok(result)
    }

    async fn drive(
        &self,
        page: &Page,
        seed: &Url,
        request: &ResolveRequest,
    ) -> Result<ChainResult, ResolveError> {
        // Listeners go up before navigation so redirect events from the
        // initial request are not lost.
        let mut request_events = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| self.session_error(&request.url, e))?;
        let mut response_events = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| self.session_error(&request.url, e))?;
        let mut navigation_events = page
            .event_listener::<EventFrameNavigated>()
            .await
            .map_err(|e| self.session_error(&request.url, e))?;

        match timeout(RENDER_NAVIGATION_TIMEOUT, page.goto(seed.as_str())).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(self.session_error(&request.url, e)),
            // A slow navigation is not fatal; the chain is rebuilt from
            // whatever events did arrive.
            Err(_) => log::debug!("Navigation to {} timed out", seed),
        }

        let mut observed: Vec<RenderEvent> = Vec::new();
        let mut document_statuses: Vec<(String, u16)> = Vec::new();
        let deadline = Instant::now() + RENDER_SETTLE_WINDOW;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => break,
                maybe_event = request_events.next() => {
                    let Some(event) = maybe_event else { break };
                    if !matches!(event.r#type, Some(ResourceType::Document)) {
                        continue;
                    }
                    if let Some(redirect) = &event.redirect_response {
                        observed.push(RenderEvent::HttpHop {
                            source: redirect.url.clone(),
                            status: u16::try_from(redirect.status).unwrap_or(0),
                            target: event.request.url.clone(),
                        });
                    }
                }
                maybe_event = response_events.next() => {
                    let Some(event) = maybe_event else { break };
                    if matches!(event.r#type, ResourceType::Document) {
                        document_statuses.push((
                            event.response.url.clone(),
                            u16::try_from(event.response.status).unwrap_or(0),
                        ));
                    }
                }
                maybe_event = navigation_events.next() => {
                    let Some(event) = maybe_event else { break };
                    if event.frame.parent_id.is_none() && event.frame.url.starts_with("http") {
                        observed.push(RenderEvent::Navigated {
                            url: event.frame.url.clone(),
                        });
                    }
                }
            }
        }

        let settled_dom = match page.evaluate("document.documentElement.outerHTML").await {
            Ok(value) => value.into_value::<String>().ok(),
            Err(e) => {
                log::debug!("Could not read settled DOM for {}: {}", request.url, e);
                None
            }
        };

        assemble_chain(
            request,
            seed,
            observed,
            document_statuses,
            settled_dom,
            &self.stats,
        )
    }

    fn session_error(&self, url: &str, error: impl std::fmt::Display) -> ResolveError {
        ResolveError::RenderSession {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Rebuilds a [`ChainResult`] from the events one rendered session
/// produced.
///
/// Events replay through the same [`ChainTracker`] the static walker
/// uses, so loop detection, the hop cap, and the summary flags behave
/// identically across strategies. The browser may have navigated past the
/// hop cap; replay stops recording at the cap regardless.
#[cfg(feature = "browser")]
fn assemble_chain(
    request: &ResolveRequest,
    seed: &Url,
    observed: Vec<RenderEvent>,
    document_statuses: Vec<(String, u16)>,
    settled_dom: Option<String>,
    stats: &ProcessingStats,
) -> Result<ChainResult, ResolveError> {
    if observed.is_empty() && document_statuses.is_empty() && settled_dom.is_none() {
        return Err(ResolveError::RenderSession {
            url: request.url.clone(),
            message: "no navigation events or document observed".to_string(),
        });
    }

    let mut tracker = ChainTracker::new(&request.url, StrategyTag::Rendered);
    tracker.mark_visited(seed.as_str());
    let mut current = seed.to_string();

    for event in observed {
        match event {
            RenderEvent::HttpHop {
                source,
                status,
                target,
            } => {
                tracker.record_http_hop(&source, &target, status);
                if tracker.mark_visited(&target) {
                    stats.increment_info(InfoType::LoopDetected);
                    return Ok(tracker.finalize_truncated(&source, status));
                }
                if tracker.redirect_hops() >= request.max_redirects {
                    stats.increment_info(InfoType::HopCapReached);
                    return Ok(tracker.finalize_truncated(&target, status));
                }
                current = target;
            }
            RenderEvent::Navigated { url } => {
                // A commit matching the current document is the tail end
                // of a hop already recorded from network events.
                if urls_equivalent(&current, &url) {
                    continue;
                }
                let status = status_for(&document_statuses, &current).unwrap_or(200);
                stats.increment_info(InfoType::JavascriptRedirect);
                tracker.record_javascript_hop(&current, &url);
                if tracker.mark_visited(&url) {
                    stats.increment_info(InfoType::LoopDetected);
                    return Ok(tracker.finalize_truncated(&current, status));
                }
                if tracker.redirect_hops() >= request.max_redirects {
                    stats.increment_info(InfoType::HopCapReached);
                    return Ok(tracker.finalize_truncated(&url, status));
                }
                current = url;
            }
        }
    }

    let final_status = status_for(&document_statuses, &current).unwrap_or(200);

    // A refresh still sitting in the settled DOM points past the settle
    // window. Record where the page is headed without waiting for it.
    if let Some(html) = settled_dom {
        if let Ok(current_url) = Url::parse(&current) {
            if let Some(ContentRedirect::MetaRefresh {
                delay_seconds,
                target,
            }) = content::scan(&html, &current_url)
            {
                if !urls_equivalent(&current, target.as_str()) {
                    stats.increment_info(InfoType::MetaRefresh);
                    tracker.record_meta_refresh_hop(&current, target.as_str(), delay_seconds);
                    if tracker.mark_visited(target.as_str()) {
                        stats.increment_info(InfoType::LoopDetected);
                        return Ok(tracker.finalize_truncated(&current, final_status));
                    }
                    return Ok(tracker.finalize_truncated(target.as_str(), final_status));
                }
            }
        }
    }

    Ok(tracker.finalize(&current, final_status))
}

/// Latest observed status for a document URL, if any.
#[cfg(feature = "browser")]
fn status_for(document_statuses: &[(String, u16)], url: &str) -> Option<u16> {
    document_statuses
        .iter()
        .rev()
        .find(|(candidate, _)| urls_equivalent(candidate, url))
        .map(|(_, status)| *status)
}

#[cfg(feature = "browser")]
fn urls_equivalent(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(left), Ok(right)) => left == right,
        _ => a == b,
    }
}

/// Stub compiled without the `browser` feature.
#[cfg(not(feature = "browser"))]
pub struct RenderedChainResolver;

#[cfg(not(feature = "browser"))]
impl RenderedChainResolver {
    /// Always fails: rendering requires the `browser` feature.
    pub async fn launch(_stats: Arc<ProcessingStats>) -> Result<Self, InitializationError> {
        Err(InitializationError::BrowserError(
            "this build does not include the `browser` feature".to_string(),
        ))
    }

    /// Always fails: rendering requires the `browser` feature.
    pub async fn resolve(&self, request: &ResolveRequest) -> Result<ChainResult, ResolveError> {
        Err(ResolveError::RenderSession {
            url: request.url.clone(),
            message: "this build does not include the `browser` feature".to_string(),
        })
    }
}
