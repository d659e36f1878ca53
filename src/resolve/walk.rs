//! The static chain walker.
//!
//! Drives [`HttpHopResolver`] hop by hop, feeding each observation into a
//! [`ChainTracker`] until the chain terminates, loops, or exhausts its hop
//! budget. Content redirects found in terminal bodies extend the chain and
//! spend hop budget exactly like server-issued redirects.

use reqwest::Client;
use std::sync::Arc;
use url::Url;

use crate::config::ProbeMethod;
use crate::error_handling::{InfoType, ProcessingStats, ResolveError};
use crate::resolve::content;
use crate::resolve::http::HttpHopResolver;
use crate::resolve::tracker::ChainTracker;
use crate::resolve::types::{ChainResult, ContentRedirect, HopObservation, ResolveRequest, StrategyTag};

/// Resolves full redirect chains without a browser.
pub struct ChainResolver {
    prober: HttpHopResolver,
    stats: Arc<ProcessingStats>,
}

impl ChainResolver {
    /// Creates a resolver over a shared manual-redirect client.
    pub fn new(client: Arc<Client>, stats: Arc<ProcessingStats>) -> Self {
        ChainResolver {
            prober: HttpHopResolver::new(client, Arc::clone(&stats)),
            stats,
        }
    }

    /// Resolves one URL to its full chain.
    ///
    /// Loops and hop-cap exhaustion are ordinary results with the
    /// corresponding flags set. Errors mean the chain could not be
    /// resolved at all: the seed does not parse, the network failed, or a
    /// server broke redirect semantics.
    ///
    /// Each followed hop issues exactly one probe (plus at most one GET
    /// retry after a failed HEAD), so a chain of `n` hops costs at most
    /// `n + 1` probes before retries.
    pub async fn resolve(&self, request: &ResolveRequest) -> Result<ChainResult, ResolveError> {
        let seed = Url::parse(&request.url).map_err(|source| ResolveError::InvalidUrl {
            url: request.url.clone(),
            source,
        })?;

        let mut tracker = ChainTracker::new(&request.url, StrategyTag::Static);
        tracker.mark_visited(seed.as_str());
        let mut current = seed;

        loop {
            let (target, status) = match self.probe(&current, request.method).await? {
                HopObservation::Redirect { status, location } => {
                    log::debug!("{} -[{}]-> {}", current, status, location);
                    tracker.record_http_hop(current.as_str(), location.as_str(), status);
                    (location, status)
                }
                HopObservation::Terminal { status, body } => {
                    match body.as_deref().and_then(|html| content::scan(html, &current)) {
                        Some(ContentRedirect::MetaRefresh {
                            delay_seconds,
                            target,
                        }) => {
                            log::debug!("{} -[meta {}s]-> {}", current, delay_seconds, target);
                            self.stats.increment_info(InfoType::MetaRefresh);
                            tracker.record_meta_refresh_hop(
                                current.as_str(),
                                target.as_str(),
                                delay_seconds,
                            );
                            (target, status)
                        }
                        Some(ContentRedirect::JavaScript { target }) => {
                            log::debug!("{} -[script]-> {}", current, target);
                            self.stats.increment_info(InfoType::JavascriptRedirect);
                            tracker.record_javascript_hop(current.as_str(), target.as_str());
                            (target, status)
                        }
                        None => {
                            return Ok(self.annotate(tracker.finalize(current.as_str(), status)));
                        }
                    }
                }
            };

            if tracker.mark_visited(target.as_str()) {
                log::debug!("Redirect loop at {} while resolving {}", target, request.url);
                self.stats.increment_info(InfoType::LoopDetected);
                return Ok(self.annotate(tracker.finalize_truncated(current.as_str(), status)));
            }
            if tracker.redirect_hops() >= request.max_redirects {
                log::debug!(
                    "Hop cap of {} reached while resolving {}",
                    request.max_redirects,
                    request.url
                );
                self.stats.increment_info(InfoType::HopCapReached);
                return Ok(self.annotate(tracker.finalize_truncated(target.as_str(), status)));
            }
            current = target;
        }
    }

    /// Probes one URL, retrying a failed or rejected HEAD as GET.
    ///
    /// Some servers answer HEAD with errors or drop the connection while
    /// handling GET normally. The retry result is authoritative either
    /// way.
    async fn probe(
        &self,
        url: &Url,
        method: ProbeMethod,
    ) -> Result<HopObservation, ResolveError> {
        match method {
            ProbeMethod::Get => self.prober.resolve_one(url, ProbeMethod::Get).await,
            ProbeMethod::Head => match self.prober.resolve_one(url, ProbeMethod::Head).await {
                Ok(HopObservation::Terminal { status, .. }) if status >= 400 => {
                    log::debug!("HEAD got {} from {}, retrying as GET", status, url);
                    self.stats.increment_info(InfoType::HeadFallback);
                    self.prober.resolve_one(url, ProbeMethod::Get).await
                }
                Err(err) if err.is_network() => {
                    log::debug!("HEAD failed for {} ({}), retrying as GET", url, err);
                    self.stats.increment_info(InfoType::HeadFallback);
                    self.prober.resolve_one(url, ProbeMethod::Get).await
                }
                other => other,
            },
        }
    }

    fn annotate(&self, result: ChainResult) -> ChainResult {
        if result.https_upgrade {
            self.stats.increment_info(InfoType::HttpsUpgrade);
        }
        if result.domain_changes {
            self.stats.increment_info(InfoType::DomainChange);
        }
        result
    }
}
