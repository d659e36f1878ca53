//! Data model for redirect chains.
//!
//! A resolution produces a [`ChainResult`]: the ordered [`Hop`] list plus
//! summary fields derived from it. These types serialize directly to the
//! JSON shape written by the output layer, one object per resolved URL.

use serde::Serialize;
use url::Url;

use crate::config::constants::MAX_REDIRECT_HOPS;
use crate::config::{ProbeMethod, Strategy};

/// How a single hop moved the chain forward, or ended it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HopKind {
    /// A 3xx response with a Location header.
    HttpRedirect,
    /// A `<meta http-equiv="refresh">` tag pointing at another URL.
    MetaRefresh,
    /// An inline script assigning a literal URL to `location`.
    JavascriptRedirect,
    /// The terminal response. Closes every fully-resolved chain.
    Final,
}

impl HopKind {
    /// Short label used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            HopKind::HttpRedirect => "http",
            HopKind::MetaRefresh => "meta-refresh",
            HopKind::JavascriptRedirect => "javascript",
            HopKind::Final => "final",
        }
    }
}

/// One step in a redirect chain.
#[derive(Debug, Clone, Serialize)]
pub struct Hop {
    /// The URL that was dereferenced for this step.
    pub source_url: String,
    /// What kind of step this is.
    pub kind: HopKind,
    /// Where the step points. `None` for the terminal hop.
    pub target_url: Option<String>,
    /// HTTP status observed at `source_url`. `None` for content redirects
    /// discovered inside an already-recorded response body.
    pub status_code: Option<u16>,
    /// Declared delay in seconds. Only present for meta-refresh hops.
    pub delay_seconds: Option<f64>,
    /// 1-based position within the chain.
    pub sequence: usize,
}

/// Which engine produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
    /// Plain HTTP probes plus HTML source scanning.
    Static,
    /// A real browser session.
    Rendered,
    /// The affiliate gate answered without any network activity.
    AffiliateBlocked,
}

/// Details attached to a result the affiliate gate short-circuited.
#[derive(Debug, Clone, Serialize)]
pub struct BlockedInfo {
    /// Why the URL was not dereferenced.
    pub blocked_reason: String,
    /// The affiliate network the URL belongs to.
    pub affiliate_service: String,
    /// A non-affiliate landing page for the same service.
    pub suggested_direct_url: String,
}

/// The fully-resolved redirect chain for one seed URL.
#[derive(Debug, Clone, Serialize)]
pub struct ChainResult {
    /// The seed URL exactly as submitted.
    pub original_url: String,
    /// Where the chain ended. For looped or capped chains, the last URL
    /// that was actually dereferenced or discovered.
    pub final_url: String,
    /// Status observed at the end of the chain.
    pub final_status_code: u16,
    /// Every step in order. Never empty once resolution was attempted.
    pub hops: Vec<Hop>,
    /// Number of redirecting hops (the terminal hop does not count).
    pub redirect_count: usize,
    /// Whether the chain revisited a URL and was cut short.
    pub has_loop: bool,
    /// Whether more than one distinct HTTP redirect status appeared.
    pub has_mixed_types: bool,
    /// Whether the chain ended on a different host than it started on.
    pub domain_changes: bool,
    /// Whether a plain-HTTP seed ended on an HTTPS final URL.
    pub https_upgrade: bool,
    /// Which engine produced this result.
    pub strategy: StrategyTag,
    /// Present only when the affiliate gate blocked the URL.
    #[serde(flatten)]
    pub blocked: Option<BlockedInfo>,
}

/// A single resolution request.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// The URL to resolve.
    pub url: String,
    /// Probe method for redirect hops.
    pub method: ProbeMethod,
    /// Ceiling on followed redirects for this chain.
    pub max_redirects: usize,
    /// Resolution strategy.
    pub strategy: Strategy,
}

impl ResolveRequest {
    /// Creates a request with default probing behavior: HEAD probes, the
    /// standard hop cap, and the static strategy.
    pub fn new(url: impl Into<String>) -> Self {
        ResolveRequest {
            url: url.into(),
            method: ProbeMethod::Head,
            max_redirects: MAX_REDIRECT_HOPS,
            strategy: Strategy::Static,
        }
    }
}

/// What one HTTP probe observed.
#[derive(Debug)]
pub enum HopObservation {
    /// A redirect status with a resolvable Location target.
    Redirect {
        /// The 3xx status code.
        status: u16,
        /// The absolute redirect target.
        location: Url,
    },
    /// Any non-redirect response.
    Terminal {
        /// The status code.
        status: u16,
        /// The response body, when it was fetched and is scannable.
        body: Option<String>,
    },
}

/// A redirect instruction found inside an HTML body.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentRedirect {
    /// `<meta http-equiv="refresh" content="<delay>;url=<target>">`.
    MetaRefresh {
        /// The declared delay in seconds.
        delay_seconds: f64,
        /// The absolute target URL.
        target: Url,
    },
    /// An inline script navigating to a literal URL.
    JavaScript {
        /// The absolute target URL.
        target: Url,
    },
}
