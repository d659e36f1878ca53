//! Application-wide constants.
//!
//! Tuning knobs for the resolver live here so the various modules agree on
//! timeouts, caps, and identification strings without threading extra
//! configuration through every call site.

use std::time::Duration;

/// Maximum number of concurrent resolutions in batch mode.
pub const SEMAPHORE_LIMIT: usize = 30;

/// Concurrency clamp applied when the rendered strategy is active. Each
/// rendered resolution owns a browser page, so the static limit would
/// exhaust the browser.
pub const RENDERED_SESSION_LIMIT: usize = 3;

/// Interval between progress log lines in batch mode (seconds).
pub const LOGGING_INTERVAL: u64 = 10;

/// Default ceiling on followed redirects per chain. Reaching it is a normal
/// outcome, not an error.
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Timeout for a single redirect-hop request (connect plus response).
pub const HOP_TIMEOUT: Duration = Duration::from_secs(8);

/// Wall-clock budget for resolving one URL end to end, covering every hop.
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a rendered page is left to settle after the initial navigation
/// so delayed meta-refresh and JavaScript redirects can fire.
pub const RENDER_SETTLE_WINDOW: Duration = Duration::from_secs(4);

/// Timeout for the initial browser navigation in a rendered session.
pub const RENDER_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest response body that will be scanned for content redirects.
/// Bigger bodies are skipped with a warning rather than truncated.
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Maximum accepted URL length. Longer inputs are rejected before any
/// network activity.
pub const MAX_URL_LENGTH: usize = 2048;

/// Status code reported for chains short-circuited by the affiliate gate.
pub const AFFILIATE_BLOCKED_STATUS: u16 = 403;

/// Desktop browser identity sent with every probe. Redirect behavior on
/// link shorteners and CDNs frequently differs for non-browser agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
