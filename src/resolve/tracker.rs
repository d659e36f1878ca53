//! Chain accumulation and cycle detection.
//!
//! [`ChainTracker`] records hops as the resolver discovers them, answers
//! "have we been here before", and assembles the final [`ChainResult`]
//! with its derived summary fields.

use std::collections::HashSet;
use url::Url;

use crate::resolve::types::{ChainResult, Hop, HopKind, StrategyTag};

/// Accumulates the hops of one chain under resolution.
#[derive(Debug)]
pub struct ChainTracker {
    original_url: String,
    strategy: StrategyTag,
    hops: Vec<Hop>,
    visited: HashSet<String>,
    redirect_statuses: Vec<u16>,
    looped: bool,
}

impl ChainTracker {
    /// Starts tracking a chain for the given seed URL.
    ///
    /// The seed is not marked visited automatically; callers do that once
    /// they commit to dereferencing it.
    pub fn new(original_url: &str, strategy: StrategyTag) -> Self {
        ChainTracker {
            original_url: original_url.to_string(),
            strategy,
            hops: Vec::new(),
            visited: HashSet::new(),
            redirect_statuses: Vec::new(),
            looped: false,
        }
    }

    /// Records a server-issued redirect from `source` to `target`.
    pub fn record_http_hop(&mut self, source: &str, target: &str, status: u16) {
        self.redirect_statuses.push(status);
        self.push_hop(source, HopKind::HttpRedirect, Some(target), Some(status), None);
    }

    /// Records a meta-refresh redirect discovered in a response body.
    pub fn record_meta_refresh_hop(&mut self, source: &str, target: &str, delay_seconds: f64) {
        self.push_hop(source, HopKind::MetaRefresh, Some(target), None, Some(delay_seconds));
    }

    /// Records a JavaScript redirect discovered in a response body.
    pub fn record_javascript_hop(&mut self, source: &str, target: &str) {
        self.push_hop(source, HopKind::JavascriptRedirect, Some(target), None, None);
    }

    fn push_hop(
        &mut self,
        source: &str,
        kind: HopKind,
        target: Option<&str>,
        status: Option<u16>,
        delay_seconds: Option<f64>,
    ) {
        let sequence = self.hops.len() + 1;
        self.hops.push(Hop {
            source_url: source.to_string(),
            kind,
            target_url: target.map(str::to_string),
            status_code: status,
            delay_seconds,
            sequence,
        });
    }

    /// Marks a URL as visited. Returns `true` when it was already seen,
    /// which latches the loop flag on the eventual result.
    ///
    /// URLs are compared structurally: host matching ignores case, and
    /// fragments are ignored entirely since they never reach the server.
    /// Query strings stay significant.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        let key = normalize_for_visit(url);
        let already_seen = !self.visited.insert(key);
        if already_seen {
            self.looped = true;
        }
        already_seen
    }

    /// Number of redirecting hops recorded so far.
    pub fn redirect_hops(&self) -> usize {
        self.hops.len()
    }

    /// Closes a chain that reached a terminal response.
    ///
    /// Appends the terminal hop and computes the summary fields.
    pub fn finalize(mut self, terminal_url: &str, terminal_status: u16) -> ChainResult {
        let sequence = self.hops.len() + 1;
        self.hops.push(Hop {
            source_url: terminal_url.to_string(),
            kind: HopKind::Final,
            target_url: None,
            status_code: Some(terminal_status),
            delay_seconds: None,
            sequence,
        });
        self.assemble(terminal_url, terminal_status)
    }

    /// Closes a chain that was cut short by a loop or the hop cap.
    ///
    /// No terminal hop is appended: the chain never reached a terminal
    /// response, so every recorded hop is a redirect and the redirect
    /// count equals the hop count.
    pub fn finalize_truncated(self, last_url: &str, last_status: u16) -> ChainResult {
        self.assemble(last_url, last_status)
    }

    fn assemble(self, final_url: &str, final_status: u16) -> ChainResult {
        let redirect_count = self
            .hops
            .iter()
            .filter(|hop| hop.kind != HopKind::Final)
            .count();
        let distinct_statuses: HashSet<u16> = self.redirect_statuses.iter().copied().collect();
        let (domain_changes, https_upgrade) = compare_endpoints(&self.original_url, final_url);
        ChainResult {
            original_url: self.original_url,
            final_url: final_url.to_string(),
            final_status_code: final_status,
            hops: self.hops,
            redirect_count,
            has_loop: self.looped,
            has_mixed_types: distinct_statuses.len() > 1,
            domain_changes,
            https_upgrade,
            strategy: self.strategy,
            blocked: None,
        }
    }
}

/// Reduces a URL to the form used for cycle detection: scheme, lowercased
/// host, explicit port if any, path, and query. Unparsable inputs fall
/// back to trimmed lowercase string comparison.
fn normalize_for_visit(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let mut key = format!(
                "{}://{}",
                parsed.scheme(),
                parsed.host_str().unwrap_or("").to_ascii_lowercase()
            );
            if let Some(port) = parsed.port() {
                key.push(':');
                key.push_str(&port.to_string());
            }
            key.push_str(parsed.path());
            if let Some(query) = parsed.query() {
                key.push('?');
                key.push_str(query);
            }
            key
        }
        Err(_) => url.trim().to_ascii_lowercase(),
    }
}

fn compare_endpoints(original: &str, final_url: &str) -> (bool, bool) {
    match (Url::parse(original), Url::parse(final_url)) {
        (Ok(first), Ok(last)) => {
            let domain_changes = match (first.host_str(), last.host_str()) {
                (Some(a), Some(b)) => !a.eq_ignore_ascii_case(b),
                _ => false,
            };
            let https_upgrade = first.scheme() == "http" && last.scheme() == "https";
            (domain_changes, https_upgrade)
        }
        _ => (false, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_chain_gets_final_hop() {
        let mut tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        tracker.record_http_hop("http://a.example/", "http://a.example/next", 301);
        let result = tracker.finalize("http://a.example/next", 200);

        assert_eq!(result.hops.len(), 2);
        assert_eq!(result.hops[0].kind, HopKind::HttpRedirect);
        assert_eq!(result.hops[1].kind, HopKind::Final);
        assert_eq!(result.hops[1].target_url, None);
        assert_eq!(result.redirect_count, 1);
        assert_eq!(result.final_status_code, 200);
        assert!(!result.has_loop);
    }

    #[test]
    fn test_truncated_chain_has_no_final_hop() {
        let mut tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        tracker.record_http_hop("http://a.example/", "http://b.example/", 301);
        tracker.record_http_hop("http://b.example/", "http://a.example/", 302);
        tracker.mark_visited("http://a.example/");
        tracker.mark_visited("http://b.example/");
        tracker.mark_visited("http://a.example/");
        let result = tracker.finalize_truncated("http://b.example/", 302);

        assert!(result.has_loop);
        assert_eq!(result.hops.len(), 2);
        assert_eq!(result.redirect_count, result.hops.len());
        assert!(result.hops.iter().all(|hop| hop.kind != HopKind::Final));
        assert_eq!(result.final_url, "http://b.example/");
        assert_eq!(result.final_status_code, 302);
    }

    #[test]
    fn test_sequences_are_one_based_and_contiguous() {
        let mut tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        tracker.record_http_hop("http://a.example/", "http://a.example/b", 302);
        tracker.record_meta_refresh_hop("http://a.example/b", "http://a.example/c", 0.0);
        let result = tracker.finalize("http://a.example/c", 200);
        let sequences: Vec<usize> = result.hops.iter().map(|hop| hop.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn test_mixed_types_needs_distinct_statuses() {
        let mut tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        tracker.record_http_hop("http://a.example/", "http://a.example/b", 301);
        tracker.record_http_hop("http://a.example/b", "http://a.example/c", 301);
        let result = tracker.finalize("http://a.example/c", 200);
        assert!(!result.has_mixed_types);

        let mut tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        tracker.record_http_hop("http://a.example/", "http://a.example/b", 301);
        tracker.record_http_hop("http://a.example/b", "http://a.example/c", 302);
        let result = tracker.finalize("http://a.example/c", 200);
        assert!(result.has_mixed_types);
    }

    #[test]
    fn test_content_hops_do_not_affect_mixed_types() {
        let mut tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        tracker.record_http_hop("http://a.example/", "http://a.example/b", 301);
        tracker.record_meta_refresh_hop("http://a.example/b", "http://a.example/c", 2.0);
        tracker.record_javascript_hop("http://a.example/c", "http://a.example/d");
        let result = tracker.finalize("http://a.example/d", 200);
        assert!(!result.has_mixed_types);
        assert_eq!(result.redirect_count, 3);
    }

    #[test]
    fn test_https_upgrade_flag() {
        let tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        let result = tracker.finalize("https://b.example/", 200);
        assert!(result.https_upgrade);
        assert!(result.domain_changes);

        let tracker = ChainTracker::new("https://a.example/", StrategyTag::Static);
        let result = tracker.finalize("https://a.example/done", 200);
        assert!(!result.https_upgrade);
        assert!(!result.domain_changes);
    }

    #[test]
    fn test_downgrade_is_not_an_upgrade() {
        let tracker = ChainTracker::new("https://a.example/", StrategyTag::Static);
        let result = tracker.finalize("http://a.example/", 200);
        assert!(!result.https_upgrade);
    }

    #[test]
    fn test_visited_ignores_fragment_and_host_case() {
        let mut tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        assert!(!tracker.mark_visited("http://A.Example/path#top"));
        assert!(tracker.mark_visited("http://a.example/path#bottom"));
        assert!(tracker.mark_visited("http://a.example/path"));
    }

    #[test]
    fn test_visited_keeps_query_significant() {
        let mut tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        assert!(!tracker.mark_visited("http://a.example/path?page=1"));
        assert!(!tracker.mark_visited("http://a.example/path?page=2"));
        assert!(tracker.mark_visited("http://a.example/path?page=1"));
    }

    #[test]
    fn test_visited_keeps_port_significant() {
        let mut tracker = ChainTracker::new("http://a.example/", StrategyTag::Static);
        assert!(!tracker.mark_visited("http://a.example:8080/path"));
        assert!(!tracker.mark_visited("http://a.example:9090/path"));
    }

    #[test]
    fn test_unparsable_urls_compare_as_trimmed_strings() {
        assert_eq!(normalize_for_visit("  NOT A URL  "), "not a url");
    }
}
