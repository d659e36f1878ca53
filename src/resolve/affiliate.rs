//! Affiliate-link gate.
//!
//! Dereferencing affiliate links registers clicks and can credit
//! commissions, so known affiliate URLs are refused before any network
//! activity. The gate answers with a synthetic blocked result instead.
//!
//! Matching is plain case-insensitive substring search over a curated
//! pattern table. URLs that merely mention an affiliate domain in a query
//! parameter will match too; that tradeoff is accepted in favor of never
//! firing a tracked click.

use crate::config::constants::AFFILIATE_BLOCKED_STATUS;
use crate::resolve::types::{BlockedInfo, ChainResult, Hop, HopKind, StrategyTag};

/// One affiliate network: its URL fingerprints and where to send users
/// instead.
struct AffiliateRule {
    patterns: &'static [&'static str],
    service: &'static str,
    suggested_url: &'static str,
}

/// Known affiliate networks, checked in order. Patterns are lowercase;
/// candidate URLs are lowercased before matching.
const AFFILIATE_RULES: &[AffiliateRule] = &[
    AffiliateRule {
        patterns: &["amzn.to", "amazon-adsystem.com", "assoc-redirect.amazon"],
        service: "Amazon Associates",
        suggested_url: "https://www.amazon.com/",
    },
    AffiliateRule {
        patterns: &["go.skimresources.com", "go.redirectingat.com"],
        service: "Skimlinks",
        suggested_url: "https://skimlinks.com/",
    },
    AffiliateRule {
        patterns: &["shareasale.com/r.cfm", "shareasale-analytics.com"],
        service: "ShareASale",
        suggested_url: "https://www.shareasale.com/",
    },
    AffiliateRule {
        patterns: &[
            "anrdoezrs.net",
            "jdoqocy.com",
            "tkqlhce.com",
            "dpbolvw.net",
            "kqzyfj.com",
        ],
        service: "CJ Affiliate",
        suggested_url: "https://www.cj.com/",
    },
    AffiliateRule {
        patterns: &["click.linksynergy.com", "linksynergy.walmart.com"],
        service: "Rakuten Advertising",
        suggested_url: "https://rakutenadvertising.com/",
    },
    AffiliateRule {
        patterns: &["hop.clickbank.net"],
        service: "ClickBank",
        suggested_url: "https://www.clickbank.com/",
    },
    AffiliateRule {
        patterns: &["awin1.com"],
        service: "Awin",
        suggested_url: "https://www.awin.com/",
    },
    AffiliateRule {
        patterns: &["prf.hn", "pxf.io", "sjv.io"],
        service: "Impact",
        suggested_url: "https://impact.com/",
    },
    AffiliateRule {
        patterns: &["rover.ebay.com", "ebay.us/"],
        service: "eBay Partner Network",
        suggested_url: "https://www.ebay.com/",
    },
    AffiliateRule {
        patterns: &["s.click.aliexpress.com"],
        service: "AliExpress Affiliates",
        suggested_url: "https://www.aliexpress.com/",
    },
];

/// A positive gate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffiliateMatch {
    /// The affiliate network that matched.
    pub service: &'static str,
    /// A non-affiliate landing page for the same service.
    pub suggested_url: &'static str,
    /// The pattern that fired, for log lines.
    pub pattern: &'static str,
}

/// Checks a URL against the affiliate pattern table.
///
/// Returns the first matching network, or `None` when the URL is safe to
/// dereference.
pub fn classify(url: &str) -> Option<AffiliateMatch> {
    let lowered = url.to_ascii_lowercase();
    for rule in AFFILIATE_RULES {
        for pattern in rule.patterns {
            if lowered.contains(pattern) {
                return Some(AffiliateMatch {
                    service: rule.service,
                    suggested_url: rule.suggested_url,
                    pattern,
                });
            }
        }
    }
    None
}

/// Builds the synthetic result for a blocked URL.
///
/// The chain consists of a single terminal hop carrying a 403 status that
/// was never observed on the wire. No request is made for blocked URLs.
pub fn blocked_result(url: &str, matched: &AffiliateMatch) -> ChainResult {
    let hop = Hop {
        source_url: url.to_string(),
        kind: HopKind::Final,
        target_url: None,
        status_code: Some(AFFILIATE_BLOCKED_STATUS),
        delay_seconds: None,
        sequence: 1,
    };
    ChainResult {
        original_url: url.to_string(),
        final_url: url.to_string(),
        final_status_code: AFFILIATE_BLOCKED_STATUS,
        hops: vec![hop],
        redirect_count: 0,
        has_loop: false,
        has_mixed_types: false,
        domain_changes: false,
        https_upgrade: false,
        strategy: StrategyTag::AffiliateBlocked,
        blocked: Some(BlockedInfo {
            blocked_reason: format!(
                "{} links are not dereferenced to avoid firing tracked clicks",
                matched.service
            ),
            affiliate_service: matched.service.to_string(),
            suggested_direct_url: matched.suggested_url.to_string(),
        }),
    }
}
