//! Error and outcome classification types.
//!
//! Two layers live here: rich error values ([`InitializationError`],
//! [`ResolveError`]) that travel up through `Result`s, and flat category
//! enums ([`ErrorType`], [`WarningType`], [`InfoType`]) used as counter keys
//! in [`crate::error_handling::ProcessingStats`].

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Errors that can occur while bringing the application up.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Logger initialization error.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// HTTP client build error.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Browser launch error (rendered strategy only).
    #[error("Browser initialization error: {0}")]
    BrowserError(String),
}

/// A failed resolution attempt.
///
/// Only conditions that abort a chain become errors. Loops, hop-cap
/// exhaustion, and affiliate blocks are ordinary results and never appear
/// here; malformed page content is silently ignored by the scanner.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Transport-level failure: DNS, connect, TLS, or timeout.
    #[error("network failure for {url}: {source}")]
    Network {
        /// The URL being dereferenced when the failure occurred.
        url: String,
        /// The underlying transport error.
        #[source]
        source: ReqwestError,
    },

    /// A redirect status arrived without a usable Location header.
    #[error("redirect status {status} from {url} without a Location header")]
    MissingLocation {
        /// The redirect status code.
        status: u16,
        /// The URL that produced the response.
        url: String,
    },

    /// A Location header could not be resolved into an absolute URL.
    #[error("redirect target {location:?} from {url} is not a resolvable URL: {source}")]
    BadLocation {
        /// The URL that produced the response.
        url: String,
        /// The raw Location header value.
        location: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The seed URL itself does not parse.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        /// The rejected input.
        url: String,
        /// The parse failure.
        #[source]
        source: url::ParseError,
    },

    /// The browser session failed before a result could be assembled.
    #[error("render session failed for {url}: {message}")]
    RenderSession {
        /// The URL being rendered.
        url: String,
        /// What went wrong, as reported by the browser layer.
        message: String,
    },
}

impl ResolveError {
    /// Whether this is a transport-level failure that a different probe
    /// method might avoid.
    pub fn is_network(&self) -> bool {
        matches!(self, ResolveError::Network { .. })
    }

    /// The statistics category this error counts against.
    pub fn classify(&self) -> ErrorType {
        match self {
            ResolveError::Network { .. } => ErrorType::Network,
            ResolveError::MissingLocation { .. } | ResolveError::BadLocation { .. } => {
                ErrorType::Protocol
            }
            ResolveError::InvalidUrl { .. } => ErrorType::InvalidSeedUrl,
            ResolveError::RenderSession { .. } => ErrorType::RenderSession,
        }
    }
}

/// Categories of resolution failure, used as statistics keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    /// Transport-level failure: DNS, connect, TLS, or timeout.
    Network,
    /// The remote server violated redirect semantics.
    Protocol,
    /// The seed URL was rejected before any network activity.
    InvalidSeedUrl,
    /// A browser session could not be created or driven.
    RenderSession,
    /// The per-URL wall-clock budget ran out.
    ResolveTimeout,
}

impl ErrorType {
    /// Human-readable label for summary output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Network => "Network error",
            ErrorType::Protocol => "Protocol violation",
            ErrorType::InvalidSeedUrl => "Invalid seed URL",
            ErrorType::RenderSession => "Render session failure",
            ErrorType::ResolveTimeout => "Resolution timeout",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conditions worth flagging that do not fail a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum WarningType {
    /// A response body exceeded the scan size cap and was skipped.
    OversizedBody,
    /// A response body could not be read or was not HTML.
    UnscannableBody,
}

impl WarningType {
    /// Human-readable label for summary output.
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::OversizedBody => "Oversized body skipped",
            WarningType::UnscannableBody => "Unscannable body skipped",
        }
    }
}

/// Notable chain outcomes tracked for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    /// A chain ended on HTTPS after starting on plain HTTP.
    HttpsUpgrade,
    /// A chain ended on a different host than it started on.
    DomainChange,
    /// A chain revisited a URL and was cut short.
    LoopDetected,
    /// A chain hit the redirect cap and was cut short.
    HopCapReached,
    /// A seed URL was blocked by the affiliate gate.
    AffiliateBlocked,
    /// A meta-refresh redirect was followed.
    MetaRefresh,
    /// A JavaScript redirect was followed.
    JavascriptRedirect,
    /// A HEAD probe was retried as GET.
    HeadFallback,
}

impl InfoType {
    /// Human-readable label for summary output.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::HttpsUpgrade => "HTTPS upgrade",
            InfoType::DomainChange => "Domain change",
            InfoType::LoopDetected => "Redirect loop",
            InfoType::HopCapReached => "Hop cap reached",
            InfoType::AffiliateBlocked => "Affiliate link blocked",
            InfoType::MetaRefresh => "Meta-refresh redirect",
            InfoType::JavascriptRedirect => "JavaScript redirect",
            InfoType::HeadFallback => "HEAD retried as GET",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_strings_are_nonempty() {
        for error_type in ErrorType::iter() {
            assert!(!error_type.as_str().is_empty());
        }
    }

    #[test]
    fn test_warning_type_strings_are_nonempty() {
        for warning_type in WarningType::iter() {
            assert!(!warning_type.as_str().is_empty());
        }
    }

    #[test]
    fn test_info_type_strings_are_nonempty() {
        for info_type in InfoType::iter() {
            assert!(!info_type.as_str().is_empty());
        }
    }

    #[test]
    fn test_error_type_display_matches_as_str() {
        assert_eq!(ErrorType::Network.to_string(), ErrorType::Network.as_str());
    }

    #[test]
    fn test_missing_location_classifies_as_protocol() {
        let err = ResolveError::MissingLocation {
            status: 301,
            url: "https://example.com".to_string(),
        };
        assert_eq!(err.classify(), ErrorType::Protocol);
        assert!(!err.is_network());
    }

    #[test]
    fn test_invalid_url_classifies_as_seed_rejection() {
        let err = ResolveError::InvalidUrl {
            url: "not a url".to_string(),
            source: url::Url::parse("not a url").unwrap_err(),
        };
        assert_eq!(err.classify(), ErrorType::InvalidSeedUrl);
    }

    #[test]
    fn test_bad_location_message_includes_target() {
        let err = ResolveError::BadLocation {
            url: "https://example.com".to_string(),
            location: "http://".to_string(),
            source: url::Url::parse("http://").unwrap_err(),
        };
        assert!(err.to_string().contains("http://"));
    }
}
