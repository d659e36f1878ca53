//! Seed URL validation and normalization.

use log::warn;

use crate::config::constants::MAX_URL_LENGTH;

/// Validates a seed URL and normalizes it for resolution.
///
/// Bare hostnames get an `https://` prefix. Inputs that exceed the length
/// cap, do not parse, or use a non-HTTP scheme are rejected with a
/// warning.
///
/// # Arguments
///
/// * `url` - The raw seed as read from the CLI or a list file.
///
/// # Returns
///
/// `Some(normalized)` when the URL should be resolved, `None` otherwise.
pub fn validate_and_normalize_url(url: &str) -> Option<String> {
    if url.len() > MAX_URL_LENGTH {
        let preview: String = url.chars().take(48).collect();
        warn!(
            "Skipping over-long URL ({} > {} bytes): {}...",
            url.len(),
            MAX_URL_LENGTH,
            preview
        );
        return None;
    }

    let normalized = if !url.starts_with("http://") && !url.starts_with("https://") {
        format!("https://{url}")
    } else {
        url.to_string()
    };

    // The prefix can push a borderline input over the cap.
    if normalized.len() > MAX_URL_LENGTH {
        warn!(
            "Skipping URL that exceeds the length cap after normalization ({} bytes)",
            normalized.len()
        );
        return None;
    }

    match url::Url::parse(&normalized) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => Some(normalized),
            other => {
                warn!("Skipping URL with unsupported scheme {other:?}: {url}");
                None
            }
        },
        Err(_) => {
            warn!("Skipping invalid URL: {url}");
            None
        }
    }
}
