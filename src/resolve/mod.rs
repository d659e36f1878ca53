//! Redirect-chain resolution.
//!
//! [`resolve_url`] is the single entry point. Every request passes the
//! affiliate gate first; clean URLs are then dispatched to the static
//! walker or the browser-backed renderer according to the request
//! strategy. Both engines produce the same [`types::ChainResult`] shape.

use reqwest::Client;
use std::sync::Arc;

use crate::config::Strategy;
use crate::error_handling::{InfoType, ProcessingStats, ResolveError};

pub mod affiliate;
pub mod content;
mod http;
pub mod rendered;
mod tracker;
pub mod types;
mod walk;

pub use rendered::RenderedChainResolver;
pub use walk::ChainResolver;

use types::{ChainResult, ResolveRequest};

/// Shared resolution machinery for one run.
pub struct ResolverContext {
    /// Outcome counters shared with every component.
    pub stats: Arc<ProcessingStats>,
    walker: ChainResolver,
    renderer: Option<Arc<RenderedChainResolver>>,
}

impl ResolverContext {
    /// Creates a context that can serve static resolutions.
    pub fn new(client: Arc<Client>, stats: Arc<ProcessingStats>) -> Self {
        ResolverContext {
            walker: ChainResolver::new(client, Arc::clone(&stats)),
            stats,
            renderer: None,
        }
    }

    /// Attaches a launched browser so rendered requests can be served.
    pub fn with_renderer(mut self, renderer: Arc<RenderedChainResolver>) -> Self {
        self.renderer = Some(renderer);
        self
    }
}

/// Resolves one URL to its full redirect chain.
///
/// Known affiliate links are answered with a synthetic blocked result
/// before any network or browser activity. Requests asking for the
/// rendered strategy fail with a session error when no renderer is
/// attached to the context.
pub async fn resolve_url(
    ctx: &ResolverContext,
    request: &ResolveRequest,
) -> Result<ChainResult, ResolveError> {
    if let Some(matched) = affiliate::classify(&request.url) {
        log::info!(
            "Blocking {} ({} pattern {:?})",
            request.url,
            matched.service,
            matched.pattern
        );
        ctx.stats.increment_info(InfoType::AffiliateBlocked);
        return Ok(affiliate::blocked_result(&request.url, &matched));
    }

    match request.strategy {
        Strategy::Static => ctx.walker.resolve(request).await,
        Strategy::Rendered => match &ctx.renderer {
            Some(renderer) => renderer.resolve(request).await,
            None => Err(ResolveError::RenderSession {
                url: request.url.clone(),
                message: "no renderer attached to this run".to_string(),
            }),
        },
    }
}
