//! HTTP client setup.

use reqwest::{redirect, Client, ClientBuilder};
use std::sync::Arc;

use crate::config::constants::HOP_TIMEOUT;
use crate::config::Config;
use crate::error_handling::InitializationError;

/// Builds the shared HTTP client used for redirect-hop probes.
///
/// Automatic redirect following is disabled so each 3xx response surfaces
/// as an observation instead of being consumed inside the client. Every
/// hop is dereferenced explicitly by the resolver.
///
/// # Arguments
/// * `config` - Runtime configuration supplying the User-Agent string.
///
/// # Returns
/// A shareable client, or an [`InitializationError`] if the builder
/// rejects the configuration.
pub fn init_probe_client(config: &Config) -> Result<Arc<Client>, InitializationError> {
    let client = ClientBuilder::new()
        .redirect(redirect::Policy::none())
        .timeout(HOP_TIMEOUT)
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}
