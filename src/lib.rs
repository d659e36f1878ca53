//! hopcheck resolves full redirect chains.
//!
//! Given a seed URL, the resolver follows every hop to the final
//! destination, recording server-issued redirects (301, 302, 303, 307,
//! 308), meta-refresh tags, and literal JavaScript navigations along the
//! way. Chains that loop or exceed the hop cap come back as ordinary
//! results with the corresponding flags set. Known affiliate links are
//! refused up front so no tracked click ever fires.
//!
//! Two strategies are available: the default static engine probes with a
//! manual-redirect HTTP client and scans HTML sources, while the rendered
//! engine (behind the `browser` feature) drives headless Chromium and
//! observes the navigations it performs.
//!
//! ```no_run
//! use std::sync::Arc;
//! use hopcheck::{resolve_url, Config, ProcessingStats, ResolveRequest, ResolverContext};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let client = hopcheck::initialization::init_probe_client(&config)?;
//! let ctx = ResolverContext::new(client, Arc::new(ProcessingStats::new()));
//! let result = resolve_url(&ctx, &ResolveRequest::new("https://example.com")).await?;
//! println!("{} ended at {}", result.original_url, result.final_url);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod error_handling;
pub mod initialization;
mod output;
pub mod resolve;
mod runner;

pub use config::{Config, FailOn, LogFormat, LogLevel, ProbeMethod, Strategy};
pub use error_handling::{
    ErrorType, InfoType, InitializationError, ProcessingStats, ResolveError, WarningType,
};
pub use output::{print_pretty, ResultWriter};
pub use resolve::types::{
    BlockedInfo, ChainResult, Hop, HopKind, ResolveRequest, StrategyTag,
};
pub use resolve::{resolve_url, ChainResolver, RenderedChainResolver, ResolverContext};
pub use runner::{input_is_url, run, RunReport};
