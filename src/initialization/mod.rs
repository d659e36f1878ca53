//! Startup wiring: HTTP client and logger construction.

mod client;
mod logger;

pub use client::init_probe_client;
pub use logger::init_logger_with;
