#![allow(clippy::must_use_candidate)]

pub mod client_ip;
mod env;
pub mod health;
mod loader;
pub mod logging;
pub mod request_log;
pub mod server;

use serde::Deserialize;

pub use client_ip::*;
pub use health::*;
pub use logging::*;
pub use request_log::*;
pub use server::*;

/// Top-level Faultline configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listener and built-in routes
    #[serde(default)]
    pub server: ServerConfig,
    /// Log sink configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-request log record configuration
    #[serde(default)]
    pub request_log: RequestLogConfig,
}
