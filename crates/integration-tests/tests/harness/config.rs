//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use faultline_config::{ClientIpConfig, Config, HealthConfig, RequestLogConfig, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig {
                        enabled: true,
                        ..HealthConfig::default()
                    },
                    ..ServerConfig::default()
                },
                ..Config::default()
            },
        }
    }

    /// Set request log configuration
    pub fn with_request_log(mut self, config: RequestLogConfig) -> Self {
        self.config.request_log = config;
        self
    }

    /// Trust this many proxy hops in `X-Forwarded-For`
    pub fn with_trusted_hops(mut self, hops: usize) -> Self {
        self.config.server.client_ip = ClientIpConfig {
            trusted_hops: Some(hops),
        };
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Disable request logging
    pub fn without_request_log(mut self) -> Self {
        self.config.request_log.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
