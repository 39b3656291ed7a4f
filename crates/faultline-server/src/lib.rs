//! HTTP and persistent-connection error handling for Faultline
//!
//! [`Server`] wraps a caller's routes with the request logger and the error
//! boundary. The pieces are also usable on their own as axum middleware.
#![allow(clippy::must_use_candidate)]

mod boundary;
mod capture;
mod channel;
pub mod client_ip;
mod errors;
mod health;
mod request_log;

use std::net::SocketAddr;

use axum::Router;
use faultline_config::Config;
use faultline_telemetry::{Fields, Logger};
use tokio_util::sync::CancellationToken;

pub use boundary::{ResponseCommitted, error_boundary};
pub use capture::{CapturedBody, capture_prefix};
pub use channel::{FrameError, FrameSink, PROTOCOL, report_channel_error};
pub use errors::{ErrorSlot, HandlerError};
pub use request_log::{REDACTED, RequestLogState, request_log};

/// Assembled server with routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    logger: Logger,
}

impl Server {
    /// Wrap `routes` with the configured middleware stack
    pub fn new(config: &Config, logger: Logger, routes: Router) -> Self {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        app = app.merge(routes);

        // Apply middleware layers (innermost first)

        // Error boundary (innermost, turns recorded errors into the response)
        let boundary_logger = logger.clone();
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let logger = boundary_logger.clone();
            async move { boundary::error_boundary(logger, req, next).await }
        }));

        // Request logging (sees the final status and every recorded error)
        if config.request_log.enabled {
            let state = RequestLogState::new(
                logger.clone(),
                config.request_log.clone(),
                config.server.client_ip.clone(),
            );
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let state = state.clone();
                async move { request_log::request_log(state, req, next).await }
            }));
        }

        Self {
            router: app,
            listen_address,
            logger,
        }
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        self.logger
            .info("server listening", Fields::new().with("address", local_addr.to_string()));

        let logger = self.logger.clone();
        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                logger.info("graceful shutdown initiated", Fields::new());
            })
            .await?;

        Ok(())
    }
}
