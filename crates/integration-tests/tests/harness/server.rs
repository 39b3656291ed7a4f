//! Test server wrapper that starts Faultline on a random port

use std::net::SocketAddr;

use axum::Router;
use faultline_config::{Config, LogLevel};
use faultline_server::Server;
use faultline_telemetry::Logger;
use faultline_telemetry::testing::CapturedLogs;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
    logs: CapturedLogs,
}

impl TestServer {
    /// Start a test server with the given configuration and routes
    ///
    /// Binds to port 0 for automatic port assignment. Everything the
    /// server logs is captured in memory at debug level.
    pub async fn start(config: Config, routes: Router) -> anyhow::Result<Self> {
        Self::start_with(config, |_| routes).await
    }

    /// Start a test server whose routes need the server's logger
    pub async fn start_with<F>(config: Config, routes: F) -> anyhow::Result<Self>
    where
        F: FnOnce(Logger) -> Router,
    {
        let logs = CapturedLogs::new();
        let logger = Logger::with_writer(LogLevel::Debug, logs.clone());
        let server = Server::new(&config, logger.clone(), routes(logger));
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(
                listener,
                server.into_router().into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                shutdown_clone.cancelled().await;
            })
            .await
            .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self {
            addr,
            shutdown,
            client,
            logs,
        })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every log record written so far
    pub fn log_records(&self) -> Vec<Value> {
        self.logs.records()
    }

    /// Log records with the given message
    pub fn logs_with_msg(&self, msg: &str) -> Vec<Value> {
        self.log_records().into_iter().filter(|r| r["msg"] == msg).collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
