#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::error::Error;

use args::Args;
use axum::Router;
use clap::Parser;
use faultline_config::Config;
use faultline_server::Server;
use faultline_telemetry::{Fields, Logger};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }

    // Initialize logging
    let logger = faultline_telemetry::init(&config.logging)?;

    logger.info(
        "starting faultline",
        Fields::new().with("config_path", args.config.display().to_string()),
    );

    let server = Server::new(&config, logger.clone(), Router::new());

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    let signal_logger = logger.clone();

    tokio::spawn(async move {
        shutdown_signal(&signal_logger).await;
        shutdown_clone.cancel();
    });

    // Run server
    if let Err(e) = server.serve(shutdown).await {
        let error: &(dyn Error + 'static) = e.as_ref();
        logger.fatal_on_error(Some(error), "server failed", Fields::new());
    }

    logger.info("faultline stopped", Fields::new());
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal(logger: &Logger) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger.log_on_error(Some(&e), "failed to install Ctrl+C handler", Fields::new());
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                logger.log_on_error(Some(&e), "failed to install SIGTERM handler", Fields::new());
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    logger.info("shutdown signal received", Fields::new());
}
