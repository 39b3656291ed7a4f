//! Logging for Faultline
//!
//! A [`Logger`] is a cloneable handle to a structured sink that writes one
//! JSON object per line. It is built once per process through [`init`] and
//! then handed to every component that logs.
#![allow(clippy::must_use_candidate)]

mod fields;
mod layer;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
mod writer;

use std::error::Error;
use std::sync::{Mutex, PoisonError};

use faultline_config::{LogLevel, LoggingConfig};
use faultline_core::{Classification, classify};
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;

pub use fields::Fields;
pub use layer::JsonLineLayer;

/// Target used for records emitted through a [`Logger`]
pub const LOG_TARGET: &str = "faultline";

/// Process-wide logger, set by the first successful [`init`]
static GLOBAL: Mutex<Option<Logger>> = Mutex::new(None);

/// Handle to a structured log sink
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// Build a logger for the configured destination and level
    ///
    /// The logger is not installed globally; see [`init`] for that.
    ///
    /// # Errors
    ///
    /// Returns an error if the output destination cannot be opened
    pub fn from_config(config: &LoggingConfig) -> anyhow::Result<Self> {
        let make_writer = writer::make_writer(&config.output)?;
        Ok(Self::with_writer(config.level, make_writer))
    }

    /// Build a logger writing to a custom destination
    pub fn with_writer<W>(level: LogLevel, make_writer: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::registry()
            .with(level_filter(level))
            .with(JsonLineLayer::new(make_writer));

        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Underlying `tracing` dispatcher
    pub const fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn trace(&self, message: &str, fields: Fields) {
        self.emit(LogLevel::Trace, message, &fields);
    }

    pub fn debug(&self, message: &str, fields: Fields) {
        self.emit(LogLevel::Debug, message, &fields);
    }

    pub fn info(&self, message: &str, fields: Fields) {
        self.emit(LogLevel::Info, message, &fields);
    }

    pub fn warn(&self, message: &str, fields: Fields) {
        self.emit(LogLevel::Warn, message, &fields);
    }

    pub fn error(&self, message: &str, fields: Fields) {
        self.emit(LogLevel::Error, message, &fields);
    }

    /// Log at fatal severity, then terminate the process
    ///
    /// The record is emitted as an error event marked `fatal: true`, which
    /// [`JsonLineLayer`] writes with level `fatal`.
    pub fn fatal(&self, message: &str, fields: Fields) -> ! {
        self.emit(LogLevel::Error, message, &fields.with(layer::FATAL_KEY, true));
        std::process::exit(1)
    }

    /// Log `error` at error severity; does nothing when it is `None`
    ///
    /// Classified errors also contribute their app code and public message.
    pub fn log_on_error(&self, error: Option<&(dyn Error + 'static)>, message: &str, fields: Fields) {
        let Some(error) = error else {
            return;
        };

        self.error(message, error_fields("error", error).merged(fields));
    }

    /// Log `error` and terminate the process; does nothing when it is `None`
    pub fn fatal_on_error(&self, error: Option<&(dyn Error + 'static)>, message: &str, fields: Fields) {
        let Some(error) = error else {
            return;
        };

        self.fatal(message, error_fields("fatal_error", error).merged(fields));
    }

    fn emit(&self, level: LogLevel, message: &str, fields: &Fields) {
        tracing::dispatcher::with_default(&self.dispatch, || match level {
            LogLevel::Trace => tracing::trace!(target: LOG_TARGET, fields = %fields, "{message}"),
            LogLevel::Debug => tracing::debug!(target: LOG_TARGET, fields = %fields, "{message}"),
            LogLevel::Info => tracing::info!(target: LOG_TARGET, fields = %fields, "{message}"),
            LogLevel::Warn => tracing::warn!(target: LOG_TARGET, fields = %fields, "{message}"),
            LogLevel::Error => tracing::error!(target: LOG_TARGET, fields = %fields, "{message}"),
        });
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

fn error_fields(key: &str, error: &(dyn Error + 'static)) -> Fields {
    let fields = Fields::new().with(key, error.to_string());

    match classify(error) {
        Classification::Classified(classified) => fields
            .with("app_code", classified.app_code())
            .with("public_message", classified.message()),
        Classification::Unclassified(_) => fields,
    }
}

const fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
    }
}

/// Initialize the process-wide logger
///
/// The first call builds the logger from `config` and installs it as the
/// global `tracing` dispatcher. Every later call returns that same logger
/// and ignores its `config`.
///
/// # Errors
///
/// Returns an error if the first call cannot open the output destination
pub fn init(config: &LoggingConfig) -> anyhow::Result<Logger> {
    let mut global = GLOBAL.lock().unwrap_or_else(PoisonError::into_inner);

    if let Some(logger) = global.as_ref() {
        return Ok(logger.clone());
    }

    let logger = Logger::from_config(config)?;

    // Only the first install per process succeeds; after a test reset the
    // rebuilt logger is reachable through `global()` and its handle.
    if tracing::dispatcher::set_global_default(logger.dispatch.clone()).is_err() {
        tracing::debug!("global tracing dispatcher already installed");
    }

    *global = Some(logger.clone());
    Ok(logger)
}

/// The process-wide logger, if [`init`] has run
pub fn global() -> Option<Logger> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Forget the process-wide logger so the next [`init`] builds a new one
#[cfg(any(test, feature = "test-util"))]
pub fn reset_for_test() {
    *GLOBAL.lock().unwrap_or_else(PoisonError::into_inner) = None;
}
