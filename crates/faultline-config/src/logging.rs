use std::path::PathBuf;

use serde::Deserialize;

/// Log sink configuration
///
/// Applied once per process: the first logger built from it wins, later
/// configurations are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum severity that reaches the sink
    #[serde(default)]
    pub level: LogLevel,
    /// Where log lines are written
    #[serde(default)]
    pub output: LogOutput,
}

/// Log severity, parsed case-insensitively
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    serde_with::DeserializeFromStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Destination for log lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Append to a file, creating it if needed
    File { path: PathBuf },
}
