use serde::Deserialize;

/// Default cap on the captured request body prefix (16 KiB)
pub const DEFAULT_BODY_LIMIT: usize = 16 * 1024;

/// Structured request logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestLogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of body bytes copied into the log record
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
    #[serde(default = "default_true")]
    pub log_headers: bool,
    #[serde(default = "default_true")]
    pub log_cookies: bool,
    /// Header names whose values are replaced with `[redacted]`
    #[serde(default = "default_redacted_headers")]
    pub redacted_headers: Vec<String>,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            body_limit: DEFAULT_BODY_LIMIT,
            log_headers: true,
            log_cookies: true,
            redacted_headers: default_redacted_headers(),
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_body_limit() -> usize {
    DEFAULT_BODY_LIMIT
}

fn default_redacted_headers() -> Vec<String> {
    vec!["authorization".to_string(), "proxy-authorization".to_string()]
}
