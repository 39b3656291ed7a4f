use std::path::Path;

use crate::{Config, LogOutput};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Expands `{{ env.VAR }}` placeholders before parsing and validates
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a placeholder cannot be
    /// resolved, the TOML is malformed, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if a placeholder cannot be resolved, the TOML is
    /// malformed, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_log.body_limit == 0 {
            anyhow::bail!("request_log.body_limit must be greater than 0");
        }

        if let LogOutput::File { ref path } = self.logging.output
            && path.as_os_str().is_empty()
        {
            anyhow::bail!("logging.output.path must not be empty");
        }

        if self.server.health.enabled && !self.server.health.path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/'");
        }

        Ok(())
    }
}
