use serde::Deserialize;

/// How the client address is resolved for logs
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientIpConfig {
    /// Number of trusted proxy hops in `X-Forwarded-For`
    ///
    /// Unset takes the left-most entry. Zero ignores forwarding headers
    /// and uses the peer address.
    #[serde(default)]
    pub trusted_hops: Option<usize>,
}
