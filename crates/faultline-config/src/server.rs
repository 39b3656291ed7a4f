use std::net::SocketAddr;

use serde::Deserialize;

use crate::{client_ip::ClientIpConfig, health::HealthConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub client_ip: ClientIpConfig,
}
