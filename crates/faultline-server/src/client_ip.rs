use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use faultline_config::ClientIpConfig;
use http::{Extensions, HeaderMap};

/// Resolve the client address reported in logs
///
/// Checks `X-Forwarded-For`, then `X-Real-IP`, then the peer address
/// recorded by `ConnectInfo`. Forwarding headers are skipped when the
/// configuration trusts zero hops. Returns an empty string when nothing
/// is known.
pub fn resolve(headers: &HeaderMap, extensions: &Extensions, config: &ClientIpConfig) -> String {
    if config.trusted_hops != Some(0) {
        if let Some(ip) = forwarded_for(headers, config.trusted_hops) {
            return ip;
        }

        if let Some(real_ip) = headers.get("x-real-ip")
            && let Ok(val) = real_ip.to_str()
            && !val.trim().is_empty()
        {
            return val.trim().to_string();
        }
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

fn forwarded_for(headers: &HeaderMap, trusted_hops: Option<usize>) -> Option<String> {
    let value = headers.get("x-forwarded-for")?.to_str().ok()?;
    let entries: Vec<&str> = value.split(',').map(str::trim).filter(|e| !e.is_empty()).collect();

    // Each trusted proxy appends one entry, so the client sits `hops` from the end
    let entry = match trusted_hops {
        Some(hops) => entries
            .len()
            .checked_sub(hops)
            .and_then(|index| entries.get(index))
            .or_else(|| entries.first()),
        None => entries.first(),
    };

    entry.map(|e| (*e).to_string())
}
