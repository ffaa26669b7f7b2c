//! Client address resolution.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

/// Resolve the caller's address.
///
/// Behind a trusted proxy the first `x-forwarded-for` hop wins, then
/// `x-real-ip`. Otherwise, and when neither header is set, the socket peer is
/// used. IPv4-mapped IPv6 peers are reported in dotted form.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> Option<String> {
    if trust_proxy_headers && let Some(ip) = forwarded_ip(headers) {
        return Some(ip);
    }
    peer.map(|addr| match addr.ip() {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map_or_else(|| v6.to_string(), |v4| v4.to_string()),
        IpAddr::V4(v4) => v4.to_string(),
    })
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    real_ip.map(str::to_string)
}
