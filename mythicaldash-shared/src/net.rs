/// Client IP resolution behind reverse proxies
///
/// MythicalDash is usually deployed behind Cloudflare or a local reverse proxy,
/// so the socket peer address is rarely the real client. The resolver checks
/// the proxy headers in order of trust:
///
/// 1. `CF-Connecting-IP`, only when `CF-Ray` is present (request went through Cloudflare)
/// 2. First entry of `X-Forwarded-For`
/// 3. `X-Real-IP`
/// 4. The socket peer address
///
/// Header values that don't parse as an IP address are skipped.

use std::net::{IpAddr, SocketAddr};

/// Fallback when no source yields an address
pub const UNKNOWN_IP: &str = "0.0.0.0";

/// Minimal header view so the resolver works with any HTTP stack
pub trait HeaderLookup {
    /// Returns the header value as a string, if present and valid UTF-8
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderLookup for axum::http::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }
}

impl HeaderLookup for std::collections::HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Resolves the client IP address for audit logging
///
/// # Example
///
/// ```
/// use mythicaldash_shared::net::client_ip;
/// use std::collections::HashMap;
///
/// let mut headers = HashMap::new();
/// headers.insert("X-Forwarded-For".to_string(), "203.0.113.7, 10.0.0.1".to_string());
///
/// assert_eq!(client_ip(&headers, None), "203.0.113.7");
/// ```
pub fn client_ip<H: HeaderLookup>(headers: &H, peer: Option<SocketAddr>) -> String {
    resolve(headers, peer)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

fn resolve<H: HeaderLookup>(headers: &H, peer: Option<SocketAddr>) -> Option<IpAddr> {
    if headers.header("cf-ray").is_some() {
        if let Some(ip) = headers.header("cf-connecting-ip").and_then(parse_ip) {
            return Some(ip);
        }
    }

    if let Some(ip) = headers
        .header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(parse_ip)
    {
        return Some(ip);
    }

    if let Some(ip) = headers.header("x-real-ip").and_then(parse_ip) {
        return Some(ip);
    }

    peer.map(|addr| addr.ip())
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}
