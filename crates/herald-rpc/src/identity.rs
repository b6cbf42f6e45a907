// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caller identity for rate limiting.

use http::HeaderMap;

/// Identifier used when no forwarding header names the client.
pub const FALLBACK_IDENTIFIER: &str = "127.0.0.1";

/// Derive the rate-limit identifier from request headers.
///
/// Checked in order: the first hop of `x-forwarded-for`, then `x-real-ip`,
/// then [`FALLBACK_IDENTIFIER`]. Blank values are skipped. Never fails and
/// never returns an empty string.
pub fn extract_identifier(headers: &HeaderMap) -> String {
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| header_str(headers, "x-real-ip").map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or(FALLBACK_IDENTIFIER)
        .to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn first_forwarded_hop_wins() {
        let h = headers(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1, 10.0.0.2"),
            ("x-real-ip", "198.51.100.1"),
        ]);
        assert_eq!(extract_identifier(&h), "203.0.113.7");
    }

    #[test]
    fn real_ip_used_without_forwarded_for() {
        let h = headers(&[("x-real-ip", "198.51.100.1")]);
        assert_eq!(extract_identifier(&h), "198.51.100.1");
    }

    #[test]
    fn blank_forwarded_for_falls_through() {
        let h = headers(&[("x-forwarded-for", " , 10.0.0.1"), ("x-real-ip", "198.51.100.1")]);
        assert_eq!(extract_identifier(&h), "198.51.100.1");
    }

    #[test]
    fn no_headers_uses_loopback() {
        assert_eq!(extract_identifier(&HeaderMap::new()), FALLBACK_IDENTIFIER);
    }

    #[test]
    fn blank_real_ip_uses_loopback() {
        let h = headers(&[("x-real-ip", "   ")]);
        assert_eq!(extract_identifier(&h), FALLBACK_IDENTIFIER);
    }
}
