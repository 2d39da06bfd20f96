//! Rate limiting using governor and `tower_governor`.
//!
//! - `strict_rate_limiter`: sign-in and payment endpoints (~10/min)
//! - `relaxed_rate_limiter`: cart, saved, wizard and other mutations (~100/min)

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Cloudflare's real client IP header, checked first.
const CF_CONNECTING_IP: &str = "cf-connecting-ip";

/// Single-IP proxy headers checked after `X-Forwarded-For`.
const FALLBACK_IP_HEADERS: &[&str] = &["x-real-ip", "fly-client-ip"];

/// Key extractor reading the client IP from proxy headers.
///
/// `X-Forwarded-For` contributes its first hop.
#[derive(Clone, Copy)]
pub struct ProxyIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let header_ip = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        if let Some(ip) = header_ip(CF_CONNECTING_IP) {
            return Ok(ip);
        }

        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        FALLBACK_IP_HEADERS
            .iter()
            .find_map(|name| header_ip(name))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(per_second: u64, burst: u32) -> Option<RateLimiterLayer> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(per_second)
        .burst_size(burst)
        .finish()?;
    Some(GovernorLayer::new(Arc::new(config)))
}

/// Strict limiter: 1 token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Never panics: the period and burst are non-zero constants.
#[must_use]
#[allow(clippy::expect_used)]
pub fn strict_rate_limiter() -> RateLimiterLayer {
    limiter(6, 5).expect("non-zero rate limiter config")
}

/// Relaxed limiter: 1 token per second, burst of 50.
///
/// # Panics
///
/// Never panics: the period and burst are non-zero constants.
#[must_use]
#[allow(clippy::expect_used)]
pub fn relaxed_rate_limiter() -> RateLimiterLayer {
    limiter(1, 50).expect("non-zero rate limiter config")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/cart/add");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let req = request(&[
            ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        let ip = ProxyIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip.to_string(), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let req = request(&[("x-forwarded-for", "198.51.100.4, 10.0.0.2")]);
        assert_eq!(
            ProxyIpKeyExtractor.extract(&req).unwrap().to_string(),
            "198.51.100.4"
        );
    }

    #[test]
    fn test_no_headers_is_error() {
        assert!(ProxyIpKeyExtractor.extract(&request(&[])).is_err());
    }
}
