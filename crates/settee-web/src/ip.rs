use std::convert::Infallible;
use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use regex_lite::Regex;
use settee_util::Lazy;
use tracing::debug;

/// Returned when no address information is available at all.
pub const LOOPBACK_IP: &str = "127.0.0.1";

/// Returned when the address source holds something that is not an IPv4
/// address, as some proxies and devices send.
pub const FALLBACK_IP: &str = "10.0.0.1";

const FORWARDED_FOR: &str = "x-forwarded-for";

static IP_RE: Lazy<Regex> = Lazy::new();

fn ip_re() -> &'static Regex {
    IP_RE.get_or_init(|| {
        Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("IP pattern is valid")
    })
}

/// Best-effort client IPv4 address.
///
/// Prefers `X-Forwarded-For` (taking the leading address of a
/// comma-separated proxy chain), then the peer address. This is not a
/// validating parser: octets above 255 pass.
pub fn get_ip(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let raw = forwarded
        .or_else(|| remote_addr.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| LOOPBACK_IP.to_string());

    match ip_re().find(&raw) {
        Some(m) => m.as_str().to_string(),
        None => {
            debug!(raw = %raw, "no IPv4 address in client address source");
            FALLBACK_IP.to_string()
        }
    }
}

/// Extractor yielding [`get_ip`] for the current request.
///
/// Reads the peer address from `ConnectInfo<SocketAddr>` when the server
/// was started with connect info.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIp(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(get_ip(&parts.headers, remote)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request};
    use axum::routing::get;
    use axum::Router;
    use tower::util::ServiceExt;

    fn forwarded(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn peer() -> Option<SocketAddr> {
        Some("192.168.1.9:5555".parse().unwrap())
    }

    #[test]
    fn forwarded_header_wins() {
        assert_eq!(get_ip(&forwarded("203.0.113.7"), peer()), "203.0.113.7");
    }

    #[test]
    fn first_address_of_proxy_chain() {
        assert_eq!(
            get_ip(&forwarded("203.0.113.7, 10.1.1.1, 10.2.2.2"), None),
            "203.0.113.7"
        );
    }

    #[test]
    fn falls_back_to_peer_then_loopback() {
        assert_eq!(get_ip(&HeaderMap::new(), peer()), "192.168.1.9");
        assert_eq!(get_ip(&HeaderMap::new(), None), LOOPBACK_IP);
        assert_eq!(get_ip(&forwarded(""), peer()), "192.168.1.9");
    }

    #[test]
    fn garbage_yields_fallback() {
        assert_eq!(get_ip(&forwarded("unknown"), peer()), FALLBACK_IP);
        assert_eq!(get_ip(&forwarded("x 1.2.3.4"), None), FALLBACK_IP);
        let v6: SocketAddr = "[::1]:80".parse().unwrap();
        assert_eq!(get_ip(&HeaderMap::new(), Some(v6)), FALLBACK_IP);
    }

    #[test]
    fn does_not_validate_octets() {
        assert_eq!(get_ip(&forwarded("999.1.1.1"), None), "999.1.1.1");
    }

    #[tokio::test]
    async fn extractor_reads_request_headers() {
        let app = Router::new().route("/ip", get(|ClientIp(ip): ClientIp| async move { ip }));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ip")
                    .header(FORWARDED_FOR, "198.51.100.4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"198.51.100.4");
    }
}
