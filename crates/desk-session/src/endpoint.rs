//! Connection URL resolution.
//!
//! The dashboard runs in two topologies: local development, where the UI is
//! served from a dev-server origin and the trading backend listens on a
//! separate local port, and deployed, where the backend shares the UI's
//! origin behind one reverse proxy. The resolver picks the right WebSocket
//! URL from the configured origin alone.

use thiserror::Error;
use url::Url;

/// WebSocket route on the trading server.
const WS_PATH: &str = "/ws";

/// Endpoint resolution failures.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The configured origin is not a parsable URL.
    #[error("invalid origin {origin:?}: {source}")]
    InvalidOrigin {
        /// The origin string as configured.
        origin: String,
        /// Parse failure detail.
        source: url::ParseError,
    },
    /// The configured origin uses a scheme with no WebSocket mapping.
    #[error("origin {origin:?} has unsupported scheme {scheme:?}")]
    UnsupportedScheme {
        /// The origin string as configured.
        origin: String,
        /// The offending scheme.
        scheme: String,
    },
}

/// Resolve the WebSocket URL for a configured origin.
///
/// Loopback origins are treated as local development: the connection goes to
/// `ws://127.0.0.1:{local_port}/ws` regardless of the origin's own port,
/// because the dev server and the backend listen separately. Any other
/// origin maps scheme-for-scheme (`https` → `wss`, `http` → `ws`) on the
/// same host and port.
pub fn resolve_ws_url(origin: &str, local_port: u16) -> Result<String, EndpointError> {
    let parsed = Url::parse(origin).map_err(|source| EndpointError::InvalidOrigin {
        origin: origin.to_string(),
        source,
    })?;

    let scheme = match parsed.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(EndpointError::UnsupportedScheme {
                origin: origin.to_string(),
                scheme: other.to_string(),
            });
        }
    };

    let host = parsed.host_str().unwrap_or_default();
    if is_loopback_host(host) {
        return Ok(format!("ws://127.0.0.1:{local_port}{WS_PATH}"));
    }

    let mut url = format!("{scheme}://{host}");
    if let Some(port) = parsed.port() {
        url.push_str(&format!(":{port}"));
    }
    url.push_str(WS_PATH);
    Ok(url)
}

fn is_loopback_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn localhost_origin_targets_local_port() {
        let url = resolve_ws_url("http://localhost:5173", 8000).unwrap();
        assert_eq!(url, "ws://127.0.0.1:8000/ws");
    }

    #[test]
    fn loopback_ip_origin_targets_local_port() {
        let url = resolve_ws_url("http://127.0.0.1:5173", 9001).unwrap();
        assert_eq!(url, "ws://127.0.0.1:9001/ws");
    }

    #[test]
    fn https_origin_maps_to_wss_same_host() {
        let url = resolve_ws_url("https://desk.example.com", 8000).unwrap();
        assert_eq!(url, "wss://desk.example.com/ws");
    }

    #[test]
    fn http_origin_maps_to_ws_with_port() {
        let url = resolve_ws_url("http://desk.example.com:8080", 8000).unwrap();
        assert_eq!(url, "ws://desk.example.com:8080/ws");
    }

    #[test]
    fn garbage_origin_is_invalid() {
        assert_matches!(
            resolve_ws_url("not a url", 8000),
            Err(EndpointError::InvalidOrigin { .. })
        );
    }

    #[test]
    fn file_scheme_is_unsupported() {
        assert_matches!(
            resolve_ws_url("file:///tmp/x", 8000),
            Err(EndpointError::UnsupportedScheme { scheme, .. }) => assert_eq!(scheme, "file")
        );
    }
}
