use std::net::{Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

use crate::error::ExporterError;

const GRPC_SCHEME: &str = "grpc";
const GRPC_TLS_SCHEME: &str = "grpcs";

/// Extracts the bare host from an announced node address.
///
/// Accepts multiaddrs (`/ip4/1.2.3.4/tcp/8080`, `/dns4/host/tcp/8080/tls`),
/// `grpc://` and `grpcs://` URIs, and plain `host:port` pairs.
pub fn host_without_port(address: &str) -> Result<String, ExporterError> {
    if address.starts_with('/') {
        return multiaddr_host(address);
    }
    if let Some((scheme, _)) = address.split_once("://") {
        if scheme != GRPC_SCHEME && scheme != GRPC_TLS_SCHEME {
            return Err(ExporterError::Address(format!(
                "{address}: unsupported scheme {scheme}"
            )));
        }
        return uri_host(address);
    }
    uri_host(&format!("{GRPC_SCHEME}://{address}"))
}

fn uri_host(uri: &str) -> Result<String, ExporterError> {
    let parsed = Url::parse(uri).map_err(|e| ExporterError::Address(format!("{uri}: {e}")))?;
    match parsed.host() {
        Some(Host::Domain(d)) if !d.is_empty() => Ok(d.to_string()),
        Some(Host::Ipv4(ip)) => Ok(ip.to_string()),
        Some(Host::Ipv6(ip)) => Ok(ip.to_string()),
        _ => Err(ExporterError::Address(format!("{uri}: missing host"))),
    }
}

fn multiaddr_host(address: &str) -> Result<String, ExporterError> {
    let bad = |why: &str| ExporterError::Address(format!("{address}: {why}"));
    let mut parts = address.trim_start_matches('/').split('/');

    let proto = parts.next().ok_or_else(|| bad("empty multiaddr"))?;
    let value = parts.next().ok_or_else(|| bad("missing host value"))?;
    let host = match proto {
        "ip4" => value
            .parse::<Ipv4Addr>()
            .map_err(|_| bad("invalid ip4"))?
            .to_string(),
        "ip6" => value
            .parse::<Ipv6Addr>()
            .map_err(|_| bad("invalid ip6"))?
            .to_string(),
        "dns" | "dns4" | "dns6" if !value.is_empty() => value.to_string(),
        other => return Err(bad(&format!("unsupported network protocol {other}"))),
    };

    match parts.next() {
        Some("tcp") | Some("udp") => {}
        _ => return Err(bad("missing transport protocol")),
    }
    parts
        .next()
        .and_then(|p| p.parse::<u16>().ok())
        .ok_or_else(|| bad("invalid port"))?;

    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_extraction() {
        let cases = [
            ("/ip4/172.16.14.1/tcp/8080", "172.16.14.1"),
            ("/dns4/neofs.bigcorp.com/tcp/8080", "neofs.bigcorp.com"),
            ("/dns4/s04.neofs.devenv/tcp/8082/tls", "s04.neofs.devenv"),
            ("/ip6/2004:eb1::1/tcp/8080", "2004:eb1::1"),
            ("[2004:eb1::1]:8080", "2004:eb1::1"),
            ("grpcs://example.com:7070", "example.com"),
            ("grpc://10.0.0.1:8080", "10.0.0.1"),
            ("172.16.14.1:8080", "172.16.14.1"),
            ("localhost:8080", "localhost"),
        ];
        for (input, want) in cases {
            assert_eq!(host_without_port(input).unwrap(), want, "input {input}");
        }
    }

    #[test]
    fn test_rejects_unsupported_addresses() {
        for input in [
            "http://172.16.14.1:8080",
            "/ip4/300.1.1.1/tcp/8080",
            "/ip4/1.1.1.1",
            "/ip4/1.1.1.1/tcp/port",
            "/unix/tmp/sock",
        ] {
            assert!(host_without_port(input).is_err(), "input {input}");
        }
    }
}
