//! Delivery endpoint parsed from an output URL.
//!
//! Example: `https://es.svc.infra.cluster:9999` => Endpoint { scheme: "https",
//! host: "es.svc.infra.cluster", port: 9999 }.

use crate::error::{GenerateError, Result};
use url::{Host, Url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse `scheme://host[:port][/]` for the output named `output`. A
    /// missing port falls back to `default_port`, not the scheme's well-known
    /// port.
    pub fn parse(output: &str, raw: &str, default_port: u16) -> Result<Self> {
        let invalid = |reason: String| GenerateError::InvalidUrl {
            output: output.to_string(),
            url: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;

        let host = match url.host() {
            Some(Host::Domain(domain)) => {
                if !domain.chars().all(is_host_char) {
                    return Err(invalid(format!("invalid host {:?}", domain)));
                }
                domain.to_string()
            }
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => {
                url.host_str().unwrap_or_default().to_string()
            }
            None => return Err(invalid("missing host".to_string())),
        };
        if host.is_empty() {
            return Err(invalid("missing host".to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials are not allowed in the url".to_string()));
        }
        if !matches!(url.path(), "" | "/") || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("expected scheme://host[:port]".to_string()));
        }

        let port = match url.port() {
            Some(port) => port,
            // `Url` hides a port equal to the scheme's well-known one; keep it
            // only when it was written out.
            None => url
                .port_or_known_default()
                .filter(|p| authority(raw).ends_with(&format!(":{}", p)))
                .unwrap_or(default_port),
        };
        if port == 0 {
            return Err(invalid("port must be non-zero".to_string()));
        }

        Ok(Endpoint {
            scheme: url.scheme().to_string(),
            host,
            port,
        })
    }

    pub fn is_tls(&self) -> bool {
        matches!(self.scheme.as_str(), "https" | "tls")
    }
}

fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')
}

fn authority(raw: &str) -> &str {
    let rest = raw
        .trim()
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or_default();
    rest.split(['/', '?', '#']).next().unwrap_or_default()
}
