//! Outbound URL guard for the placeholder route
//!
//! The placeholder route fetches whatever URL the caller names, so the URL is
//! checked first:
//! - scheme must be http or https
//! - localhost, internal hostnames and private IP literals are refused
//! - resolved addresses must be public too (DNS rebinding)
//! - an optional host allowlist applies (exact or subdomain match)

use kyte_core::Config;
use std::net::{IpAddr, Ipv6Addr};
use tokio::net::lookup_host;

#[derive(Debug, Clone, Default)]
pub struct SourceGuard {
    allow_private_ips: bool,
    allowlist: Option<Vec<String>>,
}

impl SourceGuard {
    pub fn new(allow_private_ips: bool, allowlist: Option<Vec<String>>) -> Self {
        Self {
            allow_private_ips,
            allowlist: allowlist.map(|hosts| hosts.into_iter().map(|h| h.to_lowercase()).collect()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.placeholder_allow_private_sources,
            config.placeholder_source_allowlist.clone(),
        )
    }

    /// Guard that only checks the scheme; used against local test servers.
    pub fn permissive() -> Self {
        Self::new(true, None)
    }

    /// Ok(()) if the URL is safe to fetch, otherwise the reason it is not.
    pub async fn check(&self, url: &str) -> Result<(), String> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err("URL must start with http:// or https://".to_string());
        }

        let parsed_url =
            reqwest::Url::parse(url).map_err(|e| format!("Invalid URL format: {}", e))?;

        let host = parsed_url
            .host_str()
            .ok_or_else(|| "URL must have a host".to_string())?;
        // IPv6 literals come back bracketed.
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let host_lower = host.to_lowercase();

        if let Some(allowed_domains) = &self.allowlist {
            let is_allowed = allowed_domains.iter().any(|allowed| {
                host_lower == *allowed || host_lower.ends_with(&format!(".{}", allowed))
            });

            if !is_allowed {
                return Err(format!(
                    "URL hostname '{}' is not in the allowed list. Allowed domains: {}",
                    host,
                    allowed_domains.join(", ")
                ));
            }
        }

        if self.allow_private_ips {
            return Ok(());
        }

        if let Ok(ip) = host.parse::<IpAddr>() {
            if is_private_ip(&ip) {
                return Err("Private/internal IP addresses are not allowed".to_string());
            }
            return Ok(());
        }

        if host_lower == "localhost"
            || host_lower.ends_with(".localhost")
            || host_lower.ends_with(".local")
            || host_lower.ends_with(".internal")
            || host_lower.ends_with(".corp")
        {
            return Err("Localhost and internal hostnames are not allowed".to_string());
        }

        let port = parsed_url.port_or_known_default().unwrap_or(80);
        match lookup_host((host, port)).await {
            Ok(addrs) => {
                for addr in addrs {
                    if is_private_ip(&addr.ip()) {
                        return Err(format!(
                            "Hostname resolves to private/internal IP address: {}",
                            addr.ip()
                        ));
                    }
                }
            }
            Err(e) => {
                // The fetch itself will fail if the name really does not resolve.
                tracing::warn!(host = %host, error = %e, "Failed to resolve placeholder source host");
            }
        }

        Ok(())
    }
}

/// Private, loopback, link-local, multicast and reserved ranges (v4 and v6).
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
                || octets[0] == 127
                || (octets[0] == 169 && octets[1] == 254)
                || (224..=239).contains(&octets[0])
                || octets[0] == 0
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

/// fe80::/10
fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

/// fc00::/7
fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}
