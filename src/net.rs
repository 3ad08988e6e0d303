// Host-is-local precondition: prefetching reads the applier's position file
// straight off disk, so the configured host must name an address this
// machine actually owns. Mirrors `check_local` - resolve the hostname, then
// compare against every local interface address.

use std::net::{IpAddr, ToSocketAddrs};

use anyhow::{Context, Result};

pub fn is_local_host(host: &str) -> Result<bool> {
    let resolved: Vec<IpAddr> = (host, 0)
        .to_socket_addrs()
        .with_context(|| format!("resolving host {host}"))?
        .map(|addr| addr.ip())
        .collect();

    if resolved.is_empty() {
        return Ok(false);
    }

    let local_addrs = if_addrs::get_if_addrs().context("enumerating local network interfaces")?;

    Ok(resolved
        .iter()
        .any(|addr| local_addrs.iter().any(|ifa| &ifa.ip() == addr)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_is_local() {
        assert!(is_local_host("localhost").unwrap());
    }

    #[test]
    fn loopback_literal_is_local() {
        assert!(is_local_host("127.0.0.1").unwrap());
    }

    #[test]
    fn unroutable_documentation_address_is_not_local() {
        // TEST-NET-1, reserved for documentation (RFC 5737); never assigned
        // to a real interface.
        assert!(!is_local_host("192.0.2.1").unwrap());
    }
}
