use anyhow::{anyhow, Context, Result};
use log::{debug, error, warn};
use nix::ifaddrs::getifaddrs;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;

/// Write side of a control connection, shared with the command handlers.
pub type ControlWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Sends a response to the client.
pub async fn send_response(writer: &ControlWriter, message: &[u8]) -> Result<(), std::io::Error> {
    let mut writer = writer.lock().await;
    if let Err(e) = writer.write_all(message).await {
        error!("Error sending response: {}", e);
        return Err(e);
    }
    debug!("Sent: {}", String::from_utf8_lossy(message).trim_end());
    Ok(())
}

/// Finds the first IPv4 address bound to an interface other than `lo`.
pub fn detect_local_ipv4() -> Result<Ipv4Addr> {
    let addrs = getifaddrs().context("getifaddrs failed")?;

    for ifaddr in addrs {
        if ifaddr.interface_name == "lo" {
            continue;
        }
        if let Some(sin) = ifaddr.address.as_ref().and_then(|a| a.as_sockaddr_in()) {
            let ip = Ipv4Addr::from(sin.ip());
            if !ip.is_loopback() {
                return Ok(ip);
            }
        }
    }

    Err(anyhow!("Could not find a suitable network interface"))
}

/// The address PASV replies should carry.
///
/// A configured address is kept as written; when it is not IPv4 the PASV
/// handler reports the control connection's local address instead. Without
/// one, the first non-loopback IPv4 address is detected, and having none is
/// an error.
pub fn resolve_pasv_address(configured: Option<&str>) -> Result<String> {
    match configured {
        Some(address) => {
            if address.parse::<Ipv4Addr>().is_err() {
                warn!(
                    "Passive mode address {:?} is not IPv4; PASV will report the control connection address",
                    address
                );
            }
            Ok(address.to_string())
        }
        None => detect_local_ipv4().map(|ip| ip.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_address_wins() {
        assert_eq!(resolve_pasv_address(Some("10.1.2.3")).unwrap(), "10.1.2.3");
    }

    #[test]
    fn test_non_ipv4_configured_address_is_kept() {
        assert_eq!(resolve_pasv_address(Some("not-an-ip")).unwrap(), "not-an-ip");
        assert_eq!(resolve_pasv_address(Some("::1")).unwrap(), "::1");
    }

    #[test]
    fn test_unconfigured_address_follows_detection() {
        match (resolve_pasv_address(None), detect_local_ipv4()) {
            (Ok(resolved), Ok(detected)) => assert_eq!(resolved, detected.to_string()),
            (Err(_), Err(_)) => {}
            (resolved, detected) => panic!("{:?} vs {:?}", resolved, detected),
        }
    }

    #[test]
    fn test_detected_address_is_not_loopback() {
        // Hosts without a non-loopback interface legitimately fail here.
        if let Ok(ip) = detect_local_ipv4() {
            assert!(!ip.is_loopback());
        }
    }
}
