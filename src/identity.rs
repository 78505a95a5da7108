//! Host identity resolution for the presence beacon
//!
//! This module resolves, once at startup:
//! - The primary network interface hardware address, selected by priority
//!   (Ethernet > WiFi > anything else that is not loopback)
//! - The configured host name
//!
//! Both values stay raw text; the payload encoder applies the wire encoding
//! when a report is built. Resolution failure is fatal: an unidentified host
//! can never produce a meaningful report.

use anyhow::{anyhow, bail, Context, Result};
use if_addrs::get_if_addrs;
use tracing::{debug, info};

/// Stable host identity, resolved once and immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct HostIdentity {
    pub hardware_id: String,
    pub hostname: String,
}

/// Source of the primary interface hardware address, as raw text.
pub trait HardwareAddrSource {
    fn hardware_addr(&self) -> Result<String>;
}

/// Source of the configured host name, as raw text.
pub trait HostNameSource {
    fn host_name(&self) -> Result<String>;
}

/// Resolve the host identity from the given sources.
///
/// Called exactly once at startup; any failure here must abort the process
/// before the reporting loop starts.
pub fn resolve(hw: &dyn HardwareAddrSource, name: &dyn HostNameSource) -> Result<HostIdentity> {
    let hardware_id = hw
        .hardware_addr()
        .context("failed to resolve hardware identifier")?;
    let hostname = name.host_name().context("failed to resolve host name")?;

    if hardware_id.trim().is_empty() {
        bail!("hardware identifier source returned no data");
    }
    if hostname.trim().is_empty() {
        bail!("host name source returned no data");
    }

    info!(mac = %hardware_id, host = %hostname, "host identity resolved");

    Ok(HostIdentity {
        hardware_id,
        hostname,
    })
}

/// Interface selection priority; lower ranks win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum InterfaceClass {
    Ethernet,
    Wireless,
    Other,
}

fn classify(name: &str) -> InterfaceClass {
    let n = name.to_ascii_lowercase();
    // wlan/wlp/wlo before the en* check, which would otherwise never match
    if n.starts_with("wl") || n.contains("wifi") {
        InterfaceClass::Wireless
    } else if n.starts_with("eth") || n.starts_with("en") {
        InterfaceClass::Ethernet
    } else {
        InterfaceClass::Other
    }
}

/// System implementation: enumerate interfaces and pick the primary MAC.
pub struct SystemHardwareAddr;

impl HardwareAddrSource for SystemHardwareAddr {
    fn hardware_addr(&self) -> Result<String> {
        let addrs = get_if_addrs().context("failed to enumerate network interfaces")?;

        // One entry per address; dedupe by interface name.
        let mut candidates: Vec<(InterfaceClass, String, String)> = Vec::new();
        for ifa in addrs {
            if ifa.is_loopback() || candidates.iter().any(|(_, n, _)| *n == ifa.name) {
                continue;
            }
            match mac_address::mac_address_by_name(&ifa.name) {
                Ok(Some(mac)) => {
                    debug!(interface = %ifa.name, mac = %mac, "candidate interface");
                    candidates.push((classify(&ifa.name), ifa.name, mac.to_string()));
                }
                Ok(None) => debug!(interface = %ifa.name, "no hardware address"),
                Err(e) => debug!(interface = %ifa.name, error = %e, "hardware address lookup failed"),
            }
        }

        // Stable sort keeps enumeration order within a class.
        candidates.sort_by_key(|(class, _, _)| *class);
        let (_, name, mac) = candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no network interface with a hardware address found"))?;

        info!(interface = %name, mac = %mac, "selected primary interface");
        Ok(mac)
    }
}

/// System implementation: host name from the OS.
pub struct SystemHostName;

impl HostNameSource for SystemHostName {
    fn host_name(&self) -> Result<String> {
        Ok(gethostname::gethostname().to_string_lossy().into_owned())
    }
}
