//! Provides helpers for selecting a network interface on the current host to
//! use for scanning

use ipnet::Ipv4Net;
use pnet::{
    datalink::NetworkInterface as PNetNetworkInterface, ipnetwork::IpNetwork,
    util::MacAddr,
};
use std::net::Ipv4Addr;

use crate::error::{LanProbeError, Result};

/// Represents a network interface on current host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// The name of the interface
    pub name: String,
    /// The description of the interface
    pub description: String,
    /// The network this interface is attached to
    pub cidr: Ipv4Net,
    /// The IPv4 address assigned to the interface
    pub ipv4: Ipv4Addr,
    /// All addresses assigned to the interface
    pub ips: Vec<IpNetwork>,
    /// The hardware address of the interface
    pub mac: MacAddr,
    /// Interface flags
    pub flags: u32,
    /// The OS index of the interface
    pub index: u32,
}

impl TryFrom<PNetNetworkInterface> for NetworkInterface {
    type Error = LanProbeError;

    fn try_from(value: PNetNetworkInterface) -> Result<Self> {
        let mac = value.mac.ok_or_else(|| {
            LanProbeError::Interface(format!(
                "failed to get mac address for interface {}",
                value.name
            ))
        })?;

        let (ipv4, cidr) =
            get_interface_ipv4_and_cidr(&value).ok_or_else(|| {
                LanProbeError::Interface(format!(
                    "failed to get ip and cidr for interface {}",
                    value.name
                ))
            })?;

        Ok(Self {
            name: value.name,
            description: value.description,
            flags: value.flags,
            index: value.index,
            mac,
            ips: value.ips,
            cidr,
            ipv4,
        })
    }
}

impl From<&NetworkInterface> for PNetNetworkInterface {
    fn from(value: &NetworkInterface) -> Self {
        Self {
            name: value.name.clone(),
            flags: value.flags,
            description: value.description.clone(),
            index: value.index,
            ips: value.ips.clone(),
            mac: Some(value.mac),
        }
    }
}

/// Finds the interface on the current host with the given name
pub fn get_interface(name: &str) -> Result<NetworkInterface> {
    find_interface(pnet::datalink::interfaces(), name)
}

/// Finds the first interface on the current host that is up, is not a
/// loopback, and has an IPv4 address
pub fn get_default_interface() -> Result<NetworkInterface> {
    find_default_interface(pnet::datalink::interfaces())
}

fn find_interface(
    interfaces: Vec<PNetNetworkInterface>,
    name: &str,
) -> Result<NetworkInterface> {
    let iface = interfaces
        .into_iter()
        .find(|i| i.name == name)
        .ok_or_else(|| {
            LanProbeError::Interface(format!("no interface named {}", name))
        })?;

    NetworkInterface::try_from(iface)
}

fn find_default_interface(
    interfaces: Vec<PNetNetworkInterface>,
) -> Result<NetworkInterface> {
    let iface = interfaces
        .into_iter()
        .find(|e| {
            e.is_up() && !e.is_loopback() && e.ips.iter().any(|i| i.is_ipv4())
        })
        .ok_or_else(|| {
            LanProbeError::Interface(
                "failed to find a default network interface".into(),
            )
        })?;

    NetworkInterface::try_from(iface)
}

fn get_interface_ipv4_and_cidr(
    interface: &PNetNetworkInterface,
) -> Option<(Ipv4Addr, Ipv4Net)> {
    interface.ips.iter().find_map(|ip| match ip {
        IpNetwork::V4(net) => {
            let cidr = Ipv4Net::new(net.ip(), net.prefix()).ok()?;
            Some((net.ip(), cidr.trunc()))
        }
        IpNetwork::V6(_) => None,
    })
}

#[cfg(test)]
#[path = "./network_tests.rs"]
mod tests;
