//! Computes the usable host range of an IPv4 subnet

use std::{fmt::Display, net::Ipv4Addr};

use crate::error::{LanProbeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Closed interval of usable host addresses within a subnet
///
/// The network address and the broadcast address are never part of the
/// range.
///
/// # Examples
///
/// ```
/// # use std::net::Ipv4Addr;
/// # use lanprobe_lib::targets::range::AddressRange;
/// let range = AddressRange::from_network(
///     Ipv4Addr::new(192, 168, 1, 0),
///     Ipv4Addr::new(255, 255, 255, 0),
/// )
/// .unwrap();
/// assert_eq!(range.first(), Ipv4Addr::new(192, 168, 1, 1));
/// assert_eq!(range.last(), Ipv4Addr::new(192, 168, 1, 254));
/// assert_eq!(range.len(), 254);
/// ```
pub struct AddressRange {
    first: u32,
    last: u32,
}

impl AddressRange {
    /// Derives the host range from a network address and subnet mask
    ///
    /// # Errors
    ///
    /// [`LanProbeError::DegenerateNetwork`] when the mask is all-zero or
    /// all-one bits, [`LanProbeError::EmptyRange`] when the subnet holds no
    /// usable host (e.g. a /31)
    pub fn from_network(network: Ipv4Addr, mask: Ipv4Addr) -> Result<Self> {
        let net_bits = u32::from(network);
        let mask_bits = u32::from(mask);

        if mask_bits == 0 || mask_bits == u32::MAX {
            return Err(LanProbeError::DegenerateNetwork { network, mask });
        }

        // mask is not all-one bits so neither operation can overflow
        let first = (net_bits & mask_bits) + 1;
        let last = (net_bits | !mask_bits) - 1;

        if last < first {
            return Err(LanProbeError::EmptyRange { network, mask });
        }

        Ok(Self { first, last })
    }

    /// First usable host address
    pub fn first(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.first)
    }

    /// Last usable host address
    pub fn last(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.last)
    }

    /// Number of addresses in the range
    pub fn len(&self) -> usize {
        (self.last - self.first) as usize + 1
    }

    /// A range is never empty, construction fails instead
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates every address in the range in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        (self.first..=self.last).map(Ipv4Addr::from)
    }
}

impl Display for AddressRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first(), self.last())
    }
}

#[cfg(test)]
#[path = "./range_tests.rs"]
mod tests;
