//! Provides the read-only list of addresses a scan probes

use std::{net::Ipv4Addr, ops::Index};

use crate::{
    error::{LanProbeError, Result},
    targets::range::AddressRange,
};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ordered list of every address in an [`AddressRange`]
///
/// Built once per scan and only ever read while workers are running, so it
/// is shared by reference without any synchronization.
pub struct TargetList(Vec<Ipv4Addr>);

impl TargetList {
    /// Materializes every address in the range
    ///
    /// # Errors
    ///
    /// [`LanProbeError::Allocation`] if memory for the list cannot be
    /// reserved
    pub fn from_range(range: &AddressRange) -> Result<Self> {
        let mut targets = Vec::new();

        targets.try_reserve_exact(range.len()).map_err(|e| {
            LanProbeError::from_try_reserve_error("target list", e)
        })?;

        targets.extend(range.iter());

        Ok(Self(targets))
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no targets
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the target at `index` if there is one
    pub fn get(&self, index: usize) -> Option<Ipv4Addr> {
        self.0.get(index).copied()
    }

    /// Iterates over the targets in order
    pub fn iter(&self) -> impl Iterator<Item = &Ipv4Addr> {
        self.0.iter()
    }
}

impl From<Vec<Ipv4Addr>> for TargetList {
    fn from(value: Vec<Ipv4Addr>) -> Self {
        Self(value)
    }
}

impl Index<usize> for TargetList {
    type Output = Ipv4Addr;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

#[cfg(test)]
#[path = "./list_tests.rs"]
mod tests;
