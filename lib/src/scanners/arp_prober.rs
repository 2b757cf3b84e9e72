//! ARP probing through a shared [`Resolver`]

use log::*;
use std::{net::Ipv4Addr, sync::Arc};

use crate::error::Result;

use super::{
    ProbeMethod, ProbeOutcome, Prober, ProberFactory, resolver::Resolver,
};

/// [`Prober`] that treats a successful hardware address resolution as proof
/// the host is up
pub struct ArpProber {
    resolver: Arc<dyn Resolver>,
}

impl ArpProber {
    /// Returns a prober resolving through `resolver`
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }
}

impl Prober for ArpProber {
    fn probe(&mut self, _index: usize, target: Ipv4Addr) -> ProbeOutcome {
        match self.resolver.resolve(target) {
            Ok(mac) => ProbeOutcome::Up {
                ip: target,
                mac: Some(mac),
            },
            // every resolution failure means the same thing here
            Err(e) => {
                trace!("{}", e);
                ProbeOutcome::Down
            }
        }
    }
}

/// Hands every worker an [`ArpProber`] over the same resolver
pub struct ArpProberFactory {
    resolver: Arc<dyn Resolver>,
}

impl ArpProberFactory {
    /// Returns a factory sharing `resolver` between all workers
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }
}

impl ProberFactory for ArpProberFactory {
    fn method(&self) -> ProbeMethod {
        ProbeMethod::Arp
    }

    fn create(&self, _worker_id: usize) -> Result<Box<dyn Prober>> {
        Ok(Box::new(ArpProber::new(Arc::clone(&self.resolver))))
    }
}

#[cfg(test)]
#[path = "./arp_prober_tests.rs"]
mod tests;
