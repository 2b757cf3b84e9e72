//! Blocking IPv4 to hardware address resolution over the wire
//!
//! A [`WireResolver`] owns one background thread reading frames off the
//! interface. Each call to [`Resolver::resolve`] registers the target in a
//! table of pending requests, broadcasts an ARP request, and waits for the
//! reader thread to hand back the sender address of a matching ARP reply.

#[cfg(test)]
use mockall::automock;

use log::*;
use pnet::{
    packet::{Packet, arp, ethernet},
    util::MacAddr,
};
use std::{
    collections::HashMap,
    net::Ipv4Addr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    error::{LanProbeError, Result},
    network::NetworkInterface,
    packet::{self, Reader, Sender, arp_packet::ArpPacketBuilder},
    wire::Wire,
};

#[cfg_attr(test, automock)]
/// Resolves an IPv4 address to the hardware address of the host owning it
pub trait Resolver: Send + Sync {
    /// Blocks until `target` is resolved or the resolver gives up
    fn resolve(&self, target: Ipv4Addr) -> Result<MacAddr>;
}

type PendingTable = Arc<Mutex<HashMap<Ipv4Addr, mpsc::Sender<MacAddr>>>>;

/// [`Resolver`] that speaks ARP directly on a network interface
pub struct WireResolver {
    interface: Arc<NetworkInterface>,
    sender: Arc<Mutex<dyn Sender>>,
    pending: PendingTable,
    timeout: Duration,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<Result<()>>>,
}

impl WireResolver {
    /// Starts the reply reader on `wire` and returns a resolver that waits
    /// at most `timeout` for each reply
    pub fn start(
        interface: Arc<NetworkInterface>,
        wire: Wire,
        timeout: Duration,
    ) -> Result<Self> {
        let Wire(sender, reader) = wire;
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let stop = Arc::new(AtomicBool::new(false));

        let thread_pending = Arc::clone(&pending);
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("arp-reader".into())
            .spawn(move || read_replies(reader, thread_pending, thread_stop))
            .map_err(|e| LanProbeError::ThreadError(e.to_string()))?;

        debug!("started arp reader on {}", interface.name);

        Ok(Self {
            interface,
            sender,
            pending,
            timeout,
            stop,
            reader: Some(handle),
        })
    }

    fn send_request(&self, target: Ipv4Addr) -> Result<()> {
        // throttle packet sending to prevent packet loss
        thread::sleep(packet::DEFAULT_PACKET_SEND_TIMING);

        let request = ArpPacketBuilder::default()
            .source_ip(self.interface.ipv4)
            .source_mac(self.interface.mac)
            .dest_ip(target)
            .build()?;

        let mut sender = self.sender.lock()?;

        sender.send(&request.to_raw())
    }

    fn await_reply(
        &self,
        target: Ipv4Addr,
        rx: mpsc::Receiver<MacAddr>,
    ) -> Result<MacAddr> {
        self.send_request(target)?;

        rx.recv_timeout(self.timeout)
            .map_err(|e| LanProbeError::Resolve {
                ip: target,
                error: e.to_string(),
            })
    }
}

impl Resolver for WireResolver {
    fn resolve(&self, target: Ipv4Addr) -> Result<MacAddr> {
        // the host never answers its own requests
        if target == self.interface.ipv4 {
            return Ok(self.interface.mac);
        }

        let (tx, rx) = mpsc::channel();

        self.pending.lock()?.insert(target, tx);

        let result = self.await_reply(target, rx);

        self.pending.lock()?.remove(&target);

        result
    }
}

impl Drop for WireResolver {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);

        let Some(handle) = self.reader.take() else {
            return;
        };

        match handle.join() {
            Ok(Ok(())) => debug!("arp reader stopped"),
            Ok(Err(e)) => warn!("arp reader exited with error: {}", e),
            Err(e) => error!("arp reader panicked: {}", LanProbeError::from(e)),
        }
    }
}

fn read_replies(
    reader: Arc<Mutex<dyn Reader>>,
    pending: PendingTable,
    stop: Arc<AtomicBool>,
) -> Result<()> {
    let mut reader = reader.lock()?;

    while !stop.load(Ordering::Acquire) {
        let Some(pkt) = reader.next_packet()? else {
            continue;
        };

        let Some((ip, mac)) = parse_arp_reply(pkt) else {
            continue;
        };

        if let Some(waiting) = pending.lock()?.remove(&ip) {
            trace!("resolved {} to {}", ip, mac);
            // the requester may have already timed out
            let _ = waiting.send(mac);
        }
    }

    Ok(())
}

fn parse_arp_reply(pkt: &[u8]) -> Option<(Ipv4Addr, MacAddr)> {
    let eth = ethernet::EthernetPacket::new(pkt)?;

    if eth.get_ethertype() != ethernet::EtherTypes::Arp {
        return None;
    }

    let header = arp::ArpPacket::new(eth.payload())?;

    if header.get_operation() != arp::ArpOperations::Reply {
        return None;
    }

    Some((header.get_sender_proto_addr(), header.get_sender_hw_addr()))
}

#[cfg(test)]
#[path = "./resolver_tests.rs"]
mod tests;
