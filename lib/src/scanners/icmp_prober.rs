//! ICMP echo probing over a raw socket

#[cfg(test)]
use mockall::automock;

use log::*;
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    io,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket},
    process,
    time::{Duration, Instant},
};

use crate::{
    error::{LanProbeError, Result},
    packet::echo_packet::{self, EchoReply, EchoRequestPacketBuilder},
};

use super::{ProbeMethod, ProbeOutcome, Prober, ProberFactory};

// large enough for an IPv4 header with options plus our echo reply
const RECV_BUFFER_SIZE: usize = 1024;

#[cfg_attr(test, automock)]
/// Minimal socket surface needed to exchange ICMP echo messages
pub trait EchoSocket: Send {
    /// Sends a raw ICMP message to `target`
    fn send_to(&mut self, packet: &[u8], target: Ipv4Addr) -> Result<()>;

    /// Waits at most `timeout` for the next datagram. Returns the number of
    /// bytes read and the source address, or None if nothing arrived.
    fn recv_from(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, Ipv4Addr)>>;
}

/// [`EchoSocket`] backed by a raw IPv4 ICMP socket
///
/// Opening one requires elevated privileges on most systems.
pub struct RawEchoSocket {
    socket: UdpSocket,
}

impl RawEchoSocket {
    /// Opens a new raw ICMP socket
    pub fn open() -> Result<Self> {
        let socket =
            Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
                .map_err(|e| LanProbeError::SocketCreate(e.to_string()))?;

        Ok(Self {
            socket: UdpSocket::from(socket),
        })
    }
}

impl EchoSocket for RawEchoSocket {
    fn send_to(&mut self, packet: &[u8], target: Ipv4Addr) -> Result<()> {
        self.socket
            .send_to(packet, SocketAddrV4::new(target, 0))
            .map_err(|e| LanProbeError::Send {
                ip: target,
                error: e.to_string(),
            })?;
        Ok(())
    }

    fn recv_from(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, Ipv4Addr)>> {
        // a zero duration is rejected by set_read_timeout
        if timeout.is_zero() {
            return Ok(None);
        }

        self.socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| LanProbeError::Receive(e.to_string()))?;

        match self.socket.recv_from(buf) {
            Ok((len, SocketAddr::V4(source))) => Ok(Some((len, *source.ip()))),
            Ok((_, SocketAddr::V6(source))) => Err(LanProbeError::Receive(
                format!("unexpected IPv6 source {}", source),
            )),
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(LanProbeError::Receive(e.to_string())),
        }
    }
}

/// [`Prober`] that sends one echo request per target and waits for the
/// matching reply
pub struct IcmpProber {
    socket: Box<dyn EchoSocket>,
    identifier: u16,
    timeout: Duration,
}

impl IcmpProber {
    /// Returns a prober that stamps every request with `identifier` and
    /// waits at most `timeout` for each reply
    pub fn new(
        socket: Box<dyn EchoSocket>,
        identifier: u16,
        timeout: Duration,
    ) -> Self {
        Self {
            socket,
            identifier,
            timeout,
        }
    }

    fn send_request(&mut self, index: usize, target: Ipv4Addr) -> Result<()> {
        let request = EchoRequestPacketBuilder::default()
            .identifier(self.identifier)
            .sequence(index as u16)
            .build()?;

        self.socket.send_to(&request.to_raw(), target)
    }

    fn await_reply(&mut self, index: usize, target: Ipv4Addr) -> Result<bool> {
        let expected = EchoReply {
            identifier: self.identifier,
            sequence: index as u16,
        };
        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; RECV_BUFFER_SIZE];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());

            if remaining.is_zero() {
                return Ok(false);
            }

            let Some((len, source)) =
                self.socket.recv_from(&mut buf, remaining)?
            else {
                return Ok(false);
            };

            if source != target {
                trace!("ignoring reply from {} for {}", source, target);
                continue;
            }

            // probing our own address loops the request itself back first
            match echo_packet::parse_echo_reply(&buf[..len]) {
                Some(reply) if reply == expected => return Ok(true),
                Some(reply) => {
                    trace!("ignoring stale reply {:?} from {}", reply, source);
                }
                None => trace!("ignoring non-reply message from {}", source),
            }
        }
    }
}

impl Prober for IcmpProber {
    fn probe(&mut self, index: usize, target: Ipv4Addr) -> ProbeOutcome {
        match self.send_request(index, target) {
            Ok(()) => {}
            Err(LanProbeError::Send { error, .. }) => {
                return ProbeOutcome::SendError {
                    ip: target,
                    cause: error,
                };
            }
            Err(e) => {
                return ProbeOutcome::SendError {
                    ip: target,
                    cause: e.to_string(),
                };
            }
        }

        match self.await_reply(index, target) {
            Ok(true) => ProbeOutcome::Up {
                ip: target,
                mac: None,
            },
            Ok(false) => ProbeOutcome::Down,
            Err(e) => {
                debug!("receive failed while probing {}: {}", target, e);
                ProbeOutcome::Down
            }
        }
    }
}

/// Creates one [`IcmpProber`] with its own raw socket per worker
pub struct IcmpProberFactory {
    timeout: Duration,
}

impl IcmpProberFactory {
    /// Returns a factory whose probers wait at most `timeout` per target
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ProberFactory for IcmpProberFactory {
    fn method(&self) -> ProbeMethod {
        ProbeMethod::Icmp
    }

    fn create(&self, worker_id: usize) -> Result<Box<dyn Prober>> {
        let socket = RawEchoSocket::open()?;

        Ok(Box::new(IcmpProber::new(
            Box::new(socket),
            identifier_for(worker_id),
            self.timeout,
        )))
    }
}

/// Echo identifier used by worker `worker_id`, unique per worker within one
/// process
pub fn identifier_for(worker_id: usize) -> u16 {
    (process::id() as u16).wrapping_add(worker_id as u16)
}

#[cfg(test)]
#[path = "./icmp_prober_tests.rs"]
mod tests;
