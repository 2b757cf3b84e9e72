//! Provides helpers for creating, sending and parsing probe packets

use core::time;

use crate::error::Result;

pub mod arp_packet;
pub mod echo_packet;

/// Default timing for throttling packet sends to prevent packet loss
pub const DEFAULT_PACKET_SEND_TIMING: time::Duration =
    time::Duration::from_micros(50);

/// Trait describing a packet reader
pub trait Reader: Send {
    /// Should return the next packet off of the wire, or None when the read
    /// timed out without a packet arriving
    fn next_packet(&mut self) -> Result<Option<&[u8]>>;
}

/// Trait describing a packet sender
pub trait Sender: Send {
    /// Should send a packet over the wire
    fn send(&mut self, packet: &[u8]) -> Result<()>;
}

#[cfg(test)]
#[path = "./packet_tests.rs"]
#[doc(hidden)]
pub mod mocks;
