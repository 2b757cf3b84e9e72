//! Implements a default Wire using pnet

use pnet::datalink;
use std::{
    io,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{
    error::{LanProbeError, Result},
    network::NetworkInterface,
    packet::{Reader, Sender},
};

/// How long a read blocks before giving the caller a chance to stop
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Represents a packet Sender and packet Reader tuple
#[derive(Clone)]
pub struct Wire(pub Arc<Mutex<dyn Sender>>, pub Arc<Mutex<dyn Reader>>);

/// A PNetReader implementation of packet Reader
pub struct PNetReader {
    receiver: Box<dyn datalink::DataLinkReceiver>,
}

// Implements the Reader trait for our PNet implementation
impl Reader for PNetReader {
    fn next_packet(&mut self) -> Result<Option<&[u8]>> {
        match self.receiver.next() {
            Ok(pkt) => Ok(Some(pkt)),
            Err(e)
                if e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(None)
            }
            Err(e) => Err(LanProbeError::Wire(e.to_string())),
        }
    }
}

/// A PNetSender implementation of packet Sender
pub struct PNetSender {
    sender: Box<dyn datalink::DataLinkSender>,
}

// Implements the Sender trait for our PNet implementation
impl Sender for PNetSender {
    fn send(&mut self, packet: &[u8]) -> Result<()> {
        let opt = self.sender.send_to(packet, None);
        match opt {
            Some(res) => {
                Ok(res.map_err(|e| LanProbeError::Wire(e.to_string()))?)
            }
            None => Err(LanProbeError::Wire("failed to send packet".into())),
        }
    }
}

/// Returns the default wire for the given interface
///
/// Reads time out after [`DEFAULT_READ_TIMEOUT`] so reader threads can be
/// stopped. Opening a datalink channel requires elevated privileges.
///
/// Example
/// ```no_run
/// # use lanprobe_lib::network;
/// # use lanprobe_lib::wire;
/// let interface = network::get_default_interface().unwrap();
/// let packet_wire = wire::default(&interface).unwrap();
/// ```
pub fn default(interface: &NetworkInterface) -> Result<Wire> {
    let cfg = datalink::Config {
        read_timeout: Some(DEFAULT_READ_TIMEOUT),
        ..Default::default()
    };

    let channel = match datalink::channel(&interface.into(), cfg) {
        Ok(datalink::Channel::Ethernet(tx, rx)) => Ok((tx, rx)),
        Ok(_) => {
            Err(LanProbeError::Wire("failed to create packet reader".into()))
        }
        Err(e) => Err(LanProbeError::Wire(e.to_string())),
    }?;

    Ok(Wire(
        Arc::new(Mutex::new(PNetSender { sender: channel.0 })),
        Arc::new(Mutex::new(PNetReader {
            receiver: channel.1,
        })),
    ))
}

#[cfg(test)]
#[path = "./wire_tests.rs"]
mod tests;
