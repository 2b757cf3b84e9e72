//! Provides data structures and implementations for probing every host of a
//! subnet
//!
//! This includes:
//! - ICMP echo probing
//! - ARP (link-layer address resolution) probing
//! - The coordinator that fans targets out over a bounded worker pool

#[cfg(test)]
use mockall::automock;

use pnet::util::MacAddr;
use serde::Serialize;
use std::{fmt::Display, net::Ipv4Addr, thread::JoinHandle, time::Duration};

use crate::error::Result;

/// How long an ICMP worker waits for an echo reply
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Upper bound on concurrent probe workers for a single scan
pub const MAX_WORKERS: usize = 64;

/// How often the coordinator checks for completion and cancellation
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
/// The probing technique used by a scan
pub enum ProbeMethod {
    /// ICMP echo request / reply
    Icmp,
    /// Link-layer address resolution
    Arp,
}

impl Display for ProbeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeMethod::Icmp => write!(f, "ICMP"),
            ProbeMethod::Arp => write!(f, "ARP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of probing a single target
pub enum ProbeOutcome {
    /// The target answered
    Up {
        /// Address of the target
        ip: Ipv4Addr,
        /// Hardware address, only known for ARP probes
        mac: Option<MacAddr>,
    },
    /// No valid answer arrived
    Down,
    /// The probe could not be sent
    SendError {
        /// Address of the target
        ip: Ipv4Addr,
        /// Why the send failed
        cause: String,
    },
}

fn serialize_opt_to_string<S, T>(
    val: &Option<T>,
    s: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: Display,
{
    match val {
        Some(v) => s.serialize_str(&v.to_string()),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Notification that a host responded to a probe
pub struct HostUp {
    /// IPv4 of the host
    pub ip: Ipv4Addr,
    /// MAC address of the host if the probe method reveals it
    #[serde(serialize_with = "serialize_opt_to_string")]
    pub mac: Option<MacAddr>,
    /// Probe method that found the host
    pub method: ProbeMethod,
    /// Number of hosts found so far including this one
    pub count: usize,
}

impl Display for HostUp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Host {} is up ({})", self.ip, self.method)
    }
}

#[derive(Debug)]
/// Data structure representing a message that a target is being probed
pub struct Scanning {
    /// IPv4 of the target
    pub ip: Ipv4Addr,
}

#[derive(Debug)]
/// Generic enum representing the various kinds of scanning messages over the
/// mpsc channel
pub enum ScanMessage {
    /// Indicates that scanning has completed and every worker has exited
    Done,
    /// Sent to inform that a target is about to be probed
    Info(Scanning),
    /// Sent whenever a host responds
    HostUp(HostUp),
    /// Sent whenever a probe could not be put on the wire
    SendFailed {
        /// Address of the target
        ip: Ipv4Addr,
        /// Why the send failed
        error: String,
    },
    /// Sent once by a worker that could not start probing
    WorkerFailed {
        /// Index of the failed worker
        worker: usize,
        /// Why the worker failed
        error: String,
    },
    /// Sent when the scan was cancelled before all targets were probed
    Aborted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Aggregate outcome of a whole scan
pub struct ScanResult {
    /// Number of hosts that responded
    pub responded_count: usize,
    /// Whether the scan was cancelled before completing
    pub aborted_by_user: bool,
}

#[cfg_attr(test, automock)]
/// Performs one network operation against one target
pub trait Prober: Send {
    /// Probes `target`, the `index`-th entry of the target list
    fn probe(&mut self, index: usize, target: Ipv4Addr) -> ProbeOutcome;
}

#[cfg_attr(test, automock)]
/// Creates the per-worker [`Prober`] for a probe method
pub trait ProberFactory: Send + Sync {
    /// Which method the created probers use
    fn method(&self) -> ProbeMethod;

    /// Creates the prober for worker `worker_id`. Failing here is fatal for
    /// that worker only.
    fn create(&self, worker_id: usize) -> Result<Box<dyn Prober>>;
}

#[cfg_attr(test, automock)]
/// Trait used by all scanners
pub trait Scanner: Sync + Send {
    /// Performs network scanning in a background thread. Errors that prevent
    /// the scan from starting at all are returned immediately.
    fn scan(&self) -> Result<JoinHandle<Result<ScanResult>>>;
}

pub mod arp_prober;
pub mod coordinator;
pub mod icmp_prober;
pub mod queue;
pub mod resolver;
pub mod sink;
pub mod worker;

#[cfg(test)]
#[path = "./scanners_tests.rs"]
mod tests;
