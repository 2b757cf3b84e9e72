//! Custom Error and Result types for this library

use std::{
    any::Any,
    collections::{HashMap, TryReserveError},
    net::Ipv4Addr,
    sync::{MutexGuard, PoisonError, mpsc::SendError},
};
use thiserror::Error;

use crate::{
    packet::{
        Reader, Sender, arp_packet::ArpPacketBuilderError,
        echo_packet::EchoRequestPacketBuilderError,
    },
    scanners::{ScanMessage, coordinator::ScanCoordinatorBuilderError},
};

/// Custom Error type for this library
#[derive(Error, Debug)]
pub enum LanProbeError {
    /// The subnet mask is all-zero or all-one bits so no host range exists
    #[error(
        "cannot scan network {network} with mask {mask}: no usable host range"
    )]
    DegenerateNetwork {
        /// The network address that was supplied
        network: Ipv4Addr,
        /// The subnet mask that was supplied
        mask: Ipv4Addr,
    },

    /// The subnet is too small to contain any usable host
    #[error("no hosts to scan in network {network} with mask {mask}")]
    EmptyRange {
        /// The network address that was supplied
        network: Ipv4Addr,
        /// The subnet mask that was supplied
        mask: Ipv4Addr,
    },

    /// Memory for the target list or the worker handles could not be reserved
    #[error("failed to allocate {what}: {source}")]
    Allocation {
        /// What was being allocated
        what: &'static str,
        /// The underlying reservation failure
        #[source]
        source: TryReserveError,
    },

    /// A probe socket could not be opened, usually for lack of privileges
    #[error("failed to create probe socket: {_0}")]
    SocketCreate(String),

    /// A probe could not be put on the wire
    #[error("failed to send probe to {ip}: {error}")]
    Send {
        /// The target the probe was meant for
        ip: Ipv4Addr,
        /// The error message encountered
        error: String,
    },

    /// Reading a probe reply failed for a reason other than a timeout
    #[error("failed to receive probe reply: {_0}")]
    Receive(String),

    /// Link-layer address resolution produced no hardware address
    #[error("failed to resolve hardware address for {ip}: {error}")]
    Resolve {
        /// The address that could not be resolved
        ip: Ipv4Addr,
        /// The error message encountered
        error: String,
    },

    /// Error coming directly off the wire
    #[error("wire error: {_0}")]
    Wire(String),

    /// Error converting or locating a network interface
    #[error("network interface error: {_0}")]
    Interface(String),

    /// Error obtaining lock on packet reader
    #[error("failed to get lock on packet reader: {_0}")]
    PacketReaderLock(String),

    /// Error obtaining lock on packet sender
    #[error("failed to get lock on packet sender: {_0}")]
    PacketSenderLock(String),

    /// Error obtaining lock on the result sink or the pending request table
    #[error("failed to get lock on {what}: {error}")]
    Lock {
        /// What was being locked
        what: &'static str,
        /// The error message encountered
        error: String,
    },

    /// Error writing a line to the result log
    #[error("failed to write result log: {_0}")]
    LogWrite(#[source] std::io::Error),

    /// Errors resulting from events channel
    #[error("failed to send notification message: {:#?}", _0)]
    NotifierSendError(#[from] SendError<Box<ScanMessage>>),

    /// Generic thread error
    #[error("thread error: {_0}")]
    ThreadError(String),

    /// Error generated during ARP packet construction
    #[error("failed to build ARP packet: {_0}")]
    ArpPacketBuild(#[from] ArpPacketBuilderError),

    /// Error generated during ICMP echo request construction
    #[error("failed to build echo request packet: {_0}")]
    EchoPacketBuild(#[from] EchoRequestPacketBuilderError),

    /// Error resulting from failure to build the scan coordinator
    #[error("failed to build scan coordinator: {_0}")]
    CoordinatorBuild(#[from] ScanCoordinatorBuilderError),
}

impl From<Box<dyn Any + Send>> for LanProbeError {
    fn from(value: Box<dyn Any + Send>) -> Self {
        if let Some(s) = value.downcast_ref::<&'static str>() {
            Self::ThreadError(format!("Thread panicked with: {}", s))
        } else if let Some(s) = value.downcast_ref::<String>() {
            Self::ThreadError(format!("Thread panicked with: {}", s))
        } else {
            Self::ThreadError("Thread panicked with an unknown type".into())
        }
    }
}

impl<'a> From<PoisonError<MutexGuard<'a, dyn Reader + 'static>>>
    for LanProbeError
{
    fn from(value: PoisonError<MutexGuard<'a, dyn Reader + 'static>>) -> Self {
        Self::PacketReaderLock(value.to_string())
    }
}

impl<'a> From<PoisonError<MutexGuard<'a, dyn Sender + 'static>>>
    for LanProbeError
{
    fn from(value: PoisonError<MutexGuard<'a, dyn Sender + 'static>>) -> Self {
        Self::PacketSenderLock(value.to_string())
    }
}

impl<'a, V> From<PoisonError<MutexGuard<'a, HashMap<Ipv4Addr, V>>>>
    for LanProbeError
{
    fn from(value: PoisonError<MutexGuard<'a, HashMap<Ipv4Addr, V>>>) -> Self {
        Self::Lock {
            what: "pending resolution table",
            error: value.to_string(),
        }
    }
}

impl LanProbeError {
    /// Converter for channel send errors
    pub fn from_channel_send_error(e: SendError<ScanMessage>) -> Self {
        LanProbeError::NotifierSendError(SendError(Box::from(e.0)))
    }

    /// Converter for allocation failures
    pub fn from_try_reserve_error(
        what: &'static str,
        source: TryReserveError,
    ) -> Self {
        Self::Allocation { what, source }
    }
}

/// Custom Result type for this library. All Errors exposed by this library
/// will be returned as [`LanProbeError`]
pub type Result<T> = std::result::Result<T, LanProbeError>;
