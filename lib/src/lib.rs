//! Library package for discovering live hosts on a local IPv4 subnet
//!
//! Given a network address and subnet mask, every usable host address in the
//! subnet is probed by a bounded pool of worker threads using either ICMP
//! echo requests or link-layer address resolution (ARP). Hosts that answer
//! are reported as they are found and a final [`scanners::ScanResult`] is
//! returned once every worker has exited.
//!
//! # Examples
//!
//! ## ICMP Sweep
//!
//! ```bash
//! sudo -E cargo run --example icmp-sweep -p lanprobe-lib
//! ```
//!
//! ## ARP Sweep
//!
//! ```bash
//! sudo -E cargo run --example arp-sweep -p lanprobe-lib
//! ```

#![deny(missing_docs)]
pub mod error;
pub mod network;
pub mod packet;
pub mod scanners;
pub mod targets;
pub mod wire;
