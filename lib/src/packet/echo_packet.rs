//! Provides helpers for creating ICMP echo requests and validating replies
//!
//! Requests are written without an IP header since the kernel prepends one
//! for raw ICMP sockets. Replies read back from such a socket still carry the
//! outer IPv4 header, so [`parse_echo_reply`] skips over it using the header
//! length field before looking at the ICMP header.

use derive_builder::Builder;
use pnet::packet::{
    Packet,
    icmp::{
        self, IcmpTypes,
        echo_reply::{self, EchoReplyPacket},
        echo_request::{self, MutableEchoRequestPacket},
    },
    ipv4,
};

/// Size of the echo request / reply header
pub const ECHO_HEADER_SIZE: usize =
    echo_request::EchoRequestPacket::minimum_packet_size();
/// Size of the fixed payload carried by every echo request
pub const PAYLOAD_SIZE: usize = 32;
/// Total size of an echo request on the wire
pub const PKT_TOTAL_SIZE: usize = ECHO_HEADER_SIZE + PAYLOAD_SIZE;

const PKT_IP4_MIN_SIZE: usize = ipv4::Ipv4Packet::minimum_packet_size();

/// Payload pattern: 'A'..'Z' repeating
pub const PAYLOAD: [u8; PAYLOAD_SIZE] = {
    let mut payload = [0u8; PAYLOAD_SIZE];
    let mut i = 0;
    while i < PAYLOAD_SIZE {
        payload[i] = b'A' + (i % 26) as u8;
        i += 1;
    }
    payload
};

/// Represents a generator for raw ICMP echo requests
#[derive(Debug, Builder)]
#[builder(setter(into))]
pub struct EchoRequestPacket {
    /// Distinguishes the sending worker
    identifier: u16,
    /// Claimed target index truncated to 16 bits
    sequence: u16,
}

impl EchoRequestPacket {
    /// Builds the echo request header followed by the fixed payload, with
    /// all fields in network byte order and the checksum filled in
    pub fn to_raw(&self) -> [u8; PKT_TOTAL_SIZE] {
        let mut pkt_buf = [0u8; PKT_TOTAL_SIZE];

        let mut echo = MutableEchoRequestPacket::new(&mut pkt_buf)
            .expect("failed to generate echo request packet");

        echo.set_icmp_type(IcmpTypes::EchoRequest);
        echo.set_icmp_code(echo_request::IcmpCodes::NoCode);
        echo.set_identifier(self.identifier);
        echo.set_sequence_number(self.sequence);
        echo.set_payload(&PAYLOAD);
        echo.set_checksum(0);

        let sum = checksum(echo.packet());
        echo.set_checksum(sum);

        pkt_buf
    }
}

/// Computes the 16 bit one's-complement Internet checksum of an ICMP
/// message. The checksum field itself (bytes 2 and 3) is treated as zero.
pub fn checksum(message: &[u8]) -> u16 {
    icmp::IcmpPacket::new(message)
        .map(|pkt| icmp::checksum(&pkt))
        .unwrap_or_default()
}

/// The identifying fields of a validated echo reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    /// Identifier echoed back by the replying host
    pub identifier: u16,
    /// Sequence number echoed back by the replying host
    pub sequence: u16,
}

/// Validates a datagram read from a raw ICMP socket: the outer IPv4 header
/// plus an echo header must fit in the buffer and the ICMP type and code
/// must both be zero (echo reply). Returns None for anything else.
pub fn parse_echo_reply(datagram: &[u8]) -> Option<EchoReply> {
    let ip = ipv4::Ipv4Packet::new(datagram)?;

    let header_len = usize::from(ip.get_header_length()) * 4;

    if header_len < PKT_IP4_MIN_SIZE
        || datagram.len() < header_len + ECHO_HEADER_SIZE
    {
        return None;
    }

    let reply = EchoReplyPacket::new(&datagram[header_len..])?;

    if reply.get_icmp_type() != IcmpTypes::EchoReply
        || reply.get_icmp_code() != echo_reply::IcmpCodes::NoCode
    {
        return None;
    }

    Some(EchoReply {
        identifier: reply.get_identifier(),
        sequence: reply.get_sequence_number(),
    })
}

#[cfg(test)]
#[doc(hidden)]
// only used in tests
pub fn create_echo_reply(
    header_len_words: u8,
    icmp_type: u8,
    identifier: u16,
    sequence: u16,
) -> Vec<u8> {
    let ip_len = usize::from(header_len_words) * 4;
    let mut datagram = vec![0u8; ip_len + PKT_TOTAL_SIZE];

    datagram[0] = 0x40 | (header_len_words & 0x0f);

    let icmp = &mut datagram[ip_len..];
    icmp[0] = icmp_type;
    icmp[4..6].copy_from_slice(&identifier.to_be_bytes());
    icmp[6..8].copy_from_slice(&sequence.to_be_bytes());
    icmp[ECHO_HEADER_SIZE..PKT_TOTAL_SIZE].copy_from_slice(&PAYLOAD);

    datagram
}

#[cfg(test)]
#[path = "./echo_packet_tests.rs"]
mod tests;
