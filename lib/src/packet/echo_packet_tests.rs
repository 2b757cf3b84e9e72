use crate::error::LanProbeError;

use super::*;

#[test]
fn payload_repeats_the_alphabet() {
    assert_eq!(&PAYLOAD[..26], b"ABCDEFGHIJKLMNOPQRSTUVWXYZ");
    assert_eq!(&PAYLOAD[26..], b"ABCDEF");
}

#[test]
fn creates_echo_request() {
    let packet = EchoRequestPacketBuilder::default()
        .identifier(0x1234u16)
        .sequence(1u16)
        .build()
        .unwrap()
        .to_raw();

    assert_eq!(packet.len(), 40);
    assert_eq!(packet[0], 8);
    assert_eq!(packet[1], 0);
    assert_eq!(&packet[4..6], &[0x12, 0x34]);
    assert_eq!(&packet[6..8], &[0x00, 0x01]);
    assert_eq!(&packet[ECHO_HEADER_SIZE..], &PAYLOAD);
}

#[test]
fn fills_in_reference_checksum() {
    // 08 00 0000 1234 0001 + "ABCD...ZABCDEF" sums to 0xd0fb
    let packet = EchoRequestPacketBuilder::default()
        .identifier(0x1234u16)
        .sequence(1u16)
        .build()
        .unwrap()
        .to_raw();

    assert_eq!(&packet[2..4], &[0x2f, 0x04]);
}

#[test]
fn checksum_matches_reference_vector() {
    let mut message = [0u8; PKT_TOTAL_SIZE];
    message[0] = 8;
    message[ECHO_HEADER_SIZE..].copy_from_slice(&PAYLOAD);

    assert_eq!(checksum(&message), 0x4139);
}

#[test]
fn checksum_ignores_checksum_field() {
    let mut message = [0u8; PKT_TOTAL_SIZE];
    message[0] = 8;
    message[ECHO_HEADER_SIZE..].copy_from_slice(&PAYLOAD);
    let expected = checksum(&message);

    message[2] = 0xde;
    message[3] = 0xad;

    assert_eq!(checksum(&message), expected);
}

#[test]
fn truncates_sequence_into_header() {
    let index: usize = 70_000;
    let packet = EchoRequestPacketBuilder::default()
        .identifier(7u16)
        .sequence(index as u16)
        .build()
        .unwrap()
        .to_raw();

    assert_eq!(
        u16::from_be_bytes([packet[6], packet[7]]),
        (70_000 % 65_536) as u16
    );
}

#[test]
fn parses_echo_reply() {
    let datagram = create_echo_reply(5, 0, 0xbeef, 42);

    let reply = parse_echo_reply(&datagram).unwrap();

    assert_eq!(reply.identifier, 0xbeef);
    assert_eq!(reply.sequence, 42);
}

#[test]
fn parses_echo_reply_after_ip_options() {
    let datagram = create_echo_reply(6, 0, 1, 2);

    assert!(parse_echo_reply(&datagram).is_some());
}

#[test]
fn rejects_non_reply_types() {
    // an echo request looped back to us
    let datagram = create_echo_reply(5, 8, 1, 2);
    assert!(parse_echo_reply(&datagram).is_none());

    // destination unreachable
    let datagram = create_echo_reply(5, 3, 1, 2);
    assert!(parse_echo_reply(&datagram).is_none());
}

#[test]
fn rejects_non_zero_code() {
    let mut datagram = create_echo_reply(5, 0, 1, 2);
    datagram[21] = 1;

    assert!(parse_echo_reply(&datagram).is_none());
}

#[test]
fn rejects_truncated_reply() {
    let datagram = create_echo_reply(5, 0, 1, 2);

    assert!(parse_echo_reply(&datagram[..24]).is_none());
    assert!(parse_echo_reply(&datagram[..27]).is_none());
    assert!(parse_echo_reply(&datagram[..28]).is_some());
}

#[test]
fn rejects_header_length_past_datagram() {
    // header claims 60 bytes but only 30 arrived
    let mut datagram = vec![0u8; 30];
    datagram[0] = 0x4f;

    assert!(parse_echo_reply(&datagram).is_none());
}

#[test]
fn rejects_header_length_below_minimum() {
    let mut datagram = create_echo_reply(5, 0, 1, 2);
    datagram[0] = 0x41;

    assert!(parse_echo_reply(&datagram).is_none());
}

#[test]
fn rejects_short_datagram() {
    assert!(parse_echo_reply(&[0x45, 0, 0]).is_none());
}

#[test]
fn requires_sequence() {
    let result = EchoRequestPacketBuilder::default()
        .identifier(7u16)
        .build()
        .map_err(LanProbeError::from);

    assert!(matches!(result, Err(LanProbeError::EchoPacketBuild(_))));
}
