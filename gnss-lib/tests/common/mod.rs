#![allow(dead_code)]
use std::path::PathBuf;

use gnss::comnav::{self, BestPos, Header};
use gnss::integrity::{xor_checksum, xor_checksum_hex};
use gnss::ubx::{self, Ack};

pub const RTCM_1005: &str = "d300133ed7d30202980edeef34b4bd62ac0941986f33360b98";
pub const ACK_ACK: [u8; 10] = [0xb5, 0x62, 0x05, 0x01, 0x02, 0x00, 0x06, 0x00, 0x0e, 0x37];
pub const GLL: &[u8] = b"$GPGLL,4916.45,N,12311.12,W,225444,A*31\r\n";

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

/// `$<body>*<checksum>\r\n`
pub fn sentence(body: &str) -> Vec<u8> {
    let mut out = format!("${body}*").into_bytes();
    out.extend_from_slice(&xor_checksum_hex(xor_checksum(body.as_bytes())));
    out.extend_from_slice(b"\r\n");
    out
}

pub fn ubx_ack(class: u8, id: u8) -> Vec<u8> {
    let ack = Ack {
        acknowledged: true,
        class,
        id,
    };
    ubx::serialize(&ack).unwrap()
}

pub fn rtcm_1005() -> Vec<u8> {
    hex::decode(RTCM_1005).unwrap()
}

pub fn comnav_bestpos(sequence: u16) -> Vec<u8> {
    let header = Header {
        sequence,
        week: 2300,
        ms: 172_800_000,
        ..Header::default()
    };
    let pos = BestPos {
        lat: 31.166_667,
        lon: 121.433_333,
        hgt: 8.5,
        num_svs: 24,
        num_soln_svs: 20,
        ..BestPos::default()
    };
    comnav::serialize(&header, &pos).unwrap()
}

/// Bytes that contain no start byte for any supported protocol.
pub fn garbage(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i % 0x20) as u8)
        .collect()
}

/// One frame of each protocol separated by garbage.
pub fn mixed_stream() -> Vec<u8> {
    let mut dat = sentence("GPGLL,4916.45,N,12311.12,W,225444,A");
    dat.extend(garbage(17));
    dat.extend_from_slice(&ACK_ACK);
    dat.extend(garbage(5));
    dat.extend(rtcm_1005());
    dat.extend(comnav_bestpos(1));
    dat.extend(garbage(33));
    dat.extend(sentence("GPGBS,015509.00,-0.031,-0.186,0.219,19,0.000,-0.354,6.972"));
    dat
}
