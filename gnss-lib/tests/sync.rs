mod common;

use std::collections::HashMap;
use std::fs::File;

use gnss::comnav::ComNav;
use gnss::framing::{read_frames, Grammar, SyncEvent, SyncOpts, Synchronizer};
use gnss::nmea::Nmea;
use gnss::rtcm::Rtcm3;
use gnss::ubx::Ubx;
use gnss::{FrameSource, MessageId, MultiSynchronizer, ProtocolId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;

use common::*;

fn valid_garbage_valid<G: Grammar>(grammar: G, frame: &[u8], expected: &[u8]) {
    let mut dat = frame.to_vec();
    dat.extend(garbage(100));
    dat.extend_from_slice(frame);

    let mut sync = Synchronizer::new(grammar);
    let frames = sync.push_chunk(&dat);
    assert_eq!(frames.len(), 2, "expected exactly the two valid frames");
    assert!(frames.iter().all(|f| f.data == expected));
    assert_eq!(sync.stats().frames, 2);
}

#[test]
fn resync_nmea() {
    // line ending is not part of the frame
    valid_garbage_valid(Nmea, GLL, &GLL[..GLL.len() - 2]);
}

#[test]
fn resync_ubx() {
    valid_garbage_valid(Ubx::default(), &ACK_ACK, &ACK_ACK);
}

#[test]
fn resync_rtcm() {
    let frame = rtcm_1005();
    valid_garbage_valid(Rtcm3, &frame, &frame);
}

#[test]
fn resync_comnav() {
    let frame = comnav_bestpos(7);
    valid_garbage_valid(ComNav, &frame, &frame);
}

/// `<frame><random bytes><frame><flush>` for many seeds. Random bytes may hold start
/// markers; `flush` is long enough for any false frame attempt to be rejected so the
/// frame it swallowed is recovered.
fn random_garbage_between<G: Grammar + Clone>(grammar: G, frame: &[u8], expected: &[u8], flush: usize) {
    let mut rng = StdRng::seed_from_u64(0x6e55);
    for run in 0..256 {
        let mut dat = frame.to_vec();
        dat.extend((0..100).map(|_| rng.gen::<u8>()));
        dat.extend_from_slice(frame);
        dat.extend(garbage(flush));

        let mut sync = Synchronizer::new(grammar.clone());
        let frames = sync.push_chunk(&dat);
        assert_eq!(frames.len(), 2, "run {run}: {}", hex::encode(&dat));
        assert!(frames.iter().all(|f| f.data == expected), "run {run}");
    }
}

#[test]
fn random_garbage_nmea() {
    random_garbage_between(Nmea, GLL, &GLL[..GLL.len() - 2], Nmea::MAX_LEN + 1);
}

#[test]
fn random_garbage_ubx() {
    let ubx = Ubx::default();
    let flush = ubx.max_payload + 8;
    random_garbage_between(ubx, &ACK_ACK, &ACK_ACK, flush);
}

#[test]
fn random_garbage_rtcm() {
    let frame = rtcm_1005();
    random_garbage_between(Rtcm3, &frame, &frame, 1030);
}

#[test]
fn random_garbage_comnav() {
    let frame = comnav_bestpos(3);
    let flush = SyncOpts::default().max_frame_len + 1;
    random_garbage_between(ComNav, &frame, &frame, flush);
}

#[test]
fn false_rtcm_preamble_delays_frame() {
    // D3 with a 64 byte payload swallows the 25 byte frame after it
    let good = rtcm_1005();
    let mut dat = vec![0xd3, 0x00, 0x40];
    dat.extend_from_slice(&good);

    let mut sync = Synchronizer::new(Rtcm3);
    assert!(sync.push_chunk(&dat).is_empty());
    assert!(sync.pending() > 0);

    let frames = sync.push_chunk(&garbage(100));
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data, good);
    assert_eq!(sync.stats().checksum_errors, 1);
}

#[test]
fn resync_after_corrupt_frame() {
    let mut bad = ACK_ACK;
    bad[7] = 0x01;
    let mut dat = bad.to_vec();
    dat.extend_from_slice(&ACK_ACK);

    let mut sync = Synchronizer::new(Ubx::default());
    let events = sync.feed_chunk(&dat);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], SyncEvent::Discarded(_)));
    assert!(matches!(&events[1], SyncEvent::Frame(f) if f.data == ACK_ACK));
    assert_eq!(sync.stats().checksum_errors, 1);
}

#[test]
fn false_preamble_inside_corrupt_frame() {
    // the corrupt 1005 holds a D3 whose header declares a 514 byte payload; once that
    // attempt fails the valid frame it swallowed is found by replay
    let good = rtcm_1005();
    let mut dat = good.clone();
    dat[12] ^= 0x40;
    dat.extend_from_slice(&good);
    dat.extend(garbage(600));

    let mut sync = Synchronizer::new(Rtcm3);
    let frames = sync.push_chunk(&dat);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].data, good);
    assert_eq!(sync.stats().checksum_errors, 2);
}

#[test]
fn byte_at_a_time_matches_chunked() {
    let dat = mixed_stream();
    let mut chunked = MultiSynchronizer::all(&SyncOpts::default());
    let expected = chunked.push_chunk(&dat);

    let mut single = MultiSynchronizer::all(&SyncOpts::default());
    let got: Vec<_> = dat.iter().filter_map(|b| single.push(*b)).collect();
    assert_eq!(got, expected);
}

#[test]
fn multi_protocol_stream() {
    let mut multi = MultiSynchronizer::all(&SyncOpts::default());
    let frames = multi.push_chunk(&mixed_stream());

    let order: Vec<(ProtocolId, String)> = frames
        .iter()
        .map(|f| (f.protocol, f.message_id.to_string()))
        .collect();
    assert_eq!(
        order,
        vec![
            (ProtocolId::Nmea, "GLL".to_string()),
            (ProtocolId::Ubx, "0x05-0x01".to_string()),
            (ProtocolId::Rtcm3, "1005".to_string()),
            (ProtocolId::ComNav, "42".to_string()),
            (ProtocolId::Nmea, "GBS".to_string()),
        ]
    );

    let stats: HashMap<ProtocolId, _> = multi.protocol_stats().into_iter().collect();
    assert_eq!(stats.len(), 4);
    assert_eq!(stats[&ProtocolId::Nmea].frames, 2);
    assert_eq!(stats[&ProtocolId::Ubx].frames, 1);
    assert_eq!(stats[&ProtocolId::ComNav].frames, 1);
}

#[test_case(&[ProtocolId::Ubx], 1 ; "ubx only")]
#[test_case(&[ProtocolId::Nmea, ProtocolId::Rtcm3], 3 ; "nmea and rtcm")]
#[test_case(&ProtocolId::ALL, 5 ; "all")]
fn protocol_selection(protocols: &[ProtocolId], expected: usize) {
    let mut multi = MultiSynchronizer::for_protocols(protocols, &SyncOpts::default());
    assert_eq!(multi.push_chunk(&mixed_stream()).len(), expected);
}

#[test]
fn nmea_log_fixture() {
    let file = File::open(fixture_path("nmea.log")).unwrap();
    let mut iter = read_frames(file, Synchronizer::new(Nmea));
    let frames: Vec<_> = iter.by_ref().collect::<Result<_, _>>().unwrap();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for frame in &frames {
        assert!(frame.is_valid);
        *counts.entry(frame.message_id.to_string()).or_default() += 1;
    }
    assert_eq!(counts["GGA"], 2);
    assert_eq!(counts["GLL"], 2);
    assert_eq!(counts["GBS"], 1);
    assert_eq!(counts["PUBX"], 1);
    assert_eq!(frames.len(), 6);

    let stats = iter.source().stats();
    assert_eq!(stats.checksum_errors, 1);
}

#[test]
fn split_across_reads() {
    // reader yielding one byte per read
    struct Trickle(std::vec::IntoIter<u8>);
    impl std::io::Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.next() {
                Some(b) => {
                    buf[0] = b;
                    Ok(1)
                }
                None => Ok(0),
            }
        }
    }

    let reader = Trickle(mixed_stream().into_iter());
    let frames: Vec<_> = read_frames(reader, MultiSynchronizer::all(&SyncOpts::default()))
        .map(Result::unwrap)
        .collect();
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[2].message_id, MessageId::Code(1005));
}

#[test]
fn lookahead_reports_garbage() {
    let opts = SyncOpts::builder().lookahead(64).build();
    let mut sync = Synchronizer::with_opts(Ubx::default(), opts);
    let events = sync.feed_chunk(&garbage(200));
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| matches!(e, SyncEvent::Discarded(_))));
}
