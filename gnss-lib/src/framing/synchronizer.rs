use std::collections::VecDeque;

use tracing::{debug, trace};

use super::{Advance, Discard, DiscardReason, Frame, Grammar, ParserState, SyncEvent, SyncOpts, SyncStats};
use crate::message::ProtocolId;
use crate::prelude::*;

/// Byte-at-a-time frame synchronizer for a single [Grammar].
///
/// When a frame attempt fails every byte after its start byte is replayed, so a start
/// marker hidden inside a rejected frame is still found and the search always makes
/// progress.
///
/// A synchronizer is driven by a single reader; it is `Send` but its methods take
/// `&mut self` and it must not be shared between concurrent writers.
pub struct Synchronizer<G> {
    grammar: G,
    opts: SyncOpts,
    state: ParserState,
    buf: Vec<u8>,
    // Bytes to process before any new input, front first.
    replay: VecDeque<u8>,
    events: VecDeque<SyncEvent>,
    // Consecutive bytes skipped since the last frame or NoSync report.
    skipped: usize,
    stats: SyncStats,
}

impl<G: Grammar> Synchronizer<G> {
    /// Creates a new ``Synchronizer`` with default [SyncOpts].
    pub fn new(grammar: G) -> Self {
        Self::with_opts(grammar, SyncOpts::default())
    }

    pub fn with_opts(grammar: G, opts: SyncOpts) -> Self {
        Synchronizer {
            grammar,
            opts,
            state: ParserState::Idle,
            buf: Vec::new(),
            replay: VecDeque::new(),
            events: VecDeque::new(),
            skipped: 0,
            stats: SyncStats::default(),
        }
    }

    pub fn protocol(&self) -> ProtocolId {
        self.grammar.protocol()
    }

    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Number of bytes buffered for an incomplete frame.
    pub fn pending(&self) -> usize {
        self.buf.len() + self.replay.len()
    }

    /// Consume one byte and return the next available event.
    ///
    /// A single byte can produce more than one event, e.g., a discard followed by a
    /// frame found in the replayed bytes; the extras are returned by [Synchronizer::poll]
    /// or subsequent calls.
    pub fn feed(&mut self, byte: u8) -> Option<SyncEvent> {
        self.replay.push_back(byte);
        while let Some(b) = self.replay.pop_front() {
            self.step(b);
        }
        self.events.pop_front()
    }

    /// Next queued event, if any, without consuming input.
    pub fn poll(&mut self) -> Option<SyncEvent> {
        self.events.pop_front()
    }

    /// Consume one byte, returning a frame if one completed.
    ///
    /// Discards are logged and counted in [Synchronizer::stats] but not returned.
    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        let mut event = self.feed(byte);
        loop {
            match event {
                Some(SyncEvent::Frame(frame)) => return Some(frame),
                Some(SyncEvent::Discarded(_)) => event = self.poll(),
                None => return None,
            }
        }
    }

    /// [Synchronizer::push] for every byte in `dat`, collecting all frames.
    pub fn push_chunk(&mut self, dat: &[u8]) -> Vec<Frame> {
        self.feed_chunk(dat)
            .into_iter()
            .filter_map(SyncEvent::into_frame)
            .collect()
    }

    /// [Synchronizer::feed] for every byte in `dat`, collecting all events.
    pub fn feed_chunk(&mut self, dat: &[u8]) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        for byte in dat {
            events.extend(self.feed(*byte));
            while let Some(event) = self.poll() {
                events.push(event);
            }
        }
        events
    }

    /// Drop all buffered state and return to [ParserState::Idle]. Statistics are kept.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.replay.clear();
        self.events.clear();
        self.skipped = 0;
        self.state = ParserState::Idle;
    }

    fn step(&mut self, byte: u8) {
        if self.buf.is_empty() && !self.grammar.is_start(byte) {
            if !self.grammar.is_filler(byte) {
                self.skip(1);
            }
            if self.state != ParserState::Idle || !self.grammar.is_filler(byte) {
                self.state = ParserState::SeekingSync;
            }
            return;
        }

        self.buf.push(byte);
        if self.buf.len() > self.opts.max_frame_len {
            self.reject(DiscardReason::Malformed("frame exceeds maximum length"));
            return;
        }

        match self.grammar.advance(&self.buf) {
            Advance::Need(state) => self.state = state,
            Advance::Complete {
                message_id,
                payload,
                len,
                valid,
            } => {
                let tail = self.buf.split_off(len);
                let data = std::mem::take(&mut self.buf);
                if self.skipped > 0 {
                    debug!(
                        "{} skipped {} bytes before frame",
                        self.grammar.protocol(),
                        self.skipped
                    );
                    self.skipped = 0;
                }
                let frame = Frame {
                    protocol: self.grammar.protocol(),
                    message_id,
                    data,
                    payload,
                    is_valid: valid,
                };
                trace!(
                    "{} frame id={} len={} valid={}",
                    frame.protocol,
                    frame.message_id,
                    frame.data.len(),
                    frame.is_valid
                );
                self.stats.frames += 1;
                self.state = ParserState::Idle;
                self.replay_front(&tail);
                self.events.push_back(SyncEvent::Frame(frame));
            }
            Advance::Mismatch => {
                let buf = std::mem::take(&mut self.buf);
                self.skip(1);
                self.state = ParserState::SeekingSync;
                self.replay_front(&buf[1..]);
            }
            Advance::Reject(reason) => self.reject(reason),
        }
    }

    fn reject(&mut self, reason: DiscardReason) {
        let buf = std::mem::take(&mut self.buf);
        let protocol = self.grammar.protocol();
        match reason {
            DiscardReason::ChecksumMismatch { expected, computed } => {
                debug!(
                    "{protocol} checksum mismatch: expected={expected:#x} computed={computed:#x} len={}",
                    buf.len()
                );
                self.stats.checksum_errors += 1;
            }
            DiscardReason::Malformed(why) => {
                debug!("{protocol} malformed frame: {why} len={}", buf.len());
                self.stats.malformed += 1;
            }
            DiscardReason::NoSync { .. } => {}
        }
        self.events.push_back(SyncEvent::Discarded(Discard {
            protocol,
            reason,
            len: buf.len(),
        }));
        self.state = ParserState::SeekingSync;
        // resume at the byte after the rejected start byte
        self.replay_front(&buf[1..]);
    }

    fn skip(&mut self, n: usize) {
        self.skipped += n;
        self.stats.skipped_bytes += n as u64;
        if self.skipped >= self.opts.lookahead {
            let protocol = self.grammar.protocol();
            debug!("{protocol} no sync in {} bytes", self.skipped);
            self.events.push_back(SyncEvent::Discarded(Discard {
                protocol,
                reason: DiscardReason::NoSync {
                    skipped: self.skipped,
                },
                len: self.skipped,
            }));
            self.skipped = 0;
        }
    }

    fn replay_front(&mut self, dat: &[u8]) {
        for b in dat.iter().rev() {
            self.replay.push_front(*b);
        }
    }
}

/// Decode the first frame in `dat`.
///
/// # Errors
/// [Error::ChecksumMismatch] if a complete frame failed its integrity check,
/// [Error::TruncatedInput] if `dat` ends inside a frame, or [Error::Framing] if no
/// frame start was found.
pub fn decode_one<G: Grammar>(grammar: G, dat: &[u8]) -> Result<Frame> {
    let opts = SyncOpts::builder()
        .lookahead(usize::MAX)
        .max_frame_len(dat.len().max(1))
        .build();
    let mut sync = Synchronizer::with_opts(grammar, opts);
    let mut mismatch = None;
    for byte in dat {
        let mut event = sync.feed(*byte);
        while let Some(evt) = event {
            match evt {
                SyncEvent::Frame(frame) => return Ok(frame),
                SyncEvent::Discarded(Discard {
                    reason: DiscardReason::ChecksumMismatch { expected, computed },
                    ..
                }) => {
                    mismatch.get_or_insert((expected, computed));
                }
                SyncEvent::Discarded(_) => {}
            }
            event = sync.poll();
        }
    }
    if let Some((expected, computed)) = mismatch {
        return Err(Error::ChecksumMismatch { expected, computed });
    }
    if sync.pending() > 0 {
        let actual = sync.pending();
        let minimum = sync
            .grammar
            .frame_len(&sync.buf)
            .unwrap_or(actual + 1);
        return Err(Error::TruncatedInput { actual, minimum });
    }
    Err(Error::Framing {
        skipped: dat.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageId;

    /// Toy grammar: `#`, length byte, payload, xor of payload.
    struct Toy;

    impl Grammar for Toy {
        fn protocol(&self) -> ProtocolId {
            ProtocolId::Ubx
        }

        fn is_start(&self, byte: u8) -> bool {
            byte == b'#'
        }

        fn is_filler(&self, byte: u8) -> bool {
            byte == b'\n'
        }

        fn advance(&self, buf: &[u8]) -> Advance {
            if buf.len() < 2 {
                return Advance::Need(ParserState::AccumulatingLength);
            }
            let len = buf[1] as usize;
            if len == 0 {
                return Advance::Mismatch;
            }
            if len > 8 {
                return Advance::Reject(DiscardReason::Malformed("too long"));
            }
            if buf.len() < 2 + len + 1 {
                return Advance::Need(ParserState::AccumulatingBody);
            }
            let computed = buf[2..2 + len].iter().fold(0, |a, b| a ^ b);
            let expected = buf[2 + len];
            if computed != expected {
                return Advance::Reject(DiscardReason::ChecksumMismatch {
                    expected: expected.into(),
                    computed: computed.into(),
                });
            }
            Advance::Complete {
                message_id: MessageId::Code(u16::from(buf[2])),
                payload: 2..2 + len,
                len: buf.len(),
                valid: true,
            }
        }

        fn frame_len(&self, buf: &[u8]) -> Option<usize> {
            buf.get(1).map(|len| *len as usize + 3)
        }
    }

    fn toy_frame(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![b'#', payload.len() as u8];
        out.extend_from_slice(payload);
        out.push(payload.iter().fold(0, |a, b| a ^ b));
        out
    }

    #[test]
    fn single_frame() {
        let mut sync = Synchronizer::new(Toy);
        assert_eq!(sync.state(), ParserState::Idle);
        let frames = sync.push_chunk(&toy_frame(&[1, 2, 3]));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &[1, 2, 3]);
        assert_eq!(frames[0].message_id, MessageId::Code(1));
        assert_eq!(sync.state(), ParserState::Idle);
        assert_eq!(sync.stats().frames, 1);
    }

    #[test]
    fn push_returns_frame_on_last_byte() {
        let mut sync = Synchronizer::new(Toy);
        let dat = toy_frame(&[7]);
        for b in &dat[..dat.len() - 1] {
            assert!(sync.push(*b).is_none());
        }
        assert_eq!(sync.state(), ParserState::AccumulatingBody);
        assert!(sync.push(dat[dat.len() - 1]).is_some());
    }

    #[test]
    fn resync_after_bad_checksum_finds_embedded_frame() {
        // a corrupt frame whose body contains a complete valid frame
        let inner = toy_frame(&[9]);
        let mut outer = vec![b'#', 6];
        outer.extend_from_slice(&inner);
        outer.extend_from_slice(&[0, 0, 0xff]);

        let mut sync = Synchronizer::new(Toy);
        let events = sync.feed_chunk(&outer);
        assert!(matches!(
            events[0],
            SyncEvent::Discarded(Discard {
                reason: DiscardReason::ChecksumMismatch { .. },
                len: 9,
                ..
            })
        ));
        let frames: Vec<_> = events.into_iter().filter_map(SyncEvent::into_frame).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &[9]);
        assert_eq!(sync.stats().checksum_errors, 1);
    }

    #[test]
    fn repeated_start_bytes_make_progress() {
        let mut sync = Synchronizer::new(Toy);
        // '#' followed by length '#' (35) which is too long; every byte is a start byte
        let events = sync.feed_chunk(&[b'#'; 64]);
        assert!(events.iter().all(|e| matches!(e, SyncEvent::Discarded(_))));
        assert!(sync.pending() <= 1);
        let frames = sync.push_chunk(&toy_frame(&[4, 5]));
        // the leftover '#' plus the new frame's '#' are rejected, then the frame is found
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn mismatch_is_silent() {
        let mut sync = Synchronizer::new(Toy);
        let events = sync.feed_chunk(&[b'#', 0]);
        assert!(events.is_empty());
        assert_eq!(sync.stats().skipped_bytes, 2);
        assert_eq!(sync.state(), ParserState::SeekingSync);
    }

    #[test]
    fn lookahead_reports_no_sync() {
        let opts = SyncOpts::builder().lookahead(10).build();
        let mut sync = Synchronizer::with_opts(Toy, opts);
        let events = sync.feed_chunk(&[0u8; 25]);
        assert_eq!(
            events,
            vec![
                SyncEvent::Discarded(Discard {
                    protocol: ProtocolId::Ubx,
                    reason: DiscardReason::NoSync { skipped: 10 },
                    len: 10,
                });
                2
            ]
        );
        assert_eq!(sync.stats().skipped_bytes, 25);
    }

    #[test]
    fn filler_is_not_skipped() {
        let mut sync = Synchronizer::new(Toy);
        let mut dat = toy_frame(&[1]);
        dat.extend_from_slice(b"\n\n");
        dat.extend_from_slice(&toy_frame(&[2]));
        assert_eq!(sync.push_chunk(&dat).len(), 2);
        assert_eq!(sync.stats().skipped_bytes, 0);
    }

    #[test]
    fn max_frame_len_discards() {
        let opts = SyncOpts::builder().max_frame_len(4).build();
        let mut sync = Synchronizer::with_opts(Toy, opts);
        let events = sync.feed_chunk(&toy_frame(&[1, 2, 3]));
        assert!(matches!(
            events[0],
            SyncEvent::Discarded(Discard {
                reason: DiscardReason::Malformed(_),
                ..
            })
        ));
        assert_eq!(sync.stats().malformed, 1);
    }

    #[test]
    fn reset_clears_partial_frame() {
        let mut sync = Synchronizer::new(Toy);
        sync.push_chunk(&[b'#', 3, 1]);
        assert_eq!(sync.pending(), 3);
        sync.reset();
        assert_eq!(sync.pending(), 0);
        assert_eq!(sync.state(), ParserState::Idle);
        assert_eq!(sync.push_chunk(&toy_frame(&[5])).len(), 1);
    }

    #[test]
    fn decode_one_outcomes() {
        let frame = decode_one(Toy, &toy_frame(&[3, 4])).unwrap();
        assert_eq!(frame.payload(), &[3, 4]);

        let mut bad = toy_frame(&[3, 4]);
        *bad.last_mut().unwrap() ^= 0xff;
        assert!(matches!(
            decode_one(Toy, &bad),
            Err(Error::ChecksumMismatch { .. })
        ));

        let short = toy_frame(&[3, 4, 5]);
        assert!(matches!(
            decode_one(Toy, &short[..4]),
            Err(Error::TruncatedInput {
                actual: 4,
                minimum: 6
            })
        ));

        assert!(matches!(
            decode_one(Toy, b"garbage"),
            Err(Error::Framing { skipped: 7 })
        ));
    }
}
