//! Streaming frame synchronization.
//!
//! A [Synchronizer] drives a protocol [Grammar] one byte at a time, finding frame
//! boundaries in an untrusted byte stream, validating integrity, and resynchronizing
//! after garbage or corrupt frames.
mod multi;
mod reader;
mod synchronizer;

use std::ops::Range;

use derive_more::From;
use typed_builder::TypedBuilder;

use crate::message::{MessageId, ProtocolId};

pub use multi::*;
pub use reader::*;
pub use synchronizer::*;

#[cfg(feature = "serde")]
use serde::Serialize;

/// A synchronized, delimited unit of protocol data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Frame {
    pub protocol: ProtocolId,
    pub message_id: MessageId,
    /// Complete frame bytes, start marker through checksum.
    #[cfg_attr(feature = "serde", serde(with = "serde_bytes"))]
    pub data: Vec<u8>,
    /// Location of the message payload in `data`.
    pub payload: Range<usize>,
    /// True when the integrity check was present and passed. Only NMEA sentences without
    /// a checksum produce frames with this unset.
    pub is_valid: bool,
}

impl Frame {
    /// The message payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload.clone()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Synchronizer state, reported by a [Grammar] after each byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ParserState {
    /// Nothing buffered, no bytes seen since the last frame.
    #[default]
    Idle,
    /// Looking for, or partway through, a start marker.
    SeekingSync,
    /// Reading the header containing the length field.
    AccumulatingLength,
    AccumulatingBody,
    AwaitingChecksum,
}

/// Why buffered bytes were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum DiscardReason {
    /// No start marker found in `skipped` bytes.
    NoSync { skipped: usize },
    /// Frame was structurally complete but failed its integrity check.
    ChecksumMismatch { expected: u32, computed: u32 },
    /// Frame structure was invalid before it could complete.
    Malformed(&'static str),
}

/// Bytes dropped by a synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Discard {
    pub protocol: ProtocolId,
    pub reason: DiscardReason,
    /// Number of bytes dropped.
    pub len: usize,
}

/// Everything a synchronizer can report for a byte.
#[derive(Debug, Clone, PartialEq, Eq, From)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum SyncEvent {
    Frame(Frame),
    Discarded(Discard),
}

impl SyncEvent {
    #[must_use]
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            SyncEvent::Frame(frame) => Some(frame),
            SyncEvent::Discarded(_) => None,
        }
    }
}

/// Running counters for a single synchronizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SyncStats {
    /// Frames emitted, including NMEA sentences without a checksum.
    pub frames: u64,
    pub checksum_errors: u64,
    pub malformed: u64,
    /// Bytes that were not part of any frame attempt.
    pub skipped_bytes: u64,
}

impl SyncStats {
    pub(crate) fn merge(&mut self, other: &SyncStats) {
        self.frames += other.frames;
        self.checksum_errors += other.checksum_errors;
        self.malformed += other.malformed;
        self.skipped_bytes += other.skipped_bytes;
    }
}

/// Synchronizer options.
#[derive(Debug, Clone, TypedBuilder)]
pub struct SyncOpts {
    /// Number of skipped bytes after which a [DiscardReason::NoSync] is reported.
    #[builder(default = 4096)]
    pub lookahead: usize,
    /// Frames buffering more than this many bytes are discarded as malformed.
    #[builder(default = 16384)]
    pub max_frame_len: usize,
}

impl Default for SyncOpts {
    fn default() -> Self {
        SyncOpts::builder().build()
    }
}

/// Result of offering a [Grammar] the bytes buffered so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Frame is incomplete.
    Need(ParserState),
    /// The first `len` bytes form a complete frame.
    Complete {
        message_id: MessageId,
        payload: Range<usize>,
        len: usize,
        valid: bool,
    },
    /// The first buffered byte turned out not to start a frame. Not reported.
    Mismatch,
    /// A frame attempt failed and is reported as a [Discard].
    Reject(DiscardReason),
}

/// Framing rules for a single protocol.
///
/// Implementations are stateless; all state lives in the [Synchronizer] buffer.
pub trait Grammar {
    fn protocol(&self) -> ProtocolId;

    /// True if `byte` may start a frame.
    fn is_start(&self, byte: u8) -> bool;

    /// Bytes between frames that are expected and not counted as skipped, e.g., line
    /// endings.
    fn is_filler(&self, _byte: u8) -> bool {
        false
    }

    /// Inspect `buf`, which starts with a start byte and has just had one byte appended.
    fn advance(&self, buf: &[u8]) -> Advance;

    /// Total frame length, if it can be determined from `buf`.
    fn frame_len(&self, _buf: &[u8]) -> Option<usize> {
        None
    }
}
