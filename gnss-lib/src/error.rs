use crate::message::{MessageId, ProtocolId};

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// No frame could be synchronized from the provided bytes.
    #[error("no frame found in {skipped} bytes")]
    Framing { skipped: usize },

    /// A structurally complete frame failed its integrity check.
    #[error("checksum mismatch: expected {expected:#x}, computed {computed:#x}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// Valid frame, but there is no decoder registered for its identifier.
    #[error("unknown message id {0}")]
    UnknownMessageId(MessageId),

    #[error("truncated input: need {minimum} bytes, got {actual}")]
    TruncatedInput { actual: usize, minimum: usize },

    /// Preamble or identifier cross-check failed inside a navigation unit.
    #[error("structure mismatch: {0}")]
    StructureMismatch(String),

    #[error("bit range out of range: offset={offset} width={width} available={available}")]
    OutOfRange {
        offset: usize,
        width: u32,
        available: usize,
    },

    #[error("message id {0} already registered")]
    DuplicateMessageId(MessageId),

    #[error("invalid field {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("expected a {expected} message, got {actual}")]
    WrongProtocol {
        expected: ProtocolId,
        actual: ProtocolId,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
