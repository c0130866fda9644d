//! Error types for the node graph codec.

use std::io;

use thiserror::Error;
use uast_buffers::BufferError;

pub type EncodeResult<T> = Result<T, EncodeError>;
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while writing a tree.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
    /// Internal bookkeeping went wrong; the output must not be used.
    #[error("encoder invariant violated: {0}")]
    InvariantViolated(String),
}

/// Errors raised while parsing a single protobuf message body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    #[error(transparent)]
    Buffer(#[from] BufferError),
    #[error("field {field} has unexpected wire type {wire}")]
    WireType { field: u64, wire: u8 },
    #[error("unsupported wire type {0}")]
    UnknownWireType(u8),
    #[error("field number 0 is reserved")]
    ZeroField,
    #[error("length does not fit in memory")]
    LengthOverflow,
}

/// Errors raised while reading a stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),

    // stream format
    #[error("not a graph file")]
    BadMagic,
    #[error("unsupported version: {0:#x}")]
    UnsupportedVersion(u32),
    #[error("unexpected end of stream in header")]
    TruncatedHeader,
    #[error("malformed graph header: {0}")]
    MalformedHeader(#[source] ProtoError),
    #[error("unexpected end of stream in record")]
    TruncatedRecord,
    #[error("malformed record #{index}: {source}")]
    MalformedRecord {
        index: usize,
        #[source]
        source: ProtoError,
    },
    #[error("record of {size} bytes exceeds the {max} byte limit")]
    RecordTooLarge { size: u64, max: usize },

    // graph consistency
    #[error("node IDs should be ascending: {id} after {prev}")]
    NonAscendingId { id: u64, prev: u64 },
    #[error("duplicate node with id {0}")]
    DuplicateId(u64),
    #[error("node id overflow after {0}")]
    IdOverflow(u64),
    #[error("node {id}: keys_from refers to an undefined node {from}")]
    UndefinedKeysFrom { id: u64, from: u64 },
    #[error("node {id} refers to an undefined node {target}")]
    DanglingReference { id: u64, target: u64 },
    #[error("root node {0} is not defined")]
    UndefinedRoot(u64),
    #[error("node {0} has both a value and children")]
    AmbiguousRecord(u64),
    #[error("node {id}: number of keys doesn't match a number of values: {keys} vs {values}")]
    KeyValueMismatch { id: u64, keys: usize, values: usize },
    #[error("node {id}: key {key} is not a string")]
    NonStringKey { id: u64, key: u64 },
    #[error("node {0} is not defined")]
    UndefinedNode(u64),

    // shape
    #[error("not a tree: node {0} is its own ancestor")]
    NotATree(u64),
}

impl DecodeError {
    /// Whether the error came from the byte layout rather than graph shape.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            DecodeError::BadMagic
                | DecodeError::UnsupportedVersion(_)
                | DecodeError::TruncatedHeader
                | DecodeError::MalformedHeader(_)
                | DecodeError::TruncatedRecord
                | DecodeError::MalformedRecord { .. }
                | DecodeError::RecordTooLarge { .. }
        )
    }
}
