//! Stream layout constants.

/// First four bytes of every stream.
pub const MAGIC: [u8; 4] = *b"\x00bgr";

/// Current format version, written as a little-endian `u32` after [`MAGIC`].
pub const VERSION: u32 = 1;

/// Size of the magic + version preamble.
pub const PREAMBLE_LEN: usize = 8;

/// Default cap on a single length-prefixed message (10 MiB).
pub const DEFAULT_MAX_RECORD_SIZE: usize = 10 * 1024 * 1024;

/// Protobuf wire types.
pub(crate) mod wire {
    pub const VARINT: u8 = 0;
    pub const FIXED64: u8 = 1;
    pub const LEN: u8 = 2;
    pub const FIXED32: u8 = 5;
}

/// Field numbers of the graph header message.
pub(crate) mod header_field {
    pub const LAST_ID: u64 = 1;
    pub const ROOT: u64 = 2;
    pub const METADATA: u64 = 3;
}

/// Field numbers of the node record message.
pub(crate) mod node_field {
    pub const ID: u64 = 1;
    pub const KEYS: u64 = 2;
    pub const VALUES: u64 = 3;
    pub const KEYS_FROM: u64 = 4;
    pub const VALUES_OFFS: u64 = 5;
    pub const IS_OBJECT: u64 = 6;
    pub const STRING: u64 = 7;
    pub const INT: u64 = 8;
    pub const UINT: u64 = 9;
    pub const BOOL: u64 = 10;
    pub const FLOAT: u64 = 11;
}
