//! uast-buffers - byte buffers for the UAST binary codecs.
//!
//! [`Writer`] accumulates bytes, [`Reader`] walks a borrowed slice and reports
//! running past the end as an error instead of panicking.

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// Errors raised by [`Reader`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("unexpected end of buffer: need {need} bytes, {left} left")]
    EndOfBuffer { need: usize, left: usize },
    #[error("variable-length integer is too long")]
    VarIntTooLong,
    #[error("invalid UTF-8")]
    InvalidUtf8,
}

/// Number of bytes an unsigned LEB128 varint of `v` occupies.
///
/// Zero still takes one byte.
#[inline]
pub fn varint_size(v: u64) -> usize {
    let bits = 64 - (v | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_size_matches_encoding() {
        for v in [0u64, 1, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            let mut w = Writer::new();
            w.vu64(v);
            assert_eq!(varint_size(v), w.size(), "value {v}");
        }
        assert_eq!(varint_size(0), 1);
        assert_eq!(varint_size(u64::MAX), 10);
    }
}
