//! Byte slice reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A cursor over a borrowed byte slice.
///
/// Every read checks the remaining length first, so truncated or hostile input
/// surfaces as [`BufferError`] rather than a panic.
///
/// # Example
///
/// ```
/// use uast_buffers::Reader;
///
/// let data = [0x01, 0xac, 0x02];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8(), Ok(0x01));
/// assert_eq!(reader.vu64(), Ok(300));
/// assert!(reader.is_empty());
/// ```
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Reader<'a> {
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Returns the number of remaining bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.uint8.len() - self.x
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn ensure(&self, need: usize) -> Result<(), BufferError> {
        let left = self.size();
        if need > left {
            return Err(BufferError::EndOfBuffer { need, left });
        }
        Ok(())
    }

    /// Advances the cursor by `length` bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.ensure(length)?;
        self.x += length;
        Ok(())
    }

    /// Returns the next `size` bytes and advances past them.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.ensure(size)?;
        let bin = &self.uint8[self.x..self.x + size];
        self.x += size;
        Ok(bin)
    }

    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        self.ensure(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    /// Reads an unsigned 32-bit integer (little-endian).
    pub fn u32_le(&mut self) -> Result<u32, BufferError> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.buf(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    /// Reads an unsigned 64-bit integer (little-endian).
    pub fn u64_le(&mut self) -> Result<u64, BufferError> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.buf(8)?);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads a 64-bit float (little-endian IEEE 754).
    pub fn f64_le(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_bits(self.u64_le()?))
    }

    /// Reads an unsigned LEB128 varint (at most 10 bytes).
    pub fn vu64(&mut self) -> Result<u64, BufferError> {
        let mut result: u64 = 0;
        let mut shift = 0u32;
        for _ in 0..10 {
            let b = self.u8()? as u64;
            result |= (b & 0x7f) << shift;
            if b & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(BufferError::VarIntTooLong)
    }

    /// Reads `size` bytes as a UTF-8 string slice.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let bin = self.buf(size)?;
        str::from_utf8(bin).map_err(|_| BufferError::InvalidUtf8)
    }
}
