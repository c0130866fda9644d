//! Growable byte buffer writer.

/// A byte buffer writer that grows as needed.
///
/// # Example
///
/// ```
/// use uast_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.vu64(300);
/// let data = writer.flush();
/// assert_eq!(data, [0x01, 0xac, 0x02]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            uint8: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written since the last flush.
    #[inline]
    pub fn size(&self) -> usize {
        self.uint8.len()
    }

    /// Returns the written bytes and resets the writer.
    pub fn flush(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.uint8)
    }

    /// Discards written bytes, keeping the allocation.
    pub fn reset(&mut self) {
        self.uint8.clear();
    }

    /// Borrows the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.uint8.push(val);
    }

    /// Writes an unsigned 32-bit integer (little-endian).
    #[inline]
    pub fn u32_le(&mut self, val: u32) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned 64-bit integer (little-endian).
    #[inline]
    pub fn u64_le(&mut self, val: u64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes a 64-bit float (little-endian IEEE 754).
    #[inline]
    pub fn f64_le(&mut self, val: f64) {
        self.uint8.extend_from_slice(&val.to_le_bytes());
    }

    /// Writes an unsigned LEB128 varint.
    pub fn vu64(&mut self, mut n: u64) {
        loop {
            let low7 = (n & 0x7f) as u8;
            n >>= 7;
            if n == 0 {
                self.uint8.push(low7);
                return;
            }
            self.uint8.push(low7 | 0x80);
        }
    }

    /// Writes raw bytes.
    #[inline]
    pub fn buf(&mut self, buf: &[u8]) {
        self.uint8.extend_from_slice(buf);
    }

    /// Writes a string as UTF-8 and returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.uint8.extend_from_slice(s.as_bytes());
        s.len()
    }
}
