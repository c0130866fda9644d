//! Varint length-prefixed message framing over `std::io` streams.

use std::io::{self, ErrorKind, Read, Write};

use uast_buffers::Writer;

use crate::record::Message;

/// Writes messages as `varint(len) ++ body`.
pub struct DelimitedWriter<W> {
    inner: W,
    body: Writer,
    prefix: Writer,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            body: Writer::with_capacity(256),
            prefix: Writer::with_capacity(10),
        }
    }

    pub fn write_msg<M: Message>(&mut self, msg: &M) -> io::Result<usize> {
        self.write_with(|w| msg.encode(w))
    }

    /// Frames whatever `encode` writes. Returns the body size.
    pub fn write_with<F: FnOnce(&mut Writer)>(&mut self, encode: F) -> io::Result<usize> {
        self.body.reset();
        encode(&mut self.body);
        let size = self.body.size();
        self.prefix.reset();
        self.prefix.vu64(size as u64);
        self.inner.write_all(self.prefix.as_slice())?;
        self.inner.write_all(self.body.as_slice())?;
        Ok(size)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Failure while pulling one frame off the stream.
#[derive(Debug)]
pub enum FrameError {
    Io(io::Error),
    /// The stream ended inside a frame.
    UnexpectedEof,
    /// The length prefix is not a valid varint.
    BadPrefix,
    TooLarge { size: u64, max: usize },
}

/// Reads `varint(len) ++ body` frames, refusing bodies above `max_size`.
pub struct DelimitedReader<R> {
    inner: R,
    max_size: usize,
    buf: Vec<u8>,
}

impl<R: Read> DelimitedReader<R> {
    pub fn new(inner: R, max_size: usize) -> Self {
        Self {
            inner,
            max_size,
            buf: Vec::new(),
        }
    }

    /// Returns the next frame body, or `None` at a clean end of stream.
    pub fn read_frame(&mut self) -> Result<Option<&[u8]>, FrameError> {
        let Some(size) = self.read_prefix()? else {
            return Ok(None);
        };
        if size > self.max_size as u64 {
            return Err(FrameError::TooLarge {
                size,
                max: self.max_size,
            });
        }
        self.buf.clear();
        self.buf.resize(size as usize, 0);
        self.inner.read_exact(&mut self.buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                FrameError::UnexpectedEof
            } else {
                FrameError::Io(e)
            }
        })?;
        Ok(Some(&self.buf))
    }

    fn read_prefix(&mut self) -> Result<Option<u64>, FrameError> {
        let mut result: u64 = 0;
        for i in 0..10 {
            let Some(b) = self.read_byte()? else {
                if i == 0 {
                    return Ok(None);
                }
                return Err(FrameError::UnexpectedEof);
            };
            result |= ((b & 0x7f) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(Some(result));
            }
        }
        Err(FrameError::BadPrefix)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, FrameError> {
        let mut b = [0u8; 1];
        loop {
            match self.inner.read(&mut b) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(b[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FrameError::Io(e)),
            }
        }
    }
}
