use core::slice::from_mut as into_slice;
use std::io::{self, ErrorKind, Read, Write};

/// Sequential bit source for the decoder. Bits are MSB first within a byte.
pub trait BitRead {
    /// Read bit or 0 on EOF
    fn read_bit(&mut self) -> io::Result<u8>;
    /// Number of bits handed out so far, including zeros served past EOF
    fn position(&self) -> u64;
    /// Length in bytes of the whole underlying stream, draining what is left unread
    fn stream_len(&mut self) -> io::Result<u64>;
}

/// Sequential bit sink for the encoder. Bits are MSB first within a byte.
pub trait BitWrite {
    /// Writes a single bit, must be 0 or 1
    fn write_bit(&mut self, bit: u8) -> io::Result<()>;
    /// Pads the last partial byte with `padding` bits and flushes the inner writer
    fn flush(&mut self, padding: u8) -> io::Result<()>;
}

/// Arithmetic coder read io for `io::Read` types
pub struct ACReader<R> {
    inner: R,
    buf: u8,
    mask: u8,
    position: u64,
    bytes: u64,
    eof: bool,
}

impl<R: Read> ACReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, buf: 0, mask: 0, position: 0, bytes: 0, eof: false }
    }

    /// Bytes actually taken from the inner reader.
    pub fn bytes_read(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        if self.eof {
            return Ok(0);
        }
        let mut byte = 0;
        match self.inner.read_exact(into_slice(&mut byte)) {
            Ok(()) => {
                self.bytes += 1;
                Ok(byte)
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                self.eof = true;
                Ok(0)
            }
            Err(err) => Err(err),
        }
    }
}

impl<R: Read> BitRead for ACReader<R> {
    fn read_bit(&mut self) -> io::Result<u8> {
        self.mask >>= 1; // move to next bit
        if self.mask == 0 {
            self.buf = self.read_byte()?; // fill
            self.mask = 1 << 7; // then move to first bit
        }
        self.position += 1;
        Ok((self.buf & self.mask > 0).into())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn stream_len(&mut self) -> io::Result<u64> {
        if !self.eof {
            self.bytes += io::copy(&mut self.inner, &mut io::sink())?;
            self.eof = true;
        }
        Ok(self.bytes)
    }
}

/// Arithmetic coder write io for `io::Write` types
pub struct ACWriter<W> {
    inner: W,
    buf: u8,
    idx: u8,
    bytes: u64,
}

impl<W: Write> ACWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, buf: 0, idx: 0, bytes: 0 }
    }

    /// Complete bytes handed to the inner writer.
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> BitWrite for ACWriter<W> {
    fn write_bit(&mut self, bit: u8) -> io::Result<()> {
        debug_assert!(bit <= 1, "Provided value wasn't a valid bit");

        self.buf = (self.buf << 1) | (bit & 1);
        self.idx += 1;
        if self.idx == 8 {
            self.inner.write_all(&[self.buf])?;
            self.bytes += 1;
            self.idx = 0;
        }
        Ok(())
    }

    fn flush(&mut self, padding: u8) -> io::Result<()> {
        while self.idx > 0 {
            self.write_bit(padding)?;
        }
        self.inner.flush()
    }
}
