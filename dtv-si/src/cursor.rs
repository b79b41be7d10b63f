//! Bounds-checked read cursor over a byte buffer.
//!
//! All multi-byte integers on the wire are big-endian; the cursor
//! converts to host order at the point of read, so no raw wire-order
//! integer ever escapes this layer. The source buffer is never mutated.

use crate::error::SiError;

/// Read cursor with explicit bounds checking.
///
/// Every read that would advance past the end of the buffer fails with
/// [`SiError::ShortRead`] carrying the requested and available counts.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn ensure(&self, wanted: usize) -> Result<(), SiError> {
        let available = self.remaining();
        if wanted > available {
            return Err(SiError::ShortRead { wanted, available });
        }
        Ok(())
    }

    /// Read exactly `n` bytes and advance.
    pub fn read_fixed(&mut self, n: usize) -> Result<&'a [u8], SiError> {
        self.ensure(n)?;
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, SiError> {
        self.ensure(1)?;
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16, SiError> {
        self.ensure(2)?;
        let v = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    pub fn read_u24(&mut self) -> Result<u32, SiError> {
        self.ensure(3)?;
        let b = &self.buf[self.pos..self.pos + 3];
        self.pos += 3;
        Ok(((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32)
    }

    pub fn read_u32(&mut self) -> Result<u32, SiError> {
        self.ensure(4)?;
        let v = u32::from_be_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(v)
    }

    pub fn peek_u8(&self) -> Result<u8, SiError> {
        self.ensure(1)?;
        Ok(self.buf[self.pos])
    }

    pub fn peek_u16(&self) -> Result<u16, SiError> {
        self.ensure(2)?;
        Ok(u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]))
    }

    pub fn peek_u24(&self) -> Result<u32, SiError> {
        self.ensure(3)?;
        let b = &self.buf[self.pos..self.pos + 3];
        Ok(((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32)
    }

    pub fn peek_u32(&self) -> Result<u32, SiError> {
        self.ensure(4)?;
        Ok(u32::from_be_bytes([
            self.buf[self.pos],
            self.buf[self.pos + 1],
            self.buf[self.pos + 2],
            self.buf[self.pos + 3],
        ]))
    }

    pub fn skip(&mut self, n: usize) -> Result<(), SiError> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Split off a sub-cursor over the next `declared` bytes, as given
    /// by a length field already read from the wire. Fails with
    /// [`SiError::Truncated`] when the declared length overruns the
    /// buffer, so callers can apply the partial-result policy.
    pub fn take_declared(&mut self, declared: usize) -> Result<Cursor<'a>, SiError> {
        let remaining = self.remaining();
        if declared > remaining {
            return Err(SiError::Truncated { declared, remaining });
        }
        let sub = Cursor::new(&self.buf[self.pos..self.pos + declared]);
        self.pos += declared;
        Ok(sub)
    }

    /// The unread tail of the buffer, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}
