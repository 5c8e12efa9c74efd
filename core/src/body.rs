//! In-memory body stream.
//!
//! # Design
//! `Body` is a shared handle to a seekable byte buffer, the way a stream
//! resource is shared between message copies. Cloning a `Body` clones the
//! handle, not the bytes; `Body::ptr_eq` is the identity the fluent
//! `with_body` compares against. All I/O is local to the buffer, so every
//! operation except `from_reader` is infallible.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::rc::Rc;

use crate::error::AdapterResult;

#[derive(Clone, Default)]
pub struct Body {
    buffer: Rc<RefCell<Cursor<Vec<u8>>>>,
}

impl Body {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read a native byte source to its end into a new body.
    pub fn from_reader(mut source: impl Read) -> AdapterResult<Self> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        Ok(Self::from(bytes))
    }

    /// Whether both handles point at the same stream.
    pub fn ptr_eq(a: &Body, b: &Body) -> bool {
        Rc::ptr_eq(&a.buffer, &b.buffer)
    }

    /// Every byte as a string, independent of the current position.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(self.buffer.borrow().get_ref()).into_owned()
    }

    /// The bytes from the current position to the end; moves to the end.
    pub fn remaining(&self) -> String {
        let mut rest = Vec::new();
        // Reading from a cursor cannot fail.
        let _ = self.buffer.borrow_mut().read_to_end(&mut rest);
        String::from_utf8_lossy(&rest).into_owned()
    }

    /// Read up to `len` bytes from the current position.
    pub fn read_bytes(&self, len: usize) -> Vec<u8> {
        let mut chunk = vec![0; len];
        let read = self.buffer.borrow_mut().read(&mut chunk).unwrap_or(0);
        chunk.truncate(read);
        chunk
    }

    /// Write at the current position, growing the buffer as needed. Returns
    /// the number of bytes written.
    pub fn write_bytes(&self, bytes: &[u8]) -> usize {
        self.buffer.borrow_mut().write(bytes).unwrap_or(0)
    }

    pub fn size(&self) -> Option<u64> {
        Some(self.buffer.borrow().get_ref().len() as u64)
    }

    pub fn tell(&self) -> u64 {
        self.buffer.borrow().position()
    }

    pub fn eof(&self) -> bool {
        let buffer = self.buffer.borrow();
        buffer.position() >= buffer.get_ref().len() as u64
    }

    pub fn rewind(&self) {
        self.buffer.borrow_mut().set_position(0);
    }

    /// Move to `pos`; seeking before the start is an error.
    pub fn seek_to(&self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.borrow_mut().seek(pos)
    }

    pub fn is_readable(&self) -> bool {
        true
    }

    pub fn is_writable(&self) -> bool {
        true
    }

    pub fn is_seekable(&self) -> bool {
        true
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            buffer: Rc::new(RefCell::new(Cursor::new(bytes))),
        }
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes().to_vec())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

/// Renders the whole stream from the start and leaves the position at the
/// end, as casting a stream to a string does.
impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.rewind();
        f.write_str(&self.remaining())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buffer = self.buffer.borrow();
        f.debug_struct("Body")
            .field("size", &buffer.get_ref().len())
            .field("position", &buffer.position())
            .finish()
    }
}

impl Read for &Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.buffer.borrow_mut().read(buf)
    }
}

impl Write for &Body {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for &Body {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.buffer.borrow_mut().seek(pos)
    }
}
