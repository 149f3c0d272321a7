use std::cmp::min;
use std::io::{Error, ErrorKind, Read, Result, Write};
use std::time::Duration;

use crate::conn::SetReadTimeout;

/// An in-memory stream standing in for the server socket in unit tests.
///
/// Reads are served from `read_buf`; everything the client writes is captured
/// in `written_buf` for assertions.
#[derive(Debug)]
pub struct MockStream {
    read_buf: Vec<u8>,
    read_pos: usize,
    pub written_buf: Vec<u8>,
    err_on_read: bool,
    eof_on_read: bool,
    eof_after_buf: bool,
    read_delay: usize,
    block_on_read: usize,
    pub read_timeout: Option<Duration>,
}

impl Default for MockStream {
    fn default() -> Self {
        MockStream {
            read_buf: Vec::new(),
            read_pos: 0,
            written_buf: Vec::new(),
            err_on_read: false,
            eof_on_read: false,
            eof_after_buf: false,
            read_delay: 0,
            block_on_read: 0,
            read_timeout: None,
        }
    }
}

impl MockStream {
    pub fn new(read_buf: Vec<u8>) -> MockStream {
        MockStream::default().with_buf(read_buf)
    }

    pub fn with_buf(mut self, read_buf: Vec<u8>) -> MockStream {
        self.read_buf = read_buf;
        self
    }

    /// Every read reports the peer closed the connection.
    pub fn with_eof(mut self) -> MockStream {
        self.eof_on_read = true;
        self
    }

    /// Reads report a closed connection once the buffered data runs out,
    /// instead of panicking the test with an unexpected-EOF error.
    pub fn with_eof_after_buf(mut self) -> MockStream {
        self.eof_after_buf = true;
        self
    }

    pub fn with_err(mut self) -> MockStream {
        self.err_on_read = true;
        self
    }

    /// Reads return a single byte at a time, exercising reassembly of
    /// responses split across read boundaries.
    pub fn with_delay(mut self) -> MockStream {
        self.read_delay = usize::MAX;
        self
    }

    /// The next `n` reads fail with `WouldBlock` before any data is served.
    pub fn with_wouldblock(mut self, n: usize) -> MockStream {
        self.block_on_read = n;
        self
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.eof_on_read {
            return Ok(0);
        }
        if self.err_on_read {
            return Err(Error::new(ErrorKind::Other, "MockStream Error"));
        }
        if self.block_on_read > 0 {
            self.block_on_read -= 1;
            return Err(Error::new(ErrorKind::WouldBlock, "not ready"));
        }
        if self.read_pos >= self.read_buf.len() {
            if self.eof_after_buf {
                return Ok(0);
            }
            return Err(Error::new(ErrorKind::UnexpectedEof, "EOF"));
        }
        let mut write_len = min(buf.len(), self.read_buf.len() - self.read_pos);
        if self.read_delay > 0 {
            self.read_delay -= 1;
            write_len = min(write_len, 1);
        }
        let max_pos = self.read_pos + write_len;
        buf[..write_len].copy_from_slice(&self.read_buf[self.read_pos..max_pos]);
        self.read_pos += write_len;
        Ok(write_len)
    }
}

impl SetReadTimeout for MockStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> crate::error::Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.written_buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
