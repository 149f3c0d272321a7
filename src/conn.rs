use std::fmt::{Debug, Formatter};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

#[cfg(feature = "native-tls")]
use native_tls::TlsStream;

use crate::error::{Error, Result};

/// Must be implemented for a transport in order for a [`Client`](crate::Client)
/// using that transport to support read timeouts.
///
/// See also `std::net::TcpStream::set_read_timeout`.
pub trait SetReadTimeout {
    /// Set the timeout for subsequent reads to the given one.
    ///
    /// If `timeout` is `None`, the read timeout is removed.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;
}

impl SetReadTimeout for TcpStream {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        TcpStream::set_read_timeout(self, timeout).map_err(Error::Io)
    }
}

#[cfg(feature = "native-tls")]
impl SetReadTimeout for TlsStream<TcpStream> {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.get_ref().set_read_timeout(timeout).map_err(Error::Io)
    }
}

/// POP3 connection trait of a read/write stream.
pub trait Pop3Connection: Read + Write + Send + SetReadTimeout + private::Sealed {}

impl<T> Pop3Connection for T where T: Read + Write + Send + SetReadTimeout {}

impl Debug for dyn Pop3Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "POP3 connection")
    }
}

/// A boxed connection type, either plaintext or TLS-wrapped.
pub type Connection = Box<dyn Pop3Connection>;

impl SetReadTimeout for Connection {
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_read_timeout(timeout)
    }
}

mod private {
    use super::{Read, SetReadTimeout, Write};

    pub trait Sealed {}

    impl<T> Sealed for T where T: Read + Write + SetReadTimeout {}
}
