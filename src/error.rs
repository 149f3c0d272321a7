use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
#[cfg(feature = "native-tls")]
use std::net::TcpStream;
use std::result;
use std::string::FromUtf8Error;

use bufstream::IntoInnerError as BufError;
#[cfg(feature = "native-tls")]
use native_tls::Error as TlsError;
#[cfg(feature = "native-tls")]
use native_tls::HandshakeError as TlsHandshakeError;

/// A convenience wrapper around `Result` for `popcl::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur in the POP3 client.
#[derive(Debug)]
pub enum Error {
    /// An `io::Error` that occurred while trying to read or write to a network stream.
    Io(IoError),
    /// An error from the `native_tls` library during the TLS handshake.
    #[cfg(feature = "native-tls")]
    TlsHandshake(TlsHandshakeError<TcpStream>),
    /// An error from the `native_tls` library while building the connector or
    /// loading trust anchors.
    #[cfg(feature = "native-tls")]
    Tls(TlsError),
    /// A response from the server that did not carry the `+OK` status marker.
    /// The full response text is preserved as the error detail.
    ErrResponse(String),
    /// The connection was terminated unexpectedly.
    ConnectionLost,
    /// Error parsing a server response.
    Parse(ParseError),
    /// Invalid configuration detected before any network activity.
    Config(String),
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error::Io(err)
    }
}

impl<T> From<BufError<T>> for Error {
    fn from(err: BufError<T>) -> Error {
        Error::Io(err.into())
    }
}

#[cfg(feature = "native-tls")]
impl From<TlsHandshakeError<TcpStream>> for Error {
    fn from(err: TlsHandshakeError<TcpStream>) -> Error {
        Error::TlsHandshake(err)
    }
}

#[cfg(feature = "native-tls")]
impl From<TlsError> for Error {
    fn from(err: TlsError) -> Error {
        Error::Tls(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Io(ref e) => fmt::Display::fmt(e, f),
            #[cfg(feature = "native-tls")]
            Error::Tls(ref e) => fmt::Display::fmt(e, f),
            #[cfg(feature = "native-tls")]
            Error::TlsHandshake(ref e) => fmt::Display::fmt(e, f),
            Error::ErrResponse(ref text) => write!(f, "server error response: {}", text),
            Error::ConnectionLost => f.write_str("connection lost"),
            Error::Parse(ref e) => fmt::Display::fmt(e, f),
            Error::Config(ref msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            #[cfg(feature = "native-tls")]
            Error::Tls(ref e) => Some(e),
            #[cfg(feature = "native-tls")]
            Error::TlsHandshake(ref e) => Some(e),
            Error::Parse(ParseError::DataNotUtf8(ref e)) => Some(e),
            _ => None,
        }
    }
}

/// An error parsing a well-formed-looking server response.
#[derive(Debug)]
pub enum ParseError {
    /// The STAT status line did not carry a numeric count and size.
    StatusLine(String),
    /// Response data could not be interpreted as UTF-8 text.
    DataNotUtf8(FromUtf8Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParseError::StatusLine(ref line) => {
                write!(f, "unable to parse status line: {}", line)
            }
            ParseError::DataNotUtf8(_) => f.write_str("unable to parse data as UTF-8 text"),
        }
    }
}

impl StdError for ParseError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            ParseError::DataNotUtf8(ref e) => Some(e),
            _ => None,
        }
    }
}
