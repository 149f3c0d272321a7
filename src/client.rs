use std::io::{self, Read, Write};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use bufstream::BufStream;

use crate::conn::SetReadTimeout;
use crate::error::{Error, ParseError, Result};
use crate::mailbox::Mailbox;
use crate::message::{is_terminated, strip_terminator, RetrievedMessage};

const LF: u8 = 0x0a;
static OK_MARKER: &[u8; 3] = b"+OK";

/// How many times a read is re-attempted when the transport reports a
/// retryable condition before the failure is treated as fatal.
const MAX_RETRIES: u32 = 8;

/// An (unauthenticated) handle to talk to a POP3 server, in the protocol's
/// AUTHORIZATION state. This is what you get when first connecting.
///
/// A successful call to [`Client::login`] will return a [`Session`] instance
/// that provides the mailbox verbs. The split enforces the command ordering
/// at the type level: no data command can be issued before the server has
/// accepted the credentials.
#[derive(Debug)]
pub struct Client<T: Read + Write> {
    stream: BufStream<T>,
    /// Enable some client debugging output: all traffic to and from the
    /// server is printed to stdout prefixed with `C:` and `S:`.
    pub debug: bool,
}

/// An authenticated POP3 session, in the protocol's TRANSACTION state.
///
/// End the session with [`Session::quit`] so the server enters its UPDATE
/// state and commits pending deletions; some servers discard `DELE`s when
/// the socket simply closes.
#[derive(Debug)]
pub struct Session<T: Read + Write> {
    client: Client<T>,
    login_response: String,
}

// The wire primitives live on `Client`; `Session` derefs to it.
impl<T: Read + Write> Deref for Session<T> {
    type Target = Client<T>;

    fn deref(&self) -> &Client<T> {
        &self.client
    }
}

impl<T: Read + Write> DerefMut for Session<T> {
    fn deref_mut(&mut self) -> &mut Client<T> {
        &mut self.client
    }
}

impl<T: Read + Write> Client<T> {
    /// Creates a new client over the given stream.
    ///
    /// The greeting is *not* consumed; callers that hand over a raw stream
    /// (rather than going through [`ClientBuilder`](crate::ClientBuilder))
    /// must call [`Client::read_greeting`] before issuing any command.
    pub fn new(stream: T) -> Client<T> {
        Client {
            stream: BufStream::new(stream),
            debug: false,
        }
    }

    /// Reads and checks the server greeting. A POP3 server speaks first; the
    /// greeting is one `+OK` status line sent on connect.
    pub fn read_greeting(&mut self) -> Result<Vec<u8>> {
        self.read_response()
    }

    /// Log in to the POP3 server with `USER`/`PASS`.
    ///
    /// Both steps must answer `+OK`; there is no partial-credential recovery
    /// in POP3, so any failure is final and the client is handed back
    /// together with the error.
    pub fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Session<T>, (Error, Client<T>)> {
        match self.do_login(username, password) {
            Ok(login_response) => Ok(Session {
                client: self,
                login_response,
            }),
            Err(err) => Err((err, self)),
        }
    }

    fn do_login(&mut self, username: &str, password: &str) -> Result<String> {
        self.run_command(&format!("USER {}", username))?;
        let user = self.read_response()?;
        self.run_command(&format!("PASS {}", password))?;
        let pass = self.read_response()?;

        let mut response = String::from_utf8_lossy(&user).into_owned();
        response.push_str(&String::from_utf8_lossy(&pass));
        Ok(response)
    }

    /// Issues `STLS` and waits for the go-ahead, leaving the stream ready
    /// for an in-place TLS handshake. The greeting must have been read
    /// first.
    pub(crate) fn begin_tls(&mut self) -> Result<()> {
        self.run_command("STLS")?;
        self.read_response().map(|_| ())
    }

    /// Consumes the client and gives back the underlying stream, e.g. for
    /// wrapping it in a TLS layer after a `STLS` exchange.
    pub(crate) fn into_inner(self) -> Result<T> {
        Ok(self.stream.into_inner()?)
    }

    /// Writes one command line, appending CRLF.
    pub(crate) fn run_command(&mut self, command: &str) -> Result<()> {
        self.write_line(command.as_bytes())
    }

    /// Reads one status line and classifies it: a line whose first three
    /// bytes are `+OK` (matched case-insensitively) is a success, anything
    /// else becomes [`Error::ErrResponse`] carrying the full response text.
    pub(crate) fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        self.read_line(&mut line)?;
        if line.len() >= 3 && line[..3].eq_ignore_ascii_case(OK_MARKER) {
            Ok(line)
        } else {
            Err(Error::ErrResponse(
                String::from_utf8_lossy(&line).trim_end().to_string(),
            ))
        }
    }

    /// Appends one LF-terminated line from the server onto `into`.
    ///
    /// A zero-byte read means the peer closed the connection. A read that
    /// fails with a retryable condition is re-attempted a bounded number of
    /// times; any other failure is fatal.
    pub(crate) fn read_line(&mut self, into: &mut Vec<u8>) -> Result<usize> {
        use std::io::BufRead;
        let mut retries = 0;
        let read = loop {
            match self.stream.read_until(LF, into) {
                Ok(0) => return Err(Error::ConnectionLost),
                Ok(n) => break n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock && retries < MAX_RETRIES => {
                    retries += 1;
                }
                Err(e) => return Err(Error::Io(e)),
            }
        };

        if self.debug {
            let line = &into[into.len() - read..];
            print!("S: {}", String::from_utf8_lossy(line));
        }

        Ok(read)
    }

    fn write_line(&mut self, buf: &[u8]) -> Result<()> {
        self.stream.write_all(buf)?;
        self.stream.write_all(b"\r\n")?;
        self.stream.flush()?;
        if self.debug {
            println!("C: {}", String::from_utf8_lossy(buf));
        }
        Ok(())
    }
}

impl<T: Read + Write + SetReadTimeout> Client<T> {
    /// Adjusts the read timeout on the underlying transport.
    ///
    /// Passing `None` removes a previously set timeout. Also reachable
    /// through a [`Session`], so the timeout can be tightened for a slow
    /// maildrop after login.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream.get_mut().set_read_timeout(timeout)
    }
}

impl<T: Read + Write> Session<T> {
    /// The concatenated raw `USER` and `PASS` responses from the login
    /// exchange.
    pub fn login_response(&self) -> &str {
        &self.login_response
    }

    /// Queries the maildrop listing with `STAT`.
    pub fn stat(&mut self) -> Result<Mailbox> {
        self.run_command("STAT")?;
        let response = self.read_response()?;
        let line = String::from_utf8(response).map_err(ParseError::DataNotUtf8)?;
        Mailbox::parse(&line)
    }

    /// Downloads message `seq` (1-based) with `RETR`.
    ///
    /// The status line is checked, then the body is accumulated into a
    /// buffer owned by this call until the dot-terminator is seen. The
    /// terminator line is stripped from the returned message.
    pub fn retr(&mut self, seq: u32) -> Result<RetrievedMessage> {
        self.run_command(&format!("RETR {}", seq))?;
        self.read_response()?;

        let mut raw = Vec::new();
        loop {
            self.read_line(&mut raw)?;
            if is_terminated(&raw) {
                break;
            }
        }
        strip_terminator(&mut raw);
        Ok(RetrievedMessage { seq, raw })
    }

    /// Downloads every message in the maildrop in server order, invoking
    /// `on_message` for each. Returns the number of messages retrieved.
    ///
    /// The sequence numbers are those of the `STAT` snapshot taken at the
    /// start of the call; do not interleave deletions, run
    /// [`Session::delete_all`] as a separate pass afterwards.
    pub fn retrieve_all<F>(&mut self, mut on_message: F) -> Result<u32>
    where
        F: FnMut(RetrievedMessage),
    {
        let mailbox = self.stat()?;
        for seq in 1..=mailbox.count {
            on_message(self.retr(seq)?);
        }
        Ok(mailbox.count)
    }

    /// Marks message `seq` as deleted with `DELE`.
    pub fn dele(&mut self, seq: u32) -> Result<()> {
        self.run_command(&format!("DELE {}", seq))?;
        self.read_response().map(|_| ())
    }

    /// Marks messages `1..=count` as deleted, and returns how many `DELE`
    /// commands the server accepted.
    ///
    /// A `-ERR` for one message is reported on stderr and does not stop the
    /// loop; transport failures still abort, since nothing further can be
    /// sent on a dead connection.
    pub fn delete_all(&mut self, count: u32) -> Result<u32> {
        let mut deleted = 0;
        for seq in 1..=count {
            match self.dele(seq) {
                Ok(()) => deleted += 1,
                Err(Error::ErrResponse(text)) => {
                    eprintln!("DELE {} refused: {}", seq, text);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(deleted)
    }

    /// Ends the session with `QUIT` and waits for the acknowledgement.
    ///
    /// Servers commit pending deletions in the UPDATE state entered on
    /// `QUIT`; closing the socket without it may leave `DELE`d messages in
    /// the maildrop.
    pub fn quit(&mut self) -> Result<()> {
        self.run_command("QUIT")?;
        self.read_response().map(|_| ())
    }
}
