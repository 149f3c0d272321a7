use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "native-tls")]
use native_tls::{Certificate, TlsConnector};

use crate::client::Client;
use crate::conn::Connection;
use crate::error::{Error, Result};

/// The connection mode to use for the initial connection to the server.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum ConnectionMode {
    /// An unencrypted connection on the standard port (110).
    #[default]
    Plaintext,
    /// An implicit-TLS connection: the handshake happens immediately on
    /// connect, before any protocol dialog, on the dedicated port (995).
    Tls,
    /// A plaintext connection upgraded in place with `STLS` after the
    /// greeting. Uses the standard port (110).
    StartTls,
}

/// Where the certificates used to validate the server's identity come from.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub enum TrustAnchors {
    /// The platform's certificate store.
    #[default]
    System,
    /// A PEM file holding one or more certificates. Replaces the built-in
    /// roots.
    File(PathBuf),
    /// A directory of `.pem`/`.crt`/`.cer` files. Replaces the built-in
    /// roots.
    Dir(PathBuf),
}

/// A convenience builder for [`Client`] structs over the various transports.
///
/// Creating an implicit-TLS [`Client`] is straightforward:
/// ```no_run
/// # use popcl::ClientBuilder;
/// # fn main() -> Result<(), popcl::Error> {
/// let client = ClientBuilder::new("pop.example.com")
///     .mode(popcl::ConnectionMode::Tls)
///     .connect()?;
/// # Ok(())
/// # }
/// ```
///
/// To use `STLS`, select [`ConnectionMode::StartTls`] instead; the builder
/// connects on the plaintext port and upgrades in place:
/// ```no_run
/// # use popcl::ClientBuilder;
/// # fn main() -> Result<(), popcl::Error> {
/// let client = ClientBuilder::new("pop.example.com")
///     .mode(popcl::ConnectionMode::StartTls)
///     .connect()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder<D>
where
    D: AsRef<str>,
{
    domain: D,
    port: Option<u16>,
    mode: ConnectionMode,
    trust: TrustAnchors,
    read_timeout: Option<Duration>,
    skip_tls_verify: bool,
}

impl<D> ClientBuilder<D>
where
    D: AsRef<str>,
{
    /// Make a new `ClientBuilder` for the given server. The port is derived
    /// from the connection mode unless overridden with [`port`](Self::port).
    pub fn new(domain: D) -> Self {
        ClientBuilder {
            domain,
            port: None,
            mode: ConnectionMode::default(),
            trust: TrustAnchors::default(),
            read_timeout: None,
            skip_tls_verify: false,
        }
    }

    /// Use an explicit port instead of the mode's default.
    pub fn port(&mut self, port: u16) -> &mut Self {
        self.port = Some(port);
        self
    }

    /// Set the connection mode for this connection.
    pub fn mode(&mut self, mode: ConnectionMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Validate the server certificate against the given trust anchors
    /// instead of the platform store.
    pub fn trust_anchors(&mut self, trust: TrustAnchors) -> &mut Self {
        self.trust = trust;
        self
    }

    /// Set a read timeout on the underlying socket, applied before any
    /// protocol dialog. Without one, a stalled peer blocks the client
    /// indefinitely.
    pub fn read_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Controls whether the server certificate is verified during the TLS
    /// handshake.
    ///
    /// Defaults to `false`. Only enable against test servers; it defeats the
    /// point of TLS.
    #[cfg(feature = "native-tls")]
    pub fn danger_skip_tls_verify(&mut self, skip: bool) -> &mut Self {
        self.skip_tls_verify = skip;
        self
    }

    /// Make a [`Client`] using the configuration in this builder.
    ///
    /// The returned channel is fully established: the greeting has been read
    /// and, for the TLS modes, the handshake has completed and the peer
    /// certificate validated. Any failure along the way aborts the
    /// connection; in particular a refused `STLS` never falls back to
    /// plaintext.
    pub fn connect(&self) -> Result<Client<Connection>> {
        let port = self.port.unwrap_or_else(|| default_port(self.mode));
        let tcp = TcpStream::connect((self.domain.as_ref(), port))?;
        if let Some(timeout) = self.read_timeout {
            tcp.set_read_timeout(Some(timeout))?;
        }

        match self.mode {
            ConnectionMode::Plaintext => {
                let mut client = Client::new(Box::new(tcp) as Connection);
                client.read_greeting()?;
                Ok(client)
            }
            #[cfg(feature = "native-tls")]
            ConnectionMode::Tls => {
                let tls = self.tls_connector()?.connect(self.domain.as_ref(), tcp)?;
                let mut client = Client::new(Box::new(tls) as Connection);
                client.read_greeting()?;
                Ok(client)
            }
            #[cfg(feature = "native-tls")]
            ConnectionMode::StartTls => {
                let mut client = Client::new(tcp);
                client.read_greeting()?;
                client.begin_tls()?;
                let tcp = client.into_inner()?;
                let tls = self.tls_connector()?.connect(self.domain.as_ref(), tcp)?;
                // no second greeting after the in-place upgrade
                Ok(Client::new(Box::new(tls) as Connection))
            }
            #[cfg(not(feature = "native-tls"))]
            _ => Err(Error::Config(
                "this build of popcl has no TLS support".to_string(),
            )),
        }
    }

    #[cfg(feature = "native-tls")]
    fn tls_connector(&self) -> Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.skip_tls_verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        match self.trust {
            TrustAnchors::System => {}
            TrustAnchors::File(ref path) => {
                for cert in load_cert_file(path)? {
                    builder.add_root_certificate(cert);
                }
                builder.disable_built_in_roots(true);
            }
            TrustAnchors::Dir(ref path) => {
                for cert in load_cert_dir(path)? {
                    builder.add_root_certificate(cert);
                }
                builder.disable_built_in_roots(true);
            }
        }
        Ok(builder.build()?)
    }
}

/// 110 for the plaintext and `STLS` modes, 995 for implicit TLS.
fn default_port(mode: ConnectionMode) -> u16 {
    match mode {
        ConnectionMode::Tls => 995,
        ConnectionMode::Plaintext | ConnectionMode::StartTls => 110,
    }
}

const PEM_END: &str = "-----END CERTIFICATE-----";

/// Splits a PEM bundle into its certificate blocks.
fn split_pem_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find(PEM_END) {
        let (block, tail) = rest.split_at(idx + PEM_END.len());
        blocks.push(block);
        rest = tail;
    }
    blocks
}

#[cfg(feature = "native-tls")]
fn load_cert_file(path: &Path) -> Result<Vec<Certificate>> {
    let pem = std::fs::read_to_string(path)?;
    let blocks = split_pem_blocks(&pem);
    if blocks.is_empty() {
        return Err(Error::Config(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    blocks
        .into_iter()
        .map(|block| Certificate::from_pem(block.as_bytes()).map_err(Error::Tls))
        .collect()
}

#[cfg(feature = "native-tls")]
fn load_cert_dir(path: &Path) -> Result<Vec<Certificate>> {
    let mut certs = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?.path();
        match entry.extension().and_then(|e| e.to_str()) {
            Some("pem") | Some("crt") | Some("cer") => certs.extend(load_cert_file(&entry)?),
            _ => {}
        }
    }
    if certs.is_empty() {
        return Err(Error::Config(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}
