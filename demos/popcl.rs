//! A small command-line POP3 downloader built on the `popcl` crate.
//!
//! Reads credentials from a file of the form
//! ```text
//! username = jdoe
//! password = hunter2
//! ```
//! and saves each message in the mailbox to a file in the output directory.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use popcl::{ClientBuilder, ConnectionMode, Credentials, MessageStore, TrustAnchors};

/// Download messages from a POP3 mailbox.
#[derive(Parser)]
struct Args {
    /// Server host name or address
    server: String,
    /// Port (defaults to 110, or 995 with --tls)
    #[arg(short, long)]
    port: Option<u16>,
    /// Connect with implicit TLS (pop3s)
    #[arg(short = 'T', long, conflicts_with = "starttls")]
    tls: bool,
    /// Upgrade the plaintext connection in place with STLS
    #[arg(short = 'S', long)]
    starttls: bool,
    /// PEM file with trusted certificates
    #[arg(short = 'c', long, conflicts_with = "certaddr")]
    certfile: Option<PathBuf>,
    /// Directory of PEM files with trusted certificates
    #[arg(short = 'C', long)]
    certaddr: Option<PathBuf>,
    /// Delete messages from the server after retrieval
    #[arg(short, long)]
    delete: bool,
    /// Only download messages not already in the output directory
    #[arg(short, long)]
    new: bool,
    /// File with the login credentials
    #[arg(short = 'a', long)]
    auth_file: PathBuf,
    /// Directory to save messages into
    #[arg(short, long)]
    out_dir: PathBuf,
    /// Read timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
    /// Print protocol traffic
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let credentials = Credentials::from_file(&args.auth_file)?;

    let mut builder = ClientBuilder::new(&args.server);
    builder.mode(if args.tls {
        ConnectionMode::Tls
    } else if args.starttls {
        ConnectionMode::StartTls
    } else {
        ConnectionMode::Plaintext
    });
    if let Some(port) = args.port {
        builder.port(port);
    }
    if let Some(file) = args.certfile {
        builder.trust_anchors(TrustAnchors::File(file));
    } else if let Some(dir) = args.certaddr {
        builder.trust_anchors(TrustAnchors::Dir(dir));
    }
    if let Some(secs) = args.timeout {
        builder.read_timeout(Duration::from_secs(secs));
    }

    let mut client = builder.connect()?;
    client.debug = args.debug;
    let mut session = client
        .login(&credentials.username, &credentials.password)
        .map_err(|e| e.0)?;

    let mut store = MessageStore::open(&args.out_dir, args.new)?;
    let count = session.retrieve_all(|msg| {
        store.deliver(&msg);
    })?;
    println!("{}", store.summary());

    if args.delete {
        let deleted = session.delete_all(count)?;
        println!("Deleted [{}] messages", deleted);
    }

    session.quit()?;
    Ok(())
}
