//! POP3 client bindings for Rust.
//!
//! This crate lets you connect to a POP3 server (plaintext, implicit TLS on
//! port 995, or upgraded in place with `STLS`), log in to a mailbox, and
//! download, persist and delete its messages.
//!
//! To connect, use the [`ClientBuilder`]. This gives you an unauthenticated
//! [`Client`]; calling [`Client::login`] on it turns it into a [`Session`]
//! carrying the mailbox verbs. Retrieved messages can be handed to a
//! [`MessageStore`], which writes each one to a file named by its
//! `Message-ID` and can skip messages a previous run already saved.
//!
//! ```no_run
//! # fn main() -> Result<(), popcl::Error> {
//! let client = popcl::ClientBuilder::new("pop.example.com")
//!     .mode(popcl::ConnectionMode::Tls)
//!     .connect()?;
//!
//! let mut session = client.login("jdoe", "hunter2").map_err(|e| e.0)?;
//!
//! let mut store = popcl::MessageStore::open("maildir", true)?;
//! let count = session.retrieve_all(|msg| {
//!     store.deliver(&msg);
//! })?;
//!
//! session.delete_all(count)?;
//! println!("{}", store.summary());
//! session.quit()?;
//! # Ok(())
//! # }
//! ```
//!
//! The client is strictly synchronous: every command waits for its response
//! before the next one is sent, matching POP3's half-duplex discipline.

mod client;
mod client_builder;
mod conn;
mod credentials;
mod error;
mod mailbox;
mod message;
mod store;

#[cfg(test)]
mod mock_stream;

pub use crate::client::{Client, Session};
pub use crate::client_builder::{ClientBuilder, ConnectionMode, TrustAnchors};
pub use crate::conn::{Connection, Pop3Connection, SetReadTimeout};
pub use crate::credentials::Credentials;
pub use crate::error::{Error, ParseError, Result};
pub use crate::mailbox::Mailbox;
pub use crate::message::RetrievedMessage;
pub use crate::store::{Delivery, MessageStore};
