use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::message::RetrievedMessage;

/// Writes retrieved messages to one file each under an output directory,
/// optionally skipping messages that were already saved by an earlier run.
///
/// The "already saved" set is a snapshot of the directory taken when the
/// store is opened. Messages written during the current run are not added to
/// it, so two messages with the same identifier in one run overwrite rather
/// than skip.
#[derive(Debug)]
pub struct MessageStore {
    out_dir: PathBuf,
    new_only: bool,
    existing: HashSet<OsString>,
    saved: u32,
    skipped: u32,
    failed: u32,
}

/// What [`MessageStore::deliver`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the output directory.
    Saved,
    /// Already present from an earlier run; not written.
    Skipped,
    /// The file could not be written. Reported, not fatal.
    Failed,
}

impl MessageStore {
    /// Opens a store rooted at `out_dir`, creating the directory (and any
    /// missing parents) if needed. Failure to create it is fatal: nothing
    /// can be persisted without it.
    ///
    /// With `new_only`, the directory's current file names are snapshotted
    /// first; a directory that does not exist yet counts as empty.
    pub fn open<P: Into<PathBuf>>(out_dir: P, new_only: bool) -> Result<MessageStore> {
        let out_dir = out_dir.into();
        let existing = if new_only {
            snapshot(&out_dir)?
        } else {
            HashSet::new()
        };
        fs::create_dir_all(&out_dir)?;
        Ok(MessageStore {
            out_dir,
            new_only,
            existing,
            saved: 0,
            skipped: 0,
            failed: 0,
        })
    }

    /// The file name a message is persisted under: its sanitized
    /// `Message-ID`, or `msg-{seq}` when the message has no usable id.
    pub fn file_name_for(msg: &RetrievedMessage) -> String {
        let id = msg.message_id();
        if id.is_empty() {
            format!("msg-{}", msg.seq)
        } else {
            sanitize_file_name(&id)
        }
    }

    /// Persists one message, or skips it if `new_only` is set and a file of
    /// the same name predates this run.
    ///
    /// A write failure is reported on stderr and counted; it never aborts
    /// the retrieval loop.
    pub fn deliver(&mut self, msg: &RetrievedMessage) -> Delivery {
        let file_name = Self::file_name_for(msg);
        if self.new_only && self.existing.contains(std::ffi::OsStr::new(&file_name)) {
            self.skipped += 1;
            return Delivery::Skipped;
        }
        let path = self.out_dir.join(&file_name);
        match fs::write(&path, &msg.raw) {
            Ok(()) => {
                self.saved += 1;
                Delivery::Saved
            }
            Err(err) => {
                eprintln!("unable to write \"{}\": {}", path.display(), err);
                self.failed += 1;
                Delivery::Failed
            }
        }
    }

    /// Messages written during this run.
    pub fn saved(&self) -> u32 {
        self.saved
    }

    /// Messages skipped as already present.
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    /// Messages that could not be written.
    pub fn failed(&self) -> u32 {
        self.failed
    }

    /// A one-line report in the style of `Saved [2] messages to dir "out"`.
    pub fn summary(&self) -> String {
        format!(
            "Saved [{}] messages to dir \"{}\"",
            self.saved,
            self.out_dir.display()
        )
    }
}

fn snapshot(dir: &Path) -> Result<HashSet<OsString>> {
    match fs::read_dir(dir) {
        Ok(entries) => {
            let mut names = HashSet::new();
            for entry in entries {
                names.insert(entry?.file_name());
            }
            Ok(names)
        }
        Err(ref err) if err.kind() == io::ErrorKind::NotFound => Ok(HashSet::new()),
        Err(err) => Err(err.into()),
    }
}

/// Maps a `Message-ID` to a safe file name: path separators, NUL and other
/// control bytes become `_`, as does a leading dot.
fn sanitize_file_name(id: &str) -> String {
    let mut name: String = id
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if name.starts_with('.') {
        name.replace_range(..1, "_");
    }
    name
}
