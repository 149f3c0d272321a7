use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// The username and password for one mailbox login. Both are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Parses a credentials file of the form
    ///
    /// ```text
    /// username = jdoe
    /// password = hunter2
    /// ```
    ///
    /// The username is the third whitespace-separated token of the first
    /// line, the password the third token of the second. Anything else is a
    /// configuration error, raised before any network activity happens.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Credentials> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|err| {
            Error::Config(format!(
                "unable to read credentials file \"{}\": {}",
                path.as_ref().display(),
                err
            ))
        })?;
        Credentials::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Credentials> {
        let mut lines = contents.lines();
        let username = third_token(lines.next());
        let password = third_token(lines.next());
        match (username, password) {
            (Some(username), Some(password)) => Ok(Credentials {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(Error::Config(
                "failed to parse username or password".to_string(),
            )),
        }
    }
}

fn third_token(line: Option<&str>) -> Option<&str> {
    line.and_then(|l| l.split_whitespace().nth(2))
}
