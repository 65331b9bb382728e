//! FTP request parsing
//!
//! Turns a raw control-channel line into a verb and an optional argument.

use std::fmt;

/// A single command received on the control channel.
///
/// The verb is normalized to upper case; the argument is passed through to
/// ftplets and command handlers unchanged apart from surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpRequest {
    verb: String,
    argument: Option<String>,
    line: String,
}

impl FtpRequest {
    /// Builds a request directly from its parts.
    pub fn new(verb: &str, argument: Option<&str>) -> Self {
        let verb = verb.to_ascii_uppercase();
        let argument = argument.map(str::to_string);
        let line = match &argument {
            Some(arg) => format!("{} {}", verb, arg),
            None => verb.clone(),
        };
        Self {
            verb,
            argument,
            line,
        }
    }

    /// Parses a raw command line. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim_end_matches(['\r', '\n']).trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or("").to_ascii_uppercase();
        let argument = parts
            .next()
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(str::to_string);

        Some(Self {
            verb,
            argument,
            line: trimmed.to_string(),
        })
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    pub fn has_argument(&self) -> bool {
        self.argument.is_some()
    }

    /// The request line as received, without the line terminator.
    pub fn line(&self) -> &str {
        &self.line
    }
}

impl fmt::Display for FtpRequest {
    /// Masks the password so requests can be logged safely.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.verb == "PASS" {
            write!(f, "PASS ****")
        } else {
            write!(f, "{}", self.line)
        }
    }
}
