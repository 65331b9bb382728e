//! FTP reply encoding
//!
//! Renders a reply code and message into the control-channel wire format,
//! including the `<code>-` continuation form for multi-line replies.

use std::fmt;

/// The body of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMessage {
    /// No message; rendered as a single empty line.
    Empty,
    /// Text that may contain `\n` separated lines.
    Text(String),
    /// Explicit list of lines.
    Lines(Vec<String>),
}

/// A reply sent to the client on the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpReply {
    code: u16,
    message: ReplyMessage,
}

impl FtpReply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: ReplyMessage::Text(message.into()),
        }
    }

    pub fn empty(code: u16) -> Self {
        Self {
            code,
            message: ReplyMessage::Empty,
        }
    }

    pub fn lines<I, S>(code: u16, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            code,
            message: ReplyMessage::Lines(lines.into_iter().map(Into::into).collect()),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &ReplyMessage {
        &self.message
    }

    fn body_lines(&self) -> Vec<&str> {
        let mut lines: Vec<&str> = match &self.message {
            ReplyMessage::Empty => Vec::new(),
            ReplyMessage::Text(text) => {
                let mut lines: Vec<&str> = text
                    .split('\n')
                    .map(|line| line.strip_suffix('\r').unwrap_or(line))
                    .collect();
                // a final line terminator does not start another line
                while lines.len() > 1 && lines.last().is_some_and(|l| l.is_empty()) {
                    lines.pop();
                }
                lines
            }
            ReplyMessage::Lines(lines) => lines.iter().map(String::as_str).collect(),
        };
        if lines.is_empty() {
            lines.push("");
        }
        lines
    }
}

impl fmt::Display for FtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self.body_lines();
        let last = lines.len() - 1;

        if last == 0 {
            return write!(f, "{} {}\r\n", self.code, lines[0]);
        }

        for (i, line) in lines.iter().enumerate() {
            if i == 0 {
                write!(f, "{}-{}\r\n", self.code, line)?;
            } else if i == last {
                write!(f, "{} {}\r\n", self.code, line)?;
            } else if line.starts_with(|c: char| c.is_ascii_digit()) {
                // an inner line must never look like a reply-code line
                write!(f, "  {}\r\n", line)?;
            } else {
                write!(f, "{}\r\n", line)?;
            }
        }
        Ok(())
    }
}

/// Encodes a reply; `None` renders as an empty message.
pub fn encode_reply(code: u16, message: Option<&str>) -> String {
    match message {
        Some(text) => FtpReply::new(code, text).to_string(),
        None => FtpReply::empty(code).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        assert_eq!(FtpReply::new(123, "foo bar").to_string(), "123 foo bar\r\n");
    }

    #[test]
    fn absent_message() {
        assert_eq!(FtpReply::empty(123).to_string(), "123 \r\n");
        assert_eq!(encode_reply(123, None), "123 \r\n");
    }

    #[test]
    fn multiple_lines() {
        assert_eq!(
            FtpReply::new(123, "foo\nbar\nbaz").to_string(),
            "123-foo\r\nbar\r\n123 baz\r\n"
        );
    }

    #[test]
    fn trailing_newline_adds_no_line() {
        assert_eq!(
            FtpReply::new(123, "foo\nbar\nbaz\n").to_string(),
            "123-foo\r\nbar\r\n123 baz\r\n"
        );
        assert_eq!(FtpReply::new(200, "ok\n").to_string(), "200 ok\r\n");
    }

    #[test]
    fn explicit_lines_match_text_form() {
        assert_eq!(
            FtpReply::lines(123, ["foo", "bar", "baz"]).to_string(),
            "123-foo\r\nbar\r\n123 baz\r\n"
        );
    }

    #[test]
    fn leading_empty_line_is_kept() {
        assert_eq!(
            FtpReply::new(123, "\nfoo\nbar\nbaz").to_string(),
            "123-\r\nfoo\r\nbar\r\n123 baz\r\n"
        );
    }

    #[test]
    fn leading_space_is_preserved() {
        assert_eq!(
            FtpReply::new(123, "foo\n bar\nbaz").to_string(),
            "123-foo\r\n bar\r\n123 baz\r\n"
        );
    }

    #[test]
    fn inner_line_starting_with_digit_is_padded() {
        assert_eq!(
            FtpReply::lines(211, ["Features:", "550 lookalike", "End"]).to_string(),
            "211-Features:\r\n  550 lookalike\r\n211 End\r\n"
        );
    }

    #[test]
    fn crlf_terminated_text() {
        assert_eq!(
            FtpReply::new(214, "a\r\nb\r\n").to_string(),
            "214-a\r\n214 b\r\n"
        );
    }
}
