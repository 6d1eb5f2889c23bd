//! Text frame format.
//!
//! Frame layout:
//!
//! ```text
//! COMMAND\n
//! key:value\n
//! key:value\n
//! \n
//! body\0
//! ```
//!
//! The header block ends at the first blank line. The NUL terminator may
//! not appear in the command, headers or body. No escaping is performed.

use crate::error::ProtocolError;
use crate::{headers, FRAME_TERMINATOR};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Frame commands understood by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // Client frames
    Connect,
    Subscribe,
    Send,

    // Server frames
    Connected,
    Message,
    Error,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Subscribe => "SUBSCRIBE",
            Command::Send => "SEND",
            Command::Connected => "CONNECTED",
            Command::Message => "MESSAGE",
            Command::Error => "ERROR",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Command::Connect),
            "SUBSCRIBE" => Ok(Command::Subscribe),
            "SEND" => Ok(Command::Send),
            "CONNECTED" => Ok(Command::Connected),
            "MESSAGE" => Ok(Command::Message),
            "ERROR" => Ok(Command::Error),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

/// A parsed or outgoing frame.
///
/// Headers are kept sorted by name so that encoding is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl Frame {
    /// Creates a frame with no headers and an empty body.
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: BTreeMap::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the CONNECT handshake frame.
    pub fn connect(accept_version: &str, heart_beat: &str) -> Self {
        Self::new(Command::Connect)
            .with_header(headers::ACCEPT_VERSION, accept_version)
            .with_header(headers::HEART_BEAT, heart_beat)
    }

    /// Returns a header value by name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Encodes the frame into its wire text. Never fails.
    pub fn encode(&self) -> String {
        let headers_len: usize = self
            .headers
            .iter()
            .map(|(k, v)| k.len() + v.len() + 2)
            .sum();
        let mut out =
            String::with_capacity(self.command.as_str().len() + headers_len + self.body.len() + 3);

        out.push_str(self.command.as_str());
        out.push('\n');
        for (key, value) in &self.headers {
            out.push_str(key);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push(FRAME_TERMINATOR);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!("CONNECTED".parse::<Command>().unwrap(), Command::Connected);
        assert_eq!("MESSAGE".parse::<Command>().unwrap(), Command::Message);
        assert_eq!(
            "connected".parse::<Command>(),
            Err(ProtocolError::UnknownCommand("connected".to_string()))
        );
    }

    #[test]
    fn test_command_display_matches_parse() {
        for command in [
            Command::Connect,
            Command::Subscribe,
            Command::Send,
            Command::Connected,
            Command::Message,
            Command::Error,
        ] {
            assert_eq!(command.to_string().parse::<Command>().unwrap(), command);
        }
    }

    #[test]
    fn test_encode_connect_frame() {
        let frame = Frame::connect("1.1,1.2", "10000,10000");
        assert_eq!(
            frame.encode(),
            "CONNECT\naccept-version:1.1,1.2\nheart-beat:10000,10000\n\n\0"
        );
    }

    #[test]
    fn test_encode_with_body() {
        let frame = Frame::new(Command::Send)
            .with_header("destination", "/queue/a")
            .with_body("hello");
        assert_eq!(frame.encode(), "SEND\ndestination:/queue/a\n\nhello\0");
    }

    #[test]
    fn test_encode_without_headers() {
        let frame = Frame::new(Command::Connected);
        assert_eq!(frame.encode(), "CONNECTED\n\n\0");
    }

    #[test]
    fn test_header_lookup() {
        let frame = Frame::new(Command::Error).with_header("message", "bad destination");
        assert_eq!(frame.header("message"), Some("bad destination"));
        assert_eq!(frame.header("receipt-id"), None);
    }
}
