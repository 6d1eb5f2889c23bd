//! Protocol error types.

use thiserror::Error;

/// Errors raised while parsing a single raw frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::UnknownCommand("PING".to_string());
        assert_eq!(err.to_string(), "unknown command: \"PING\"");

        let err = ProtocolError::MalformedHeader("no-colon".to_string());
        assert!(err.to_string().contains("no-colon"));
    }
}
