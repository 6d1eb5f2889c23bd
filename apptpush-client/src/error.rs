//! Client error types.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Client errors.
///
/// None of these cross the session's public surface; they are logged where
/// they occur.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] apptpush_protocol::ProtocolError),

    #[error("websocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] tungstenite::http::header::InvalidHeaderValue),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connect timeout")]
    Timeout,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("socket task aborted: {0}")]
    SocketTask(String),

    #[error("no tokio runtime available to drive the socket")]
    NoRuntime,
}

impl From<tungstenite::Error> for ClientError {
    fn from(err: tungstenite::Error) -> Self {
        ClientError::WebSocket(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_conversion() {
        let err: ClientError =
            apptpush_protocol::ProtocolError::UnknownCommand("NACK".to_string()).into();
        assert!(matches!(err, ClientError::Protocol(_)));
        assert!(err.to_string().contains("NACK"));
    }

    #[test]
    fn test_websocket_error_is_boxed() {
        let err: ClientError = tungstenite::Error::ConnectionClosed.into();
        assert!(matches!(err, ClientError::WebSocket(_)));
    }
}
