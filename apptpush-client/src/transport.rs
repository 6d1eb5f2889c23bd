//! Socket abstraction between the session and the wire.
//!
//! A [`Connector`] opens a socket and reports its events to a
//! [`SocketListener`]; the returned [`Socket`] handle is used to send text
//! and to close. Events are delivered on the connector's own task.

use crate::error::ClientError;
use std::sync::Weak;

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Parameters for opening a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    /// Endpoint URL.
    pub url: String,
    /// Value of the `Authorization` header.
    pub authorization: String,
}

/// Receives socket events.
pub trait SocketListener: Send + Sync {
    /// The socket is open and ready to send.
    fn on_open(&self);

    /// A text message arrived.
    fn on_text(&self, text: &str);

    /// The socket was closed, by either side.
    fn on_closed(&self, code: u16, reason: &str);

    /// The socket could not be opened or broke.
    fn on_failure(&self, error: &ClientError);
}

/// Handle to an open (or opening) socket.
pub trait Socket: Send + Sync {
    /// Queues `text` for sending. Returns false once the socket is gone.
    fn send(&self, text: String) -> bool;

    /// Requests a close handshake. Does not wait for it.
    fn close(&self, code: u16, reason: &str);
}

/// Opens sockets.
pub trait Connector: Send + Sync {
    /// Starts opening a socket and returns immediately.
    ///
    /// The listener is held weakly. Implementations must not invoke it
    /// before this method returns.
    fn open(&self, request: OpenRequest, listener: Weak<dyn SocketListener>) -> Box<dyn Socket>;
}
