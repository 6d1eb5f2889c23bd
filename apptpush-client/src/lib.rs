//! # apptpush-client
//!
//! Push-notification client for appointment events.
//!
//! This crate provides:
//! - A transport session driving the CONNECT/SUBSCRIBE handshake
//! - A supervisor keeping at most one live session per application
//! - Dispatch of decoded notifications to a weakly held listener
//! - A WebSocket connector (tokio-tungstenite, ws:// and wss://)
//! - YAML/env configuration

pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod notification;
pub mod session;
pub mod supervisor;
pub mod transport;
pub mod websocket;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigError};
pub use credentials::{CredentialSource, StaticCredentials};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::ClientError;
pub use notification::{
    AppointmentNotification, JsonPayloadDecoder, NotificationListener, PayloadDecoder,
};
pub use session::{ConnectionState, TransportSession};
pub use supervisor::SessionSupervisor;
pub use transport::{Connector, OpenRequest, Socket, SocketListener};
pub use websocket::WsConnector;
