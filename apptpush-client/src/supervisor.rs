//! Owns the live transport session for the signed-in user.

use crate::config::Config;
use crate::credentials::CredentialSource;
use crate::dispatcher::Dispatcher;
use crate::error::ClientError;
use crate::notification::{JsonPayloadDecoder, NotificationListener, PayloadDecoder};
use crate::session::{ConnectionState, TransportSession};
use crate::transport::Connector;
use crate::websocket::WsConnector;
use parking_lot::Mutex;
use std::sync::Arc;

/// Serializes connect/disconnect requests so that at most one session is
/// ever live.
///
/// Construct one per application and share it; there is no global
/// instance.
pub struct SessionSupervisor {
    config: Arc<Config>,
    credentials: Arc<dyn CredentialSource>,
    connector: Arc<dyn Connector>,
    dispatcher: Dispatcher,
    current: Mutex<Option<Arc<TransportSession>>>,
}

impl SessionSupervisor {
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialSource>,
        connector: Arc<dyn Connector>,
        decoder: Arc<dyn PayloadDecoder>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            credentials,
            connector,
            dispatcher: Dispatcher::new(decoder),
            current: Mutex::new(None),
        }
    }

    /// Supervisor using the WebSocket connector and the JSON decoder.
    ///
    /// Must be called from within a tokio runtime.
    pub fn websocket(
        config: Config,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, ClientError> {
        let connector = WsConnector::new(config.endpoint.connect_timeout())?;
        Ok(Self::new(
            config,
            credentials,
            Arc::new(connector),
            Arc::new(JsonPayloadDecoder),
        ))
    }

    /// Tears down the current session, if any, and starts a new one for
    /// `user_id`. Safe to call repeatedly, e.g. on every resume.
    ///
    /// The listener of the replaced session carries over.
    pub fn connect(&self, user_id: i64) {
        let mut current = self.current.lock();

        let listener = current.take().and_then(|previous| {
            tracing::debug!("Replacing push session ({})", previous.state());
            let listener = previous.listener_handle();
            previous.disconnect();
            listener
        });

        let session = TransportSession::new(
            self.config.clone(),
            self.credentials.clone(),
            self.connector.clone(),
            self.dispatcher.clone(),
        );
        session.restore_listener(listener);
        session.connect(user_id);
        *current = Some(session);
    }

    /// Tears down the current session, if any.
    pub fn disconnect(&self) {
        if let Some(session) = self.current.lock().take() {
            session.disconnect();
        }
    }

    /// Forwards to the current session. Without one the listener is not
    /// remembered.
    pub fn set_listener(&self, listener: Option<&Arc<dyn NotificationListener>>) {
        match self.current.lock().as_ref() {
            Some(session) => session.set_listener(listener),
            None => tracing::debug!("set_listener without a session, ignored"),
        }
    }

    /// State of the current session, `Disconnected` when there is none.
    pub fn state(&self) -> ConnectionState {
        self.current
            .lock()
            .as_ref()
            .map(|session| session.state())
            .unwrap_or_default()
    }

    pub fn current_session(&self) -> Option<Arc<TransportSession>> {
        self.current.lock().clone()
    }
}
