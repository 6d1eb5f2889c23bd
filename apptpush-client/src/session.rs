//! Transport session: one socket, one user, one subscription.
//!
//! State machine:
//!
//! ```text
//! Disconnected --connect--> Connecting --opened--> HandshakeAckWaiting
//!      ^                                                  |
//!      |                                            CONNECTED
//!      |                                                  v
//!      +------ closed / failure / disconnect ------- Subscribed
//! ```
//!
//! A session is used once. After it returns to `Disconnected` from a live
//! state it stays there; reconnecting takes a new session.

use crate::config::Config;
use crate::credentials::{authorization_header, CredentialSource};
use crate::dispatcher::Dispatcher;
use crate::error::ClientError;
use crate::notification::NotificationListener;
use crate::transport::{Connector, OpenRequest, Socket, SocketListener, NORMAL_CLOSURE};
use apptpush_protocol::{headers, parse_chunk, Command, Frame, Subscription};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Connection state of a [`TransportSession`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    HandshakeAckWaiting,
    Subscribed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::HandshakeAckWaiting => write!(f, "handshake-ack-waiting"),
            ConnectionState::Subscribed => write!(f, "subscribed"),
        }
    }
}

/// Reason sent with the close frame on an explicit disconnect.
const DISCONNECT_REASON: &str = "client disconnect";

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    socket: Option<Box<dyn Socket>>,
    /// Set once SUBSCRIBE has gone out; guards against duplicate CONNECTED.
    subscribed: bool,
    subscription: Option<Subscription>,
    listener: Option<Weak<dyn NotificationListener>>,
    /// The session has been closed and will not connect again.
    retired: bool,
}

impl Inner {
    fn reset(&mut self) {
        self.socket = None;
        self.state = ConnectionState::Disconnected;
        self.subscribed = false;
        self.retired = true;
    }
}

/// One push-transport session.
///
/// Application calls (`connect`, `disconnect`, `set_listener`) and socket
/// events share one lock. The listener is invoked outside of it.
pub struct TransportSession {
    config: Arc<Config>,
    credentials: Arc<dyn CredentialSource>,
    connector: Arc<dyn Connector>,
    dispatcher: Dispatcher,
    inner: Mutex<Inner>,
}

impl TransportSession {
    pub fn new(
        config: Arc<Config>,
        credentials: Arc<dyn CredentialSource>,
        connector: Arc<dyn Connector>,
        dispatcher: Dispatcher,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            credentials,
            connector,
            dispatcher,
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Opens the socket for `user_id` and returns without waiting.
    ///
    /// Skipped (and logged) when no access token is available, when the
    /// session is already connecting or connected, or once it has been
    /// closed.
    pub fn connect(self: &Arc<Self>, user_id: i64) {
        let mut inner = self.inner.lock();

        if inner.retired {
            tracing::warn!("connect({}) on a closed session ignored", user_id);
            return;
        }
        if inner.state != ConnectionState::Disconnected {
            tracing::debug!("connect({}) ignored, session is {}", user_id, inner.state);
            return;
        }

        let Some(authorization) = authorization_header(self.credentials.as_ref()) else {
            tracing::warn!(
                "No access token available, push connection for user {} skipped",
                user_id
            );
            return;
        };

        let request = OpenRequest {
            url: self.config.endpoint.url.clone(),
            authorization,
        };
        tracing::info!("Connecting push transport for user {} to {}", user_id, request.url);

        let weak: Weak<Self> = Arc::downgrade(self);
        let listener: Weak<dyn SocketListener> = weak;
        inner.subscription = Some(Subscription::for_user(user_id));
        inner.socket = Some(self.connector.open(request, listener));
        inner.state = ConnectionState::Connecting;
    }

    /// Closes the socket, if any, with a normal closure. Idempotent.
    pub fn disconnect(&self) {
        let mut inner = self.inner.lock();
        if let Some(socket) = inner.socket.take() {
            tracing::info!("Disconnecting push transport ({})", inner.state);
            socket.close(NORMAL_CLOSURE, DISCONNECT_REASON);
        }
        inner.reset();
    }

    /// Registers the listener, or clears it with `None`.
    ///
    /// Only a weak reference is kept.
    pub fn set_listener(&self, listener: Option<&Arc<dyn NotificationListener>>) {
        self.inner.lock().listener = listener.map(Arc::downgrade);
    }

    pub(crate) fn listener_handle(&self) -> Option<Weak<dyn NotificationListener>> {
        self.inner.lock().listener.clone()
    }

    pub(crate) fn restore_listener(&self, listener: Option<Weak<dyn NotificationListener>>) {
        self.inner.lock().listener = listener;
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// The active subscription, once SUBSCRIBE has been sent.
    pub fn subscription(&self) -> Option<Subscription> {
        let inner = self.inner.lock();
        if inner.subscribed {
            inner.subscription.clone()
        } else {
            None
        }
    }

    fn handle_frame(&self, frame: Frame) {
        match frame.command {
            Command::Connected => self.on_connected(),
            Command::Message => self.on_message(&frame),
            Command::Error => {
                tracing::warn!(
                    "Server ERROR frame: {} {}",
                    frame.header(headers::MESSAGE).unwrap_or("(no message)"),
                    frame.body.trim()
                );
            }
            other => tracing::debug!("Ignoring unexpected {} frame", other),
        }
    }

    fn on_connected(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            ConnectionState::HandshakeAckWaiting if !inner.subscribed => {
                let Some(subscription) = inner.subscription.clone() else {
                    return;
                };
                let sent = inner
                    .socket
                    .as_ref()
                    .map(|socket| socket.send(subscription.to_frame().encode()))
                    .unwrap_or(false);
                if !sent {
                    tracing::warn!(
                        "SUBSCRIBE to {} not sent, socket gone",
                        subscription.destination
                    );
                    return;
                }
                inner.subscribed = true;
                inner.state = ConnectionState::Subscribed;
                tracing::info!("Subscribed to {}", subscription.destination);
            }
            ConnectionState::Subscribed | ConnectionState::HandshakeAckWaiting => {
                tracing::debug!("Duplicate CONNECTED ignored");
            }
            state => tracing::debug!("CONNECTED ignored while {}", state),
        }
    }

    fn on_message(&self, frame: &Frame) {
        let listener = {
            let inner = self.inner.lock();
            if inner.state == ConnectionState::Disconnected {
                tracing::debug!("MESSAGE on a closed session ignored");
                return;
            }
            inner.listener.as_ref().and_then(Weak::upgrade)
        };
        self.dispatcher.dispatch(&frame.body, listener.as_deref());
    }
}

impl SocketListener for TransportSession {
    fn on_open(&self) {
        let mut inner = self.inner.lock();
        if inner.state != ConnectionState::Connecting {
            tracing::debug!("Socket opened while {}, ignored", inner.state);
            return;
        }

        let stomp = &self.config.stomp;
        let handshake = Frame::connect(&stomp.accept_version, &stomp.heart_beat_header());
        let sent = inner
            .socket
            .as_ref()
            .map(|socket| socket.send(handshake.encode()))
            .unwrap_or(false);
        if !sent {
            tracing::warn!("CONNECT not sent, socket gone");
            return;
        }

        tracing::debug!("Socket open, CONNECT sent");
        inner.state = ConnectionState::HandshakeAckWaiting;
    }

    fn on_text(&self, text: &str) {
        if self.state() == ConnectionState::Disconnected {
            tracing::debug!("{} bytes received on a closed session ignored", text.len());
            return;
        }

        let mut frames = parse_chunk(text);
        for frame in frames.by_ref() {
            self.handle_frame(frame);
        }

        if frames.malformed() > 0 {
            tracing::warn!("Skipped {} malformed frame(s)", frames.malformed());
        }
        // Server heart-beats are bare newlines with no terminator.
        if !frames.pending().trim().is_empty() {
            tracing::debug!(
                "Dropped {} bytes of unterminated frame data",
                frames.pending().len()
            );
        }
    }

    fn on_closed(&self, code: u16, reason: &str) {
        let mut inner = self.inner.lock();
        tracing::info!("Push socket closed (code {}, reason {:?})", code, reason);
        inner.reset();
    }

    fn on_failure(&self, error: &ClientError) {
        let mut inner = self.inner.lock();
        tracing::warn!("Push socket failed while {}: {}", inner.state, error);
        inner.reset();
    }
}
