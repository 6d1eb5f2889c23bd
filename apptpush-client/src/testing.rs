//! In-memory connector and listener for unit tests.

use crate::notification::{AppointmentNotification, NotificationListener};
use crate::transport::{Connector, OpenRequest, Socket, SocketListener};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Everything the session did with one socket.
#[derive(Default)]
pub(crate) struct RecordedSocket {
    sent: Mutex<Vec<String>>,
    closes: Mutex<Vec<(u16, String)>>,
}

impl RecordedSocket {
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub(crate) fn closed(&self) -> Option<(u16, String)> {
        self.closes.lock().first().cloned()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closes.lock().len()
    }
}

struct RecordingSocket(Arc<RecordedSocket>);

impl Socket for RecordingSocket {
    fn send(&self, text: String) -> bool {
        if !self.0.closes.lock().is_empty() {
            return false;
        }
        self.0.sent.lock().push(text);
        true
    }

    fn close(&self, code: u16, reason: &str) {
        self.0.closes.lock().push((code, reason.to_string()));
    }
}

struct Opened {
    request: OpenRequest,
    socket: Arc<RecordedSocket>,
    listener: Weak<dyn SocketListener>,
}

/// Connector that records open requests and never touches the network.
/// Tests drive socket events by calling the listener directly.
#[derive(Default)]
pub(crate) struct RecordingConnector {
    opened: Mutex<Vec<Opened>>,
}

impl RecordingConnector {
    pub(crate) fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub(crate) fn request(&self, index: usize) -> OpenRequest {
        self.opened.lock()[index].request.clone()
    }

    pub(crate) fn socket(&self, index: usize) -> Arc<RecordedSocket> {
        self.opened.lock()[index].socket.clone()
    }

    pub(crate) fn listener(&self, index: usize) -> Arc<dyn SocketListener> {
        self.opened.lock()[index]
            .listener
            .upgrade()
            .expect("session dropped")
    }
}

impl RecordingConnector {
    pub(crate) fn listener_alive(&self, index: usize) -> bool {
        self.opened.lock()[index].listener.strong_count() > 0
    }
}

impl Connector for RecordingConnector {
    fn open(&self, request: OpenRequest, listener: Weak<dyn SocketListener>) -> Box<dyn Socket> {
        let socket = Arc::new(RecordedSocket::default());
        self.opened.lock().push(Opened {
            request,
            socket: socket.clone(),
            listener,
        });
        Box::new(RecordingSocket(socket))
    }
}

/// Listener that keeps every notification it receives.
#[derive(Default)]
pub(crate) struct RecordingListener {
    received: Mutex<Vec<AppointmentNotification>>,
}

impl RecordingListener {
    pub(crate) fn ids(&self) -> Vec<i64> {
        self.received.lock().iter().map(|n| n.id).collect()
    }
}

impl NotificationListener for RecordingListener {
    fn on_notification(&self, notification: &AppointmentNotification) {
        self.received.lock().push(notification.clone());
    }
}
