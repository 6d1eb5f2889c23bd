//! WebSocket connector built on tokio-tungstenite.
//!
//! Each socket runs on its own task: it performs the upgrade (with the
//! `Authorization` header), forwards outbound text and close requests from
//! an unbounded channel, and reports inbound text and lifecycle events to
//! the session through a weak reference. A guard task reports a failure if
//! the socket task dies without reporting one itself.

use crate::error::ClientError;
use crate::transport::{Connector, OpenRequest, Socket, SocketListener};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::Weak;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Close code reported when the peer closes without a status.
const NO_STATUS_RECEIVED: u16 = 1005;

/// Close code reported when the stream ends without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket connections on a tokio runtime.
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
    runtime: Handle,
}

impl WsConnector {
    /// Creates a connector that spawns onto the current tokio runtime.
    pub fn new(connect_timeout: Duration) -> Result<Self, ClientError> {
        let runtime = Handle::try_current().map_err(|_| ClientError::NoRuntime)?;
        Ok(Self::with_handle(connect_timeout, runtime))
    }

    pub fn with_handle(connect_timeout: Duration, runtime: Handle) -> Self {
        install_crypto_provider();
        Self {
            connect_timeout,
            runtime,
        }
    }
}

impl Connector for WsConnector {
    fn open(&self, request: OpenRequest, listener: Weak<dyn SocketListener>) -> Box<dyn Socket> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let socket = run_socket(request, self.connect_timeout, listener.clone(), outbound_rx);
        self.runtime.spawn(guard_socket(listener, socket));
        Box::new(WsSocket {
            outbound: outbound_tx,
        })
    }
}

/// Makes rustls' ring provider the process default for `wss://`.
///
/// A provider installed earlier by the application is kept.
fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::trace!("rustls crypto provider already installed");
    }
}

/// Requests from the session to the socket task.
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close { code: u16, reason: String },
}

struct WsSocket {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Socket for WsSocket {
    fn send(&self, text: String) -> bool {
        self.outbound.send(Outbound::Text(text)).is_ok()
    }

    fn close(&self, code: u16, reason: &str) {
        let _ = self.outbound.send(Outbound::Close {
            code,
            reason: reason.to_string(),
        });
    }
}

async fn open_stream(request: &OpenRequest, timeout: Duration) -> Result<WsStream, ClientError> {
    let mut http_request = request.url.as_str().into_client_request()?;
    http_request.headers_mut().insert(
        AUTHORIZATION,
        HeaderValue::from_str(&request.authorization)?,
    );

    let (stream, response) = tokio::time::timeout(timeout, connect_async(http_request))
        .await
        .map_err(|_| {
            tracing::debug!("WebSocket connect timeout");
            ClientError::Timeout
        })??;

    tracing::debug!("WebSocket upgraded (HTTP {})", response.status());
    Ok(stream)
}

fn notify(listener: &Weak<dyn SocketListener>, event: impl FnOnce(&dyn SocketListener)) {
    match listener.upgrade() {
        Some(listener) => event(listener.as_ref()),
        None => tracing::trace!("Socket event for a released session ignored"),
    }
}

/// Runs `socket` as its own task and reports a failure to the listener if
/// that task panics or is cancelled.
async fn guard_socket<F>(listener: Weak<dyn SocketListener>, socket: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Err(e) = tokio::spawn(socket).await {
        tracing::error!("Socket task aborted: {}", e);
        let error = ClientError::SocketTask(e.to_string());
        notify(&listener, |l| l.on_failure(&error));
    }
}

async fn run_socket(
    request: OpenRequest,
    timeout: Duration,
    listener: Weak<dyn SocketListener>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    tracing::debug!("Opening WebSocket to {}", request.url);

    let stream = match open_stream(&request, timeout).await {
        Ok(stream) => stream,
        Err(e) => {
            notify(&listener, |l| l.on_failure(&e));
            return;
        }
    };
    notify(&listener, |l| l.on_open());

    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::text(text)).await {
                        let e = ClientError::from(e);
                        notify(&listener, |l| l.on_failure(&e));
                        return;
                    }
                }
                Some(Outbound::Close { code, reason }) => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.clone().into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        tracing::debug!("Close frame not delivered: {}", e);
                    }
                    notify(&listener, |l| l.on_closed(code, &reason));
                    return;
                }
                None => {
                    // Session dropped its handle without closing.
                    let _ = sink.close().await;
                    return;
                }
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    notify(&listener, |l| l.on_text(text.as_str()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                    notify(&listener, |l| l.on_closed(code, &reason));
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let e = ClientError::from(e);
                    notify(&listener, |l| l.on_failure(&e));
                    return;
                }
                None => {
                    notify(&listener, |l| l.on_closed(ABNORMAL_CLOSURE, "stream ended"));
                    return;
                }
            },
        }
    }
}
