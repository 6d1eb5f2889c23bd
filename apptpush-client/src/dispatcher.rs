//! Routes MESSAGE bodies to the registered listener.

use crate::notification::{NotificationListener, PayloadDecoder};
use std::sync::Arc;

/// What happened to one MESSAGE body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    NoListener,
    DecodeFailed,
}

/// Decodes MESSAGE bodies and invokes the listener.
#[derive(Clone)]
pub struct Dispatcher {
    decoder: Arc<dyn PayloadDecoder>,
}

impl Dispatcher {
    pub fn new(decoder: Arc<dyn PayloadDecoder>) -> Self {
        Self { decoder }
    }

    /// Decodes `body` and hands the result to `listener`.
    ///
    /// Decode failures are logged and dropped; nothing is retried.
    pub fn dispatch(
        &self,
        body: &str,
        listener: Option<&dyn NotificationListener>,
    ) -> DispatchOutcome {
        let notification = match self.decoder.decode(body) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(
                    "Dropping undecodable notification ({} bytes): {}",
                    body.len(),
                    e
                );
                return DispatchOutcome::DecodeFailed;
            }
        };

        match listener {
            Some(listener) => {
                tracing::debug!("Delivering appointment notification id={}", notification.id);
                listener.on_notification(&notification);
                DispatchOutcome::Delivered
            }
            None => {
                tracing::debug!(
                    "No listener registered, notification id={} dropped",
                    notification.id
                );
                DispatchOutcome::NoListener
            }
        }
    }
}
