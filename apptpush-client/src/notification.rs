//! Appointment notification payload, its decoder and the listener seam.

use crate::error::ClientError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A "new appointment event" pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentNotification {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Members this client does not know about.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Turns a MESSAGE body into a notification.
pub trait PayloadDecoder: Send + Sync {
    fn decode(&self, body: &str) -> Result<AppointmentNotification, ClientError>;
}

/// JSON decoder backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadDecoder;

impl PayloadDecoder for JsonPayloadDecoder {
    fn decode(&self, body: &str) -> Result<AppointmentNotification, ClientError> {
        Ok(serde_json::from_str(body)?)
    }
}

/// Receives decoded notifications.
///
/// Called on the transport's task; implementations should hand work off
/// rather than block.
pub trait NotificationListener: Send + Sync {
    fn on_notification(&self, notification: &AppointmentNotification);
}

impl<F> NotificationListener for F
where
    F: Fn(&AppointmentNotification) + Send + Sync,
{
    fn on_notification(&self, notification: &AppointmentNotification) {
        self(notification)
    }
}
