//! The per-user appointments subscription.

use crate::frame::{Command, Frame};
use crate::{headers, SUBSCRIPTION_ID};

/// The single subscription a session holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: String,
    pub destination: String,
}

impl Subscription {
    /// Subscription to the appointments topic of `user_id`.
    pub fn for_user(user_id: i64) -> Self {
        Self {
            id: SUBSCRIPTION_ID.to_string(),
            destination: appointments_destination(user_id),
        }
    }

    /// Builds the SUBSCRIBE frame for this subscription.
    pub fn to_frame(&self) -> Frame {
        Frame::new(Command::Subscribe)
            .with_header(headers::ID, self.id.as_str())
            .with_header(headers::DESTINATION, self.destination.as_str())
    }
}

/// Topic path carrying appointment events for one user.
pub fn appointments_destination(user_id: i64) -> String {
    format!("/topic/users/{}/appointments", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_for_user() {
        assert_eq!(appointments_destination(9), "/topic/users/9/appointments");
    }

    #[test]
    fn test_subscribe_frame() {
        let frame = Subscription::for_user(9).to_frame();
        assert_eq!(frame.command, Command::Subscribe);
        assert_eq!(
            frame.encode(),
            "SUBSCRIBE\ndestination:/topic/users/9/appointments\nid:sub-appointments\n\n\0"
        );
    }
}
