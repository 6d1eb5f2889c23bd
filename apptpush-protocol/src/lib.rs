//! # apptpush-protocol
//!
//! Wire protocol implementation for apptpush (a STOMP 1.1/1.2 subset).
//!
//! This crate provides:
//! - Text frames with NUL termination
//! - Chunk parsing with heartbeat absorption
//! - Builders for the CONNECT and SUBSCRIBE control frames
//! - Protocol constants

pub mod codec;
pub mod error;
pub mod frame;
pub mod subscription;

pub use codec::{parse_chunk, parse_frame, Frames};
pub use error::ProtocolError;
pub use frame::{Command, Frame};
pub use subscription::Subscription;

/// Byte terminating every frame on the wire.
pub const FRAME_TERMINATOR: char = '\0';

/// Protocol versions offered in the CONNECT frame.
pub const ACCEPT_VERSION: &str = "1.1,1.2";

/// Default heart-beat interval in milliseconds, both directions.
pub const DEFAULT_HEART_BEAT_MS: u64 = 10_000;

/// Client-chosen id of the appointments subscription.
pub const SUBSCRIPTION_ID: &str = "sub-appointments";

/// Header names used by this client.
pub mod headers {
    pub const ACCEPT_VERSION: &str = "accept-version";
    pub const HEART_BEAT: &str = "heart-beat";
    pub const ID: &str = "id";
    pub const DESTINATION: &str = "destination";
    pub const MESSAGE: &str = "message";
}
