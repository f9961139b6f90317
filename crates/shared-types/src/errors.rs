//! # Error Types
//!
//! Errors raised while decoding event payloads received from the transport.

use thiserror::Error;

/// Errors that can occur when decoding a raw event payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// Payload bytes are not a valid event JSON object.
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// The `eventType` discriminator does not belong to the channel it arrived on.
    #[error("Channel mismatch: {channel} carried eventType {event_type}")]
    ChannelMismatch { channel: String, event_type: String },

    /// The channel name is not part of the event contract.
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}
