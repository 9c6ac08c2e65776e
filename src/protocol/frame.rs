//! Decoded frame with typed accessors.
//!
//! Represents a complete frame as read back from the wire: header plus body.
//! Uses `bytes::Bytes` for zero-copy body sharing.
//!
//! # Example
//!
//! ```
//! use sas_client::message::{Heartbeat, WireMessage};
//! use sas_client::protocol::{FrameBuffer, MessageType};
//!
//! let mut buffer = FrameBuffer::new();
//! let frames = buffer.push(&Heartbeat::new().encode()).unwrap();
//!
//! assert_eq!(frames[0].kind(), Some(MessageType::Heartbeat));
//! assert!(frames[0].body().is_empty());
//! ```

use bytes::Bytes;

use super::wire_format::{Header, MessageType};

/// A complete protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Body bytes following the header.
    pub body: Bytes,
}

impl Frame {
    /// Create a new frame from header and body.
    pub fn new(header: Header, body: Bytes) -> Self {
        Self { header, body }
    }

    /// Get a reference to the body bytes.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Parsed message type, if known.
    #[inline]
    pub fn kind(&self) -> Option<MessageType> {
        self.header.kind()
    }

    /// Timestamp carried in the header (`None` for heartbeats).
    #[inline]
    pub fn timestamp(&self) -> Option<u64> {
        self.header.timestamp
    }

    /// Total frame length as declared by the header.
    #[inline]
    pub fn len(&self) -> usize {
        self.header.length as usize
    }

    /// Frames always contain at least a header.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Check if this is a heartbeat.
    #[inline]
    pub fn is_heartbeat(&self) -> bool {
        self.kind() == Some(MessageType::Heartbeat)
    }

    /// Check if this is the connection-opening `Init`.
    #[inline]
    pub fn is_init(&self) -> bool {
        self.kind() == Some(MessageType::Init)
    }
}
