use std::fmt;

use bytes::BytesMut;

use super::WireMessage;
use crate::protocol::MessageType;

/// Keep-alive message: a bare 4-byte header with no timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Heartbeat;

impl Heartbeat {
    /// A keepalive frame.
    pub fn new() -> Self {
        Self
    }
}

impl WireMessage for Heartbeat {
    fn message_type(&self) -> MessageType {
        MessageType::Heartbeat
    }

    fn timestamp(&self) -> Option<u64> {
        None
    }

    fn body_len(&self) -> usize {
        0
    }

    fn encode_body(&self, _buf: &mut BytesMut) {}
}

impl fmt::Display for Heartbeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SAS Heartbeat")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_frame() {
        assert_eq!(&Heartbeat::new().encode()[..], &[0x00, 0x04, 0x03, 0x05]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Heartbeat.to_string(), "SAS Heartbeat");
    }
}
