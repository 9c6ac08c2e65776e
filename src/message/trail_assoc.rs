use std::fmt;

use bytes::{BufMut, BytesMut};

use super::{now_millis, write_preamble, Scope, WireMessage};
use crate::protocol::MessageType;
use crate::trail::Trail;

/// Explicitly links two trails.
///
/// Body: trail A (8 bytes BE), trail B (8 bytes BE), scope (1 byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailAssoc {
    timestamp: u64,
    trail_a: Trail,
    trail_b: Trail,
    scope: Scope,
}

impl TrailAssoc {
    const BODY_LEN: usize = 17;

    /// Associate two trails within `scope`.
    pub fn new(trail_a: Trail, trail_b: Trail, scope: Scope) -> Self {
        Self {
            timestamp: now_millis(),
            trail_a,
            trail_b,
            scope,
        }
    }

    /// Override the capture time, in milliseconds since the epoch.
    pub fn set_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn trail_a(&self) -> Trail {
        self.trail_a
    }

    pub fn trail_b(&self) -> Trail {
        self.trail_b
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl WireMessage for TrailAssoc {
    fn message_type(&self) -> MessageType {
        MessageType::TrailAssoc
    }

    fn timestamp(&self) -> Option<u64> {
        Some(self.timestamp)
    }

    fn body_len(&self) -> usize {
        Self::BODY_LEN
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        buf.put_u64(self.trail_a.id());
        buf.put_u64(self.trail_b.id());
        buf.put_u8(self.scope.tag());
    }
}

impl fmt::Display for TrailAssoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_preamble(f, MessageType::TrailAssoc, self.timestamp)?;
        writeln!(f, "   Trail A: {}", self.trail_a)?;
        writeln!(f, "   Trail B: {}", self.trail_b)?;
        write!(f, "   Scope: {}", self.scope.tag())
    }
}
