use std::fmt;

use bytes::{BufMut, BytesMut};

use super::{now_millis, write_params, write_preamble, DataMessage, WireMessage};
use crate::protocol::{MessageType, Parameters, RESOURCE_BUNDLE_BASE};
use crate::trail::Trail;

/// Something that happened on a trail.
///
/// ```text
/// 8 bytes - trail ID (BE)
/// 4 bytes - event ID OR-ed with the resource bundle base (BE)
/// 4 bytes - instance ID (BE)
/// parameter block
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    timestamp: u64,
    trail: Trail,
    event_id: u32,
    instance_id: u32,
    params: Parameters,
}

impl Event {
    /// Size of the fixed fields preceding the parameter block.
    pub(crate) const FIELDS_LEN: usize = 16;

    /// Event `event_id` on `trail`, stamped with the current time.
    pub fn new(trail: Trail, event_id: u32) -> Self {
        Self {
            timestamp: now_millis(),
            trail,
            event_id,
            instance_id: 0,
            params: Parameters::new(),
        }
    }

    /// Identify where in the calling code this event was raised.
    pub fn set_instance_id(mut self, instance_id: u32) -> Self {
        self.instance_id = instance_id;
        self
    }

    /// Override the capture time, in milliseconds since the epoch.
    pub fn set_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn trail(&self) -> Trail {
        self.trail
    }

    /// Event ID as given, without the resource bundle base.
    pub fn event_id(&self) -> u32 {
        self.event_id
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub(crate) fn encode_fields(&self, buf: &mut BytesMut) {
        buf.put_u64(self.trail.id());
        buf.put_u32(self.event_id | RESOURCE_BUNDLE_BASE);
        buf.put_u32(self.instance_id);
    }

    pub(crate) fn write_fields(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   Trail: {}", self.trail)?;
        writeln!(f, "   Event ID: 0x{:06x}", self.event_id)?;
        write!(f, "   Instance ID: {}", self.instance_id)
    }
}

impl WireMessage for Event {
    fn message_type(&self) -> MessageType {
        MessageType::Event
    }

    fn timestamp(&self) -> Option<u64> {
        Some(self.timestamp)
    }

    fn body_len(&self) -> usize {
        Self::FIELDS_LEN + self.params.encoded_len()
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.encode_fields(buf);
        self.params.encode_into(buf);
    }
}

impl DataMessage for Event {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_preamble(f, MessageType::Event, self.timestamp)?;
        write_params(f, &self.params)?;
        self.write_fields(f)
    }
}
