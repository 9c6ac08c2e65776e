use std::fmt;

use bytes::{BufMut, BytesMut};
use serde::Serialize;

use super::{write_params, write_preamble, DataMessage, Event, WireMessage};
use crate::codec::JsonCodec;
use crate::error::Result;
use crate::protocol::{
    check_frame_len, check_prefixed_bytes, prefixed_bytes_len, put_prefixed_bytes, MessageType,
    Parameters,
};
use crate::trail::Trail;

/// Payload format of an analytics message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AnalyticsFormat {
    Json = 1,
    Xml = 2,
}

impl AnalyticsFormat {
    /// Format byte on the wire.
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Format name, as shown in message dumps.
    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
        }
    }
}

impl fmt::Display for AnalyticsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An event forwarded to analytics consumers.
///
/// The body is an event body with extra fields between the instance ID and
/// the parameter block:
///
/// ```text
/// 1 byte    - format (1 = JSON, 2 = XML)
/// 1 byte    - store message in SAS (0 or 1)
/// 2+n bytes - source type
/// 2+n bytes - friendly ID
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analytics {
    event: Event,
    format: AnalyticsFormat,
    store: bool,
    source_type: String,
    friendly_id: String,
}

impl Analytics {
    /// Analytics event carrying payloads in `format` from `source_type`.
    pub fn new(
        trail: Trail,
        event_id: u32,
        format: AnalyticsFormat,
        source_type: impl Into<String>,
        friendly_id: impl Into<String>,
    ) -> Result<Self> {
        let source_type = source_type.into();
        let friendly_id = friendly_id.into();
        check_prefixed_bytes(source_type.as_bytes())?;
        check_prefixed_bytes(friendly_id.as_bytes())?;

        let analytics = Self {
            event: Event::new(trail, event_id),
            format,
            store: false,
            source_type,
            friendly_id,
        };
        check_frame_len(analytics.encoded_len())?;
        Ok(analytics)
    }

    /// Ask SAS to also store the message as a regular event.
    pub fn set_store(mut self, store: bool) -> Self {
        self.store = store;
        self
    }

    /// Distinguish repeated events with the same ID on one trail.
    pub fn set_instance_id(mut self, instance_id: u32) -> Self {
        self.event = self.event.set_instance_id(instance_id);
        self
    }

    /// Override the capture time, in milliseconds since the epoch.
    pub fn set_timestamp(mut self, timestamp: u64) -> Self {
        self.event = self.event.set_timestamp(timestamp);
        self
    }

    /// Serialize `value` to JSON and add it as a variable parameter.
    pub fn add_json_param<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let encoded = JsonCodec::encode(value)?;
        self.add_variable_param(encoded)
    }

    pub fn trail(&self) -> Trail {
        self.event.trail()
    }

    pub fn event_id(&self) -> u32 {
        self.event.event_id()
    }

    pub fn format(&self) -> AnalyticsFormat {
        self.format
    }

    /// Human-readable payload format.
    pub fn format_type(&self) -> &'static str {
        self.format.name()
    }

    pub fn store(&self) -> bool {
        self.store
    }

    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    pub fn friendly_id(&self) -> &str {
        &self.friendly_id
    }

    fn fields_len(&self) -> usize {
        Event::FIELDS_LEN
            + 2
            + prefixed_bytes_len(self.source_type.as_bytes())
            + prefixed_bytes_len(self.friendly_id.as_bytes())
    }
}

impl WireMessage for Analytics {
    fn message_type(&self) -> MessageType {
        MessageType::Analytics
    }

    fn timestamp(&self) -> Option<u64> {
        self.event.timestamp()
    }

    fn body_len(&self) -> usize {
        self.fields_len() + self.event.params().encoded_len()
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.event.encode_fields(buf);
        buf.put_u8(self.format.tag());
        buf.put_u8(u8::from(self.store));
        put_prefixed_bytes(buf, self.source_type.as_bytes());
        put_prefixed_bytes(buf, self.friendly_id.as_bytes());
        self.event.params().encode_into(buf);
    }
}

impl DataMessage for Analytics {
    fn params(&self) -> &Parameters {
        self.event.params()
    }

    fn params_mut(&mut self) -> &mut Parameters {
        self.event.params_mut()
    }
}

impl fmt::Display for Analytics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timestamp = self.event.timestamp().unwrap_or_default();
        write_preamble(f, MessageType::Analytics, timestamp)?;
        write_params(f, self.params())?;
        self.event.write_fields(f)?;
        writeln!(f)?;
        writeln!(f, "   Format Type: {}", self.format)?;
        writeln!(
            f,
            "   Store Msg  : {}",
            if self.store { "True" } else { "False" }
        )?;
        writeln!(f, "   Source Type: {}", self.source_type)?;
        write!(f, "   Friendly ID: {}", self.friendly_id)
    }
}
