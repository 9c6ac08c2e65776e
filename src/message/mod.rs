//! Message types reported to SAS.
//!
//! Every message implements [`WireMessage`], which turns it into a frame:
//! the header is derived from the message type, timestamp and body size, and
//! each type writes its own body. Events, markers and analytics also carry a
//! parameter block and share the fluent parameter methods of
//! [`DataMessage`].
//!
//! Messages are plain values. Build them, then hand them to
//! [`Client::send`](crate::Client::send); once sent they are owned by the
//! delivery queue and can no longer be changed.
//!
//! # Example
//!
//! ```
//! use sas_client::message::{DataMessage, Event, WireMessage};
//! use sas_client::Trail;
//!
//! let event = Event::new(Trail::from_id(111), 222)
//!     .set_instance_id(555)
//!     .add_static_param(333)?
//!     .add_variable_param("test parameter")?;
//!
//! let bytes = event.encode();
//! assert_eq!(bytes.len(), event.encoded_len());
//! # Ok::<(), sas_client::SasError>(())
//! ```

mod analytics;
mod event;
mod heartbeat;
mod init;
mod marker;
mod trail_assoc;

use std::fmt;

use bytes::{Bytes, BytesMut};
use chrono::DateTime;

pub use analytics::{Analytics, AnalyticsFormat};
pub use event::Event;
pub use heartbeat::Heartbeat;
pub use init::Init;
pub use marker::Marker;
pub use trail_assoc::TrailAssoc;

use crate::codec::Compression;
use crate::error::Result;
use crate::protocol::{Header, MessageType, Parameters};

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Breadth of a trail association.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Scope {
    /// No association.
    #[default]
    None = 0,
    /// Associate within the current branch.
    Branch = 1,
    /// Associate across the whole trace.
    Trace = 2,
}

impl Scope {
    /// Wire value.
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// The frame-producing capability shared by all messages.
pub trait WireMessage {
    /// Message type tag.
    fn message_type(&self) -> MessageType;

    /// Timestamp in milliseconds, `None` for messages sent without one.
    fn timestamp(&self) -> Option<u64>;

    /// Size of the body in bytes.
    fn body_len(&self) -> usize;

    /// Append the body to `buf`.
    fn encode_body(&self, buf: &mut BytesMut);

    /// Total frame size, header included.
    fn encoded_len(&self) -> usize {
        self.message_type().header_size() + self.body_len()
    }

    /// Header describing this message's frame.
    fn header(&self) -> Header {
        Header::new(self.message_type(), self.timestamp(), self.body_len())
    }

    /// Encode the complete frame.
    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.header().encode_into(&mut buf);
        self.encode_body(&mut buf);
        debug_assert_eq!(buf.len(), self.encoded_len());
        buf.freeze()
    }
}

/// Fluent parameter methods for messages carrying a parameter block.
///
/// Each method checks that the message still fits a frame and fails fast
/// with the offending call otherwise.
pub trait DataMessage: WireMessage + Sized {
    /// The parameter block.
    fn params(&self) -> &Parameters;

    /// Mutable access to the parameter block.
    fn params_mut(&mut self) -> &mut Parameters;

    /// Add one static parameter.
    fn add_static_param(mut self, value: u32) -> Result<Self> {
        let frame_len = self.encoded_len();
        self.params_mut().push_static(value, frame_len)?;
        Ok(self)
    }

    /// Add several static parameters, preserving order.
    fn add_static_params<I>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = u32>,
    {
        for value in values {
            self = self.add_static_param(value)?;
        }
        Ok(self)
    }

    /// Add one variable parameter.
    fn add_variable_param<V: AsRef<[u8]>>(mut self, value: V) -> Result<Self> {
        let frame_len = self.encoded_len();
        self.params_mut()
            .push_variable(Bytes::copy_from_slice(value.as_ref()), frame_len)?;
        Ok(self)
    }

    /// Add several variable parameters, preserving order.
    fn add_variable_params<I, V>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: AsRef<[u8]>,
    {
        for value in values {
            self = self.add_variable_param(value)?;
        }
        Ok(self)
    }

    /// Compress a variable parameter and add it.
    fn add_compressed_param<V: AsRef<[u8]>>(
        mut self,
        value: V,
        compression: Compression,
    ) -> Result<Self> {
        let compressed = compression.compress(value.as_ref())?;
        let frame_len = self.encoded_len();
        self.params_mut().push_variable(compressed, frame_len)?;
        Ok(self)
    }
}

/// Any message the client can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Init(Init),
    TrailAssoc(TrailAssoc),
    Event(Event),
    Marker(Marker),
    Analytics(Analytics),
    Heartbeat(Heartbeat),
}

impl Message {
    /// Check if this is a heartbeat.
    #[inline]
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::Heartbeat(_))
    }

    fn as_wire(&self) -> &dyn WireMessage {
        match self {
            Self::Init(m) => m,
            Self::TrailAssoc(m) => m,
            Self::Event(m) => m,
            Self::Marker(m) => m,
            Self::Analytics(m) => m,
            Self::Heartbeat(m) => m,
        }
    }
}

impl WireMessage for Message {
    fn message_type(&self) -> MessageType {
        self.as_wire().message_type()
    }

    fn timestamp(&self) -> Option<u64> {
        self.as_wire().timestamp()
    }

    fn body_len(&self) -> usize {
        self.as_wire().body_len()
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        self.as_wire().encode_body(buf)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(m) => fmt::Display::fmt(m, f),
            Self::TrailAssoc(m) => fmt::Display::fmt(m, f),
            Self::Event(m) => fmt::Display::fmt(m, f),
            Self::Marker(m) => fmt::Display::fmt(m, f),
            Self::Analytics(m) => fmt::Display::fmt(m, f),
            Self::Heartbeat(m) => fmt::Display::fmt(m, f),
        }
    }
}

macro_rules! impl_from_message {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Message {
                fn from(message: $variant) -> Self {
                    Self::$variant(message)
                }
            }
        )*
    };
}

impl_from_message!(Init, TrailAssoc, Event, Marker, Analytics, Heartbeat);

/// First line of every message dump: kind and UTC time.
fn write_preamble(f: &mut fmt::Formatter<'_>, kind: MessageType, timestamp: u64) -> fmt::Result {
    let time = i64::try_from(timestamp)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string());
    writeln!(f, "SAS Message: {} ({})", kind, time)
}

/// Parameter summary lines shared by data messages.
fn write_params(f: &mut fmt::Formatter<'_>, params: &Parameters) -> fmt::Result {
    let statics: Vec<String> = params.statics().iter().map(u32::to_string).collect();
    writeln!(f, "   Static parameters: {}", statics.join(","))?;
    writeln!(
        f,
        "   Variable parameters: {} parameters",
        params.variables().len()
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::protocol::{FrameBuffer, HEADER_SIZE};
    use crate::trail::Trail;

    fn sample_messages() -> Vec<Message> {
        let trail = Trail::from_id(111);
        vec![
            Init::new("system", "type", "org.example.bundle").unwrap().into(),
            TrailAssoc::new(trail, Trail::from_id(112), Scope::Trace).into(),
            Event::new(trail, 1)
                .add_static_params([1, 2, 3])
                .unwrap()
                .add_variable_param("value")
                .unwrap()
                .into(),
            Marker::new(trail, 2)
                .set_association_scope(Scope::Branch)
                .add_variable_params(["a", "bb", "ccc"])
                .unwrap()
                .into(),
            Analytics::new(trail, 3, AnalyticsFormat::Json, "source", "friendly")
                .unwrap()
                .add_variable_param("{}")
                .unwrap()
                .into(),
            Heartbeat::new().into(),
        ]
    }

    #[test]
    fn test_length_field_matches_frame_size() {
        for message in sample_messages() {
            let bytes = message.encode();
            let declared = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
            assert_eq!(declared, bytes.len(), "{}", message.message_type());
            assert_eq!(message.encoded_len(), bytes.len());
        }
    }

    #[test]
    fn test_frames_decode_with_frame_buffer() {
        let messages = sample_messages();
        let mut stream = Vec::new();
        for message in &messages {
            stream.extend_from_slice(&message.encode());
        }

        let frames = FrameBuffer::new().push(&stream).unwrap();
        assert_eq!(frames.len(), messages.len());
        for (frame, message) in frames.iter().zip(&messages) {
            assert_eq!(frame.kind(), Some(message.message_type()));
            assert_eq!(frame.timestamp(), message.timestamp());
        }
    }

    #[test]
    fn test_enum_encodes_like_variant() {
        let event = Event::new(Trail::from_id(111), 222).set_timestamp(TIMESTAMP);
        let message = Message::from(event.clone());
        assert_eq!(message.encode(), event.encode());
        assert_eq!(message.header().encoded_len(), HEADER_SIZE);
    }

    #[test]
    fn test_only_heartbeat_omits_timestamp() {
        for message in sample_messages() {
            assert_eq!(message.timestamp().is_none(), message.is_heartbeat());
        }
    }

    #[test]
    fn test_timestamp_captured_at_construction() {
        let before = now_millis();
        let event = Event::new(Trail::from_id(1), 1);
        let after = now_millis();

        let stamp = event.timestamp().unwrap();
        assert!(stamp >= before && stamp <= after);
    }

    #[test]
    fn test_display_preamble() {
        let event = Event::new(Trail::from_id(111), 222).set_timestamp(TIMESTAMP);
        let text = Message::from(event).to_string();
        assert!(text.starts_with("SAS Message: Event (2015-12-15 11:58:12)\n"));
    }

    #[test]
    fn test_scope_tags() {
        assert_eq!(Scope::default(), Scope::None);
        assert_eq!(Scope::None.tag(), 0);
        assert_eq!(Scope::Branch.tag(), 1);
        assert_eq!(Scope::Trace.tag(), 2);
    }

    #[test]
    fn test_recorded_timestamp_bytes() {
        assert_eq!(TIMESTAMP.to_be_bytes(), TIMESTAMP_BYTES);
        assert_eq!(111u64.to_be_bytes(), TRAIL_BYTES);
        assert_eq!(frame(&[b"ab", b"cd"]), b"abcd".to_vec());
    }
}
