//! Wire format constants, header encoding and string packing.
//!
//! Every frame starts with a header:
//! ```text
//! ┌──────────┬─────────┬──────────┬───────────────┐
//! │ Length   │ Version │ Type     │ Timestamp     │
//! │ 2 bytes  │ 1 byte  │ 1 byte   │ 8 bytes       │
//! │ uint16 BE│         │          │ uint64 BE (ms)│
//! └──────────┴─────────┴──────────┴───────────────┘
//! ```
//!
//! The length covers the whole frame, header included. Heartbeats carry no
//! timestamp, so their header (and whole frame) is 4 bytes.
//!
//! Header fields, IDs and length prefixes are Big Endian. Static parameters
//! and the `Init` sentinel are Little Endian.

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::error::{Result, SasError};

/// Header size in bytes for every message except heartbeats.
pub const HEADER_SIZE: usize = 12;

/// Header size in bytes for heartbeats (no timestamp).
pub const HEARTBEAT_HEADER_SIZE: usize = 4;

/// Largest frame the 2-byte length field can describe.
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// Longest string that fits a 1-byte length prefix.
pub const MAX_PACKED_STRING_LEN: usize = u8::MAX as usize;

/// Longest payload that fits a 2-byte length prefix.
pub const MAX_PREFIXED_BYTES_LEN: usize = u16::MAX as usize;

/// Interface version carried in every header.
pub const INTERFACE_VERSION: u8 = 3;

/// Protocol version string sent in `Init`.
pub const PROTOCOL_VERSION: &str = "v0.1";

/// Base event ID for all events defined by resource bundles.
pub const RESOURCE_BUNDLE_BASE: u32 = 0x0F00_0000;

/// Sentinel written into `Init` so the server can detect byte order.
pub const INIT_SENTINEL: i32 = 1;

/// Default SAS server port.
pub const DEFAULT_SAS_PORT: u16 = 6761;

/// Message type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Init = 1,
    TrailAssoc = 2,
    Event = 3,
    Marker = 4,
    Heartbeat = 5,
    Analytics = 7,
}

impl MessageType {
    /// Wire tag for this type.
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Init),
            2 => Some(Self::TrailAssoc),
            3 => Some(Self::Event),
            4 => Some(Self::Marker),
            5 => Some(Self::Heartbeat),
            7 => Some(Self::Analytics),
            _ => None,
        }
    }

    /// Header size used by frames of this type.
    #[inline]
    pub fn header_size(self) -> usize {
        match self {
            Self::Heartbeat => HEARTBEAT_HEADER_SIZE,
            _ => HEADER_SIZE,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::TrailAssoc => "Trail Association",
            Self::Event => "Event",
            Self::Marker => "Marker",
            Self::Heartbeat => "Heartbeat",
            Self::Analytics => "Analytics",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Marker flag constants.
pub mod flags {
    /// Set when the marker associates its trail (scope is not `None`).
    pub const ASSOCIATE: u8 = 0b0000_0001;
    /// Set when an associating marker must not reactivate the trail.
    pub const NO_REACTIVATE: u8 = 0b0000_0010;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Total frame length in bytes, header included.
    pub length: u16,
    /// Interface version.
    pub version: u8,
    /// Raw message type tag.
    pub message_type: u8,
    /// Milliseconds since the epoch; `None` for heartbeats.
    pub timestamp: Option<u64>,
}

impl Header {
    /// Create a header for a message of the given type and body length.
    ///
    /// The caller guarantees the frame fits `MAX_FRAME_SIZE`.
    pub fn new(message_type: MessageType, timestamp: Option<u64>, body_len: usize) -> Self {
        let total = message_type.header_size() + body_len;
        debug_assert!(total <= MAX_FRAME_SIZE);
        Self {
            length: total as u16,
            version: INTERFACE_VERSION,
            message_type: message_type.tag(),
            timestamp,
        }
    }

    /// Size of this header on the wire.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        match self.timestamp {
            Some(_) => HEADER_SIZE,
            None => HEARTBEAT_HEADER_SIZE,
        }
    }

    /// Parsed message type, if the tag is known.
    #[inline]
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_tag(self.message_type)
    }

    /// Append the header to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u16(self.length);
        buf.put_u8(self.version);
        buf.put_u8(self.message_type);
        if let Some(timestamp) = self.timestamp {
            buf.put_u64(timestamp);
        }
    }

    /// Decode a header from the start of `buf`.
    ///
    /// Returns `None` if the buffer is too short for the header that the
    /// type tag calls for.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let fixed = buf.get(..HEARTBEAT_HEADER_SIZE)?;
        let length = u16::from_be_bytes([fixed[0], fixed[1]]);
        let version = fixed[2];
        let message_type = fixed[3];

        let timestamp = if message_type == MessageType::Heartbeat.tag() {
            None
        } else {
            let raw: [u8; 8] = buf.get(HEARTBEAT_HEADER_SIZE..HEADER_SIZE)?.try_into().ok()?;
            Some(u64::from_be_bytes(raw))
        };

        Some(Self {
            length,
            version,
            message_type,
            timestamp,
        })
    }
}

/// Check that `value` fits a 1-byte length prefix.
pub fn check_packed_string(value: &str) -> Result<()> {
    if value.len() > MAX_PACKED_STRING_LEN {
        return Err(SasError::StringTooLong {
            len: value.len(),
            max: MAX_PACKED_STRING_LEN,
        });
    }
    Ok(())
}

/// Check that `value` fits a 2-byte length prefix.
pub fn check_prefixed_bytes(value: &[u8]) -> Result<()> {
    if value.len() > MAX_PREFIXED_BYTES_LEN {
        return Err(SasError::ParameterTooLong {
            len: value.len(),
            max: MAX_PREFIXED_BYTES_LEN,
        });
    }
    Ok(())
}

/// Check that a frame of `len` bytes fits the length field.
pub fn check_frame_len(len: usize) -> Result<()> {
    if len > MAX_FRAME_SIZE {
        return Err(SasError::FrameTooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(())
}

/// Append a string with a 1-byte length prefix.
///
/// Callers validate with [`check_packed_string`] when the value enters a
/// message, so the length always fits here.
pub fn put_packed_string(buf: &mut BytesMut, value: &str) {
    debug_assert!(value.len() <= MAX_PACKED_STRING_LEN);
    buf.put_u8(value.len() as u8);
    buf.put_slice(value.as_bytes());
}

/// Append bytes with a 2-byte Big Endian length prefix.
pub fn put_prefixed_bytes(buf: &mut BytesMut, value: &[u8]) {
    debug_assert!(value.len() <= MAX_PREFIXED_BYTES_LEN);
    buf.put_u16(value.len() as u16);
    buf.put_slice(value);
}

/// Encoded size of a packed string.
#[inline]
pub fn packed_string_len(value: &str) -> usize {
    1 + value.len()
}

/// Encoded size of a 2-byte prefixed byte string.
#[inline]
pub fn prefixed_bytes_len(value: &[u8]) -> usize {
    2 + value.len()
}
