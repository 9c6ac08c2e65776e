//! Protocol module - wire format, parameter blocks and framing.
//!
//! This module implements the byte layout shared by every message:
//! - 12-byte header (4 bytes for heartbeats) encoding/decoding
//! - length-prefixed strings and byte strings
//! - the static/variable parameter block
//! - a frame buffer that splits a byte stream back into frames

mod frame;
mod frame_buffer;
mod params;
mod wire_format;

pub use frame::Frame;
pub use frame_buffer::FrameBuffer;
pub use params::{Parameters, STATIC_PARAM_SIZE};
pub use wire_format::{
    check_frame_len, check_packed_string, check_prefixed_bytes, flags, packed_string_len,
    prefixed_bytes_len, put_packed_string, put_prefixed_bytes, Header, MessageType,
    DEFAULT_SAS_PORT, HEADER_SIZE, HEARTBEAT_HEADER_SIZE, INIT_SENTINEL, INTERFACE_VERSION,
    MAX_FRAME_SIZE, MAX_PACKED_STRING_LEN, MAX_PREFIXED_BYTES_LEN, PROTOCOL_VERSION,
    RESOURCE_BUNDLE_BASE,
};
