//! Frame buffer for splitting a byte stream back into frames.
//!
//! The client never reads from the server, but anything standing in for a
//! SAS server (tests, local collectors) needs to turn the outbound byte
//! stream back into frames. Reads arrive in arbitrary chunks, so partial
//! frames are held until the rest of their bytes show up.
//!
//! # Example
//!
//! ```
//! use sas_client::message::{Heartbeat, WireMessage};
//! use sas_client::protocol::FrameBuffer;
//!
//! let bytes = Heartbeat::new().encode();
//! let mut buffer = FrameBuffer::new();
//!
//! assert!(buffer.push(&bytes[..1]).unwrap().is_empty());
//! assert_eq!(buffer.push(&bytes[1..]).unwrap().len(), 1);
//! ```

use bytes::BytesMut;

use super::wire_format::{Header, MessageType, HEADER_SIZE, HEARTBEAT_HEADER_SIZE};
use super::Frame;
use crate::error::{Result, SasError};

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
}

impl FrameBuffer {
    /// Create a new frame buffer.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// # Errors
    ///
    /// Returns a protocol error if a frame declares a length shorter than
    /// its own header.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.try_extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        if self.buffer.len() < HEARTBEAT_HEADER_SIZE {
            return Ok(None);
        }

        let length = u16::from_be_bytes([self.buffer[0], self.buffer[1]]) as usize;
        let header_size = MessageType::from_tag(self.buffer[3])
            .map(MessageType::header_size)
            .unwrap_or(HEADER_SIZE);

        if length < header_size {
            return Err(SasError::Protocol(format!(
                "Frame length {} is shorter than its {}-byte header",
                length, header_size
            )));
        }

        if self.buffer.len() < length {
            return Ok(None);
        }

        let mut raw = self.buffer.split_to(length);
        let header = Header::decode(&raw).ok_or_else(|| {
            SasError::Protocol("Frame too short for its header".to_string())
        })?;
        let body = raw.split_off(header.encoded_len()).freeze();

        Ok(Some(Frame::new(header, body)))
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame_bytes(kind: MessageType, body: &[u8]) -> Vec<u8> {
        let timestamp = match kind {
            MessageType::Heartbeat => None,
            _ => Some(1_450_180_692_598),
        };
        let header = Header::new(kind, timestamp, body.len());
        let mut buf = BytesMut::new();
        header.encode_into(&mut buf);
        buf.extend_from_slice(body);
        buf.to_vec()
    }

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let bytes = make_frame_bytes(MessageType::Event, b"hello");

        let frames = buffer.push(&bytes).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind(), Some(MessageType::Event));
        assert_eq!(frames[0].body(), b"hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();

        let mut combined = Vec::new();
        combined.extend(make_frame_bytes(MessageType::Init, b"first"));
        combined.extend(make_frame_bytes(MessageType::Heartbeat, b""));
        combined.extend(make_frame_bytes(MessageType::Marker, b"third"));

        let frames = buffer.push(&combined).unwrap();

        assert_eq!(frames.len(), 3);
        assert!(frames[0].is_init());
        assert!(frames[1].is_heartbeat());
        assert_eq!(frames[2].body(), b"third");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_frame() {
        let mut buffer = FrameBuffer::new();
        let bytes = make_frame_bytes(MessageType::Event, b"fragmented body");

        assert!(buffer.push(&bytes[..3]).unwrap().is_empty());
        assert!(buffer.push(&bytes[3..14]).unwrap().is_empty());
        assert_eq!(buffer.len(), 14);

        let frames = buffer.push(&bytes[14..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].body(), b"fragmented body");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let bytes = make_frame_bytes(MessageType::TrailAssoc, &[0u8; 17]);

        let mut frames = Vec::new();
        for byte in &bytes {
            frames.extend(buffer.push(std::slice::from_ref(byte)).unwrap());
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), bytes.len());
    }

    #[test]
    fn test_length_shorter_than_header_rejected() {
        let mut buffer = FrameBuffer::new();
        // Claims 5 bytes but an event header alone is 12
        let result = buffer.push(&[0x00, 0x05, 0x03, 0x03, 0x00]);
        assert!(matches!(result, Err(SasError::Protocol(_))));
    }

    #[test]
    fn test_clear() {
        let mut buffer = FrameBuffer::new();
        buffer.push(&[0x00, 0x20]).unwrap();
        assert!(!buffer.is_empty());

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
