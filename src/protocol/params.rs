//! Static and variable parameter block shared by events, markers and
//! analytics messages.
//!
//! ```text
//! 2 bytes      - length of the static section (BE)
//! 4 bytes each - static parameters (LE)
//! 2 + n bytes  - each variable parameter, length prefixed (BE)
//! ```
//!
//! Static parameters always precede variable ones on the wire, whatever
//! order they were added in.

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{check_frame_len, check_prefixed_bytes, prefixed_bytes_len, put_prefixed_bytes};
use crate::error::Result;

/// Size of one static parameter.
pub const STATIC_PARAM_SIZE: usize = 4;

/// Parameters attached to a data-carrying message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    statics: Vec<u32>,
    variables: Vec<Bytes>,
}

impl Parameters {
    /// Create an empty parameter block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Static parameters in insertion order.
    pub fn statics(&self) -> &[u32] {
        &self.statics
    }

    /// Variable parameters in insertion order (already compressed, if any).
    pub fn variables(&self) -> &[Bytes] {
        &self.variables
    }

    /// Encoded size of the block.
    pub fn encoded_len(&self) -> usize {
        2 + self.statics.len() * STATIC_PARAM_SIZE
            + self
                .variables
                .iter()
                .map(|v| prefixed_bytes_len(v))
                .sum::<usize>()
    }

    /// Append a static parameter.
    ///
    /// `frame_len` is the size of the owning message before the push; the
    /// push is rejected if the message would outgrow the frame length field.
    pub(crate) fn push_static(&mut self, value: u32, frame_len: usize) -> Result<()> {
        check_frame_len(frame_len + STATIC_PARAM_SIZE)?;
        self.statics.push(value);
        Ok(())
    }

    /// Append a variable parameter. See [`Parameters::push_static`].
    pub(crate) fn push_variable(&mut self, value: Bytes, frame_len: usize) -> Result<()> {
        check_prefixed_bytes(&value)?;
        check_frame_len(frame_len + prefixed_bytes_len(&value))?;
        self.variables.push(value);
        Ok(())
    }

    /// Append the encoded block to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        let static_len = self.statics.len() * STATIC_PARAM_SIZE;
        buf.put_u16(static_len as u16);
        for value in &self.statics {
            buf.put_u32_le(*value);
        }
        for value in &self.variables {
            put_prefixed_bytes(buf, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SasError;
    use crate::protocol::MAX_FRAME_SIZE;

    fn encode(params: &Parameters) -> Vec<u8> {
        let mut buf = BytesMut::new();
        params.encode_into(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn test_empty_block_still_has_static_length() {
        let params = Parameters::new();
        assert_eq!(encode(&params), vec![0x00, 0x00]);
        assert_eq!(params.encoded_len(), 2);
    }

    #[test]
    fn test_static_params_little_endian() {
        let mut params = Parameters::new();
        params.push_static(333, 0).unwrap();
        params.push_static(444, 0).unwrap();

        assert_eq!(encode(&params), b"\x00\x08M\x01\x00\x00\xbc\x01\x00\x00".to_vec());
    }

    #[test]
    fn test_statics_before_variables() {
        let mut variable_first = Parameters::new();
        variable_first
            .push_variable(Bytes::from_static(b"abc"), 0)
            .unwrap();
        variable_first.push_static(7, 0).unwrap();

        let mut static_first = Parameters::new();
        static_first.push_static(7, 0).unwrap();
        static_first
            .push_variable(Bytes::from_static(b"abc"), 0)
            .unwrap();

        assert_eq!(variable_first, static_first);
        assert_eq!(
            encode(&variable_first),
            b"\x00\x04\x07\x00\x00\x00\x00\x03abc".to_vec()
        );
    }

    #[test]
    fn test_encoded_len_matches_output() {
        let mut params = Parameters::new();
        params.push_static(1, 0).unwrap();
        params
            .push_variable(Bytes::from_static(b"test parameter"), 0)
            .unwrap();
        params.push_variable(Bytes::new(), 0).unwrap();

        assert_eq!(params.encoded_len(), encode(&params).len());
    }

    #[test]
    fn test_oversized_variable_rejected() {
        let mut params = Parameters::new();
        let result = params.push_variable(Bytes::from(vec![0u8; 70_000]), 0);
        assert!(matches!(result, Err(SasError::ParameterTooLong { .. })));
        assert!(params.variables().is_empty());
    }

    #[test]
    fn test_frame_overflow_rejected() {
        let mut params = Parameters::new();
        let result = params.push_static(1, MAX_FRAME_SIZE - 2);
        assert!(matches!(result, Err(SasError::FrameTooLarge { .. })));
        assert!(params.statics().is_empty());

        let result = params.push_variable(Bytes::from_static(b"x"), MAX_FRAME_SIZE - 2);
        assert!(matches!(result, Err(SasError::FrameTooLarge { .. })));
    }
}
