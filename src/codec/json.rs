//! JSON codec for analytics payloads.

use crate::error::Result;

/// JSON codec for structured analytics data.
///
/// Produces compact JSON (no whitespace) so the payload stays small on the
/// wire.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct CallSummary {
        caller: String,
        duration_ms: u32,
        answered: bool,
    }

    #[test]
    fn test_encode_struct() {
        let summary = CallSummary {
            caller: "alice".to_string(),
            duration_ms: 1500,
            answered: true,
        };
        let encoded = JsonCodec::encode(&summary).unwrap();
        assert_eq!(
            encoded,
            br#"{"caller":"alice","duration_ms":1500,"answered":true}"#
        );
    }

    #[test]
    fn test_encode_map() {
        let mut map = BTreeMap::new();
        map.insert("key", "value");
        assert_eq!(JsonCodec::encode(&map).unwrap(), br#"{"key":"value"}"#);
    }

    #[test]
    fn test_encode_unserializable_map_key() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1);
        assert!(JsonCodec::encode(&map).is_err());
    }
}
