use std::fmt;

use bytes::{BufMut, BytesMut};

use super::{now_millis, write_preamble, WireMessage};
use crate::error::Result;
use crate::protocol::{
    check_packed_string, packed_string_len, put_packed_string, MessageType, INIT_SENTINEL,
    PROTOCOL_VERSION,
};

/// Handshake sent first on every new connection.
///
/// ```text
/// 1+n bytes - system name
/// 4 bytes   - the number 1 (LE)
/// 1+n bytes - protocol version
/// 1+n bytes - system type
/// 1+n bytes - resource identifier
/// 1+n bytes - resource version
/// ```
///
/// Every string must fit a 1-byte length prefix; constructors reject longer
/// values so an `Init` always encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Init {
    timestamp: u64,
    system_name: String,
    system_type: String,
    resource_identifier: String,
    resource_version: String,
}

impl Init {
    /// Create a handshake with an empty resource version.
    pub fn new(
        system_name: impl Into<String>,
        system_type: impl Into<String>,
        resource_identifier: impl Into<String>,
    ) -> Result<Self> {
        let system_name = system_name.into();
        let system_type = system_type.into();
        let resource_identifier = resource_identifier.into();
        check_packed_string(&system_name)?;
        check_packed_string(&system_type)?;
        check_packed_string(&resource_identifier)?;

        Ok(Self {
            timestamp: now_millis(),
            system_name,
            system_type,
            resource_identifier,
            resource_version: String::new(),
        })
    }

    /// Set the resource version.
    pub fn with_resource_version(mut self, version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        check_packed_string(&version)?;
        self.resource_version = version;
        Ok(self)
    }

    /// Override the timestamp (milliseconds since the epoch).
    pub fn set_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Restamp with the current time, used when resending on reconnect.
    pub(crate) fn restamped(&self) -> Self {
        self.clone().set_timestamp(now_millis())
    }

    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    pub fn system_type(&self) -> &str {
        &self.system_type
    }

    pub fn resource_identifier(&self) -> &str {
        &self.resource_identifier
    }

    pub fn resource_version(&self) -> &str {
        &self.resource_version
    }
}

impl WireMessage for Init {
    fn message_type(&self) -> MessageType {
        MessageType::Init
    }

    fn timestamp(&self) -> Option<u64> {
        Some(self.timestamp)
    }

    fn body_len(&self) -> usize {
        packed_string_len(&self.system_name)
            + 4
            + packed_string_len(PROTOCOL_VERSION)
            + packed_string_len(&self.system_type)
            + packed_string_len(&self.resource_identifier)
            + packed_string_len(&self.resource_version)
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        put_packed_string(buf, &self.system_name);
        buf.put_i32_le(INIT_SENTINEL);
        put_packed_string(buf, PROTOCOL_VERSION);
        put_packed_string(buf, &self.system_type);
        put_packed_string(buf, &self.resource_identifier);
        put_packed_string(buf, &self.resource_version);
    }
}

impl fmt::Display for Init {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_preamble(f, MessageType::Init, self.timestamp)?;
        writeln!(f, "   System name: {}", self.system_name)?;
        writeln!(f, "   System type: {}", self.system_type)?;
        writeln!(f, "   Resource identifier: {}", self.resource_identifier)?;
        write!(f, "   Resource version: {}", self.resource_version)
    }
}
