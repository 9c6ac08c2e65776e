use std::fmt;

use bytes::{BufMut, BytesMut};

use super::{now_millis, write_params, write_preamble, DataMessage, Scope, WireMessage};
use crate::protocol::{flags, MessageType, Parameters};
use crate::trail::Trail;

/// Metadata attached to a trail, optionally associating it with others.
///
/// ```text
/// 8 bytes - trail ID (BE)
/// 4 bytes - marker ID (BE)
/// 4 bytes - instance ID (BE)
/// 1 byte  - flags
/// 1 byte  - scope
/// parameter block
/// ```
///
/// The association flag is set whenever the scope is not [`Scope::None`];
/// the no-reactivate flag only accompanies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    timestamp: u64,
    trail: Trail,
    marker_id: u32,
    instance_id: u32,
    reactivate: bool,
    scope: Scope,
    params: Parameters,
}

impl Marker {
    const FIELDS_LEN: usize = 18;

    /// Marker `marker_id` on `trail`, not associated and stamped now.
    pub fn new(trail: Trail, marker_id: u32) -> Self {
        Self {
            timestamp: now_millis(),
            trail,
            marker_id,
            instance_id: 0,
            reactivate: true,
            scope: Scope::None,
            params: Parameters::new(),
        }
    }

    /// Associate the marker's trail with others carrying the same marker in `scope`.
    pub fn set_association_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Whether an association may reactivate a trail that has already ended.
    pub fn set_reactivate(mut self, reactivate: bool) -> Self {
        self.reactivate = reactivate;
        self
    }

    /// Distinguish repeated markers with the same ID on one trail.
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

    pub fn marker_id(&self) -> u32 {
        self.marker_id
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn reactivate(&self) -> bool {
        self.reactivate
    }

    /// Flags byte as sent on the wire.
    pub fn flags(&self) -> u8 {
        if self.scope == Scope::None {
            return 0;
        }
        let mut bits = flags::ASSOCIATE;
        if !self.reactivate {
            bits |= flags::NO_REACTIVATE;
        }
        bits
    }
}

impl WireMessage for Marker {
    fn message_type(&self) -> MessageType {
        MessageType::Marker
    }

    fn timestamp(&self) -> Option<u64> {
        Some(self.timestamp)
    }

    fn body_len(&self) -> usize {
        Self::FIELDS_LEN + self.params.encoded_len()
    }

    fn encode_body(&self, buf: &mut BytesMut) {
        buf.put_u64(self.trail.id());
        buf.put_u32(self.marker_id);
        buf.put_u32(self.instance_id);
        buf.put_u8(self.flags());
        buf.put_u8(self.scope.tag());
        self.params.encode_into(buf);
    }
}

impl DataMessage for Marker {
    fn params(&self) -> &Parameters {
        &self.params
    }

    fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_preamble(f, MessageType::Marker, self.timestamp)?;
        write_params(f, &self.params)?;
        writeln!(f, "   Trail: {}", self.trail)?;
        writeln!(f, "   Marker ID: 0x{:08x}", self.marker_id)?;
        writeln!(f, "   Instance ID: {}", self.instance_id)?;
        writeln!(f, "   Scope: {}", self.scope.tag())?;
        write!(
            f,
            "   Reactivate: {}",
            if self.reactivate { "True" } else { "False" }
        )
    }
}
