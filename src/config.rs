//! Client configuration.
//!
//! A [`ClientConfig`] can be built in code or deserialized, for example
//! from the JSON section of a larger application config:
//!
//! ```
//! use sas_client::ClientConfig;
//!
//! let config = ClientConfig::from_json(r#"{
//!     "system_name": "sprout-1",
//!     "system_type": "sprout",
//!     "resource_identifier": "org.projectclearwater.20151201",
//!     "server_address": "sas.example.com",
//!     "heartbeat_interval": "500ms"
//! }"#)?;
//!
//! assert_eq!(config.port, 6761);
//! # Ok::<(), sas_client::SasError>(())
//! ```
//!
//! Durations accept `"250ms"`, `"5s"`, `"1m"` or a bare number of seconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::{DEFAULT_MAX_RECONNECT_WAIT, DEFAULT_MIN_RECONNECT_WAIT};
use crate::error::{Result, SasError};
use crate::message::Init;
use crate::protocol::{DEFAULT_SAS_PORT, MAX_PACKED_STRING_LEN};
use crate::queue::{DEFAULT_QUEUE_CAPACITY, MINIMUM_QUEUE_CAPACITY};
use crate::transport::DEFAULT_CONNECT_TIMEOUT;
use crate::worker::WorkerSettings;

/// Everything needed to start a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of this system instance, shown in SAS.
    pub system_name: String,

    /// Kind of system, e.g. `"sprout"`.
    pub system_type: String,

    /// Resource bundle identifier.
    pub resource_identifier: String,

    #[serde(default)]
    pub resource_version: String,

    /// SAS server host name or address.
    pub server_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Messages held while disconnected. Values below the minimum are raised.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(
        default = "default_connect_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub connect_timeout: Duration,

    #[serde(
        default = "default_send_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub send_timeout: Duration,

    /// Idle time after which a heartbeat is sent.
    #[serde(
        default = "default_heartbeat_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub heartbeat_interval: Duration,

    #[serde(
        default = "default_min_reconnect_wait",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub min_reconnect_wait: Duration,

    #[serde(
        default = "default_max_reconnect_wait",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub max_reconnect_wait: Duration,
}

const fn default_port() -> u16 {
    DEFAULT_SAS_PORT
}

const fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

const fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

const fn default_send_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_heartbeat_interval() -> Duration {
    Duration::from_secs(1)
}

const fn default_min_reconnect_wait() -> Duration {
    DEFAULT_MIN_RECONNECT_WAIT
}

const fn default_max_reconnect_wait() -> Duration {
    DEFAULT_MAX_RECONNECT_WAIT
}

impl ClientConfig {
    /// Config with the required fields set and defaults for the rest.
    pub fn new(
        system_name: impl Into<String>,
        system_type: impl Into<String>,
        resource_identifier: impl Into<String>,
        server_address: impl Into<String>,
    ) -> Self {
        Self {
            system_name: system_name.into(),
            system_type: system_type.into(),
            resource_identifier: resource_identifier.into(),
            resource_version: String::new(),
            server_address: server_address.into(),
            port: default_port(),
            queue_capacity: default_queue_capacity(),
            connect_timeout: default_connect_timeout(),
            send_timeout: default_send_timeout(),
            heartbeat_interval: default_heartbeat_interval(),
            min_reconnect_wait: default_min_reconnect_wait(),
            max_reconnect_wait: default_max_reconnect_wait(),
        }
    }

    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("system_name", &self.system_name),
            ("system_type", &self.system_type),
            ("resource_identifier", &self.resource_identifier),
            ("resource_version", &self.resource_version),
        ] {
            if value.len() > MAX_PACKED_STRING_LEN {
                return Err(SasError::Config(format!(
                    "{field} is {} bytes, at most {MAX_PACKED_STRING_LEN} allowed",
                    value.len()
                )));
            }
        }

        if self.server_address.trim().is_empty() {
            return Err(SasError::Config("server_address must not be empty".into()));
        }
        if self.heartbeat_interval.is_zero() {
            return Err(SasError::Config(
                "heartbeat_interval must be greater than zero".into(),
            ));
        }
        if self.min_reconnect_wait.is_zero() {
            return Err(SasError::Config(
                "min_reconnect_wait must be greater than zero".into(),
            ));
        }
        if self.min_reconnect_wait > self.max_reconnect_wait {
            return Err(SasError::Config(format!(
                "min_reconnect_wait ({:?}) exceeds max_reconnect_wait ({:?})",
                self.min_reconnect_wait, self.max_reconnect_wait
            )));
        }
        Ok(())
    }

    /// Queue capacity after applying the minimum.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(MINIMUM_QUEUE_CAPACITY)
    }

    /// Handshake announcing this system.
    pub fn init_message(&self) -> Result<Init> {
        Init::new(
            self.system_name.as_str(),
            self.system_type.as_str(),
            self.resource_identifier.as_str(),
        )?
        .with_resource_version(self.resource_version.as_str())
    }

    pub(crate) fn worker_settings(&self) -> Result<WorkerSettings> {
        Ok(WorkerSettings {
            init: self.init_message()?,
            heartbeat_interval: self.heartbeat_interval,
            send_timeout: self.send_timeout,
            min_reconnect_wait: self.min_reconnect_wait,
            max_reconnect_wait: self.max_reconnect_wait,
        })
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(serde::de::Error::custom)
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format!("{}ms", duration.as_millis()))
}

fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let invalid = || format!("Invalid duration: {s}");

    if let Some(stripped) = s.strip_suffix("ms") {
        let ms: u64 = stripped.trim().parse().map_err(|_| invalid())?;
        Ok(Duration::from_millis(ms))
    } else if let Some(stripped) = s.strip_suffix('s') {
        let secs: u64 = stripped.trim().parse().map_err(|_| invalid())?;
        Ok(Duration::from_secs(secs))
    } else if let Some(stripped) = s.strip_suffix('m') {
        let mins: u64 = stripped.trim().parse().map_err(|_| invalid())?;
        let secs = mins.checked_mul(60).ok_or_else(invalid)?;
        Ok(Duration::from_secs(secs))
    } else {
        let secs: u64 = s.parse().map_err(|_| invalid())?;
        Ok(Duration::from_secs(secs))
    }
}
