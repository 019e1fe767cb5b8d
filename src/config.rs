//! Client configuration.
//!
//! Every field has a default, so a JSON document only needs the fields it
//! changes:
//!
//! ```
//! use obex_pbap::{ClientConfig, ConnectionIdPolicy};
//! use std::time::Duration;
//!
//! let config = ClientConfig::from_json(r#"{
//!     "max_continuations": 64,
//!     "pull_timeout_ms": 30000,
//!     "connection_id_policy": "strict"
//! }"#).unwrap();
//!
//! assert_eq!(config.max_continuations, 64);
//! assert_eq!(config.pull_timeout, Some(Duration::from_secs(30)));
//! assert_eq!(config.connection_id_policy, ConnectionIdPolicy::Strict);
//! assert_eq!(config.settle_delay, Duration::from_millis(500));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::profile::DEFAULT_MAX_PACKET_SIZE;

/// Default bound on `Continue` rounds in one pull.
pub const DEFAULT_MAX_CONTINUATIONS: u32 = 1024;

/// Default pause after Disconnect before the channel may be closed.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// What to do when the Connect response has no connection id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionIdPolicy {
    /// Accept the connection and keep the last known id. A pull with no id
    /// at all fails with `MissingConnectionId`.
    #[default]
    Deferred,
    /// Fail the connect with `MissingConnectionId`.
    Strict,
}

/// Configuration for [`crate::PhonebookClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Largest packet announced to the server on connect.
    pub max_packet_size: u16,
    /// `Continue` rounds allowed after the first request of a pull.
    pub max_continuations: u32,
    /// Overall deadline for one pull.
    #[serde(rename = "pull_timeout_ms", with = "opt_millis")]
    pub pull_timeout: Option<Duration>,
    /// Pause after sending Disconnect.
    #[serde(rename = "settle_delay_ms", with = "millis")]
    pub settle_delay: Duration,
    pub connection_id_policy: ConnectionIdPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            max_continuations: DEFAULT_MAX_CONTINUATIONS,
            pull_timeout: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            connection_id_policy: ConnectionIdPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Load from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => super::millis::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
