//! Protocol configuration parameters.
//!
//! All tunable timing for the polling protocol. Values can be overridden by
//! the host application before constructing a controller or responder.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time::DurationMs;

/// Core protocol configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// How long the controller waits for a node's response before the poll
    /// is abandoned (milliseconds). Each received `UpdateSensor` re-arms
    /// this window.
    pub response_timeout_ms: DurationMs,
    /// Minimum spacing between physical transceiver accesses
    /// (milliseconds). `heartbeat()` calls arriving faster than this get
    /// no-ops on the radio path.
    pub radio_service_interval_ms: DurationMs,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: 1000,
            radio_service_interval_ms: 100, // 10 Hz radio ceiling
        }
    }
}

impl ProtocolConfig {
    /// Reject (never clamp) invalid values.
    pub fn validate(&self) -> Result<()> {
        if self.response_timeout_ms == 0 {
            return Err(Error::Config("response timeout must be non-zero"));
        }
        if self.radio_service_interval_ms == 0 {
            return Err(Error::Config("radio service interval must be non-zero"));
        }
        if self.response_timeout_ms <= self.radio_service_interval_ms {
            return Err(Error::Config(
                "response timeout must exceed the radio service interval",
            ));
        }
        Ok(())
    }
}
