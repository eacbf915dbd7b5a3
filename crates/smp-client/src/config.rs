// ============================================
// File: crates/smp-client/src/config.rs
// ============================================
//! # Client Configuration
//!
//! ## Creation Reason
//! Provides configuration management for the SMP client with TOML file
//! support and validation.
//!
//! ## Main Functionality
//! - `ClientConfig`: Top-level configuration
//! - `ConnectionConfig`: Timeouts for connection setup and writes
//! - `DeliveryConfig`: Delivery queue sizing
//!
//! ## Configuration File Format
//! ```toml
//! [connection]
//! connect_timeout_secs = 10
//! write_timeout_secs = 10
//!
//! [delivery]
//! queue_capacity = 64
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Validate config before connecting; a zero timeout would make
//!   every write fail immediately
//! - The delivery queue capacity bounds how far the broker can run
//!   ahead of the application before the inbound loop backpressures
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ClientError, Result};

// ============================================
// ClientConfig
// ============================================

/// Main client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Connection timeouts.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Delivery queue sizing.
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl ClientConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ClientError::ConfigLoad {
                reason: format!("{}: {}", path_str, e),
            }
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string (useful for testing).
    ///
    /// # Errors
    /// Returns error if the string cannot be parsed or validated.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ClientError::ConfigLoad {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        self.delivery.validate()?;
        Ok(())
    }

    /// Serializes configuration to a TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    // ========================================
    // Helper methods
    // ========================================

    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.connect_timeout_secs)
    }

    /// Returns the per-block write timeout.
    #[must_use]
    pub const fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.write_timeout_secs)
    }

    /// Returns the delivery queue capacity.
    #[must_use]
    pub const fn queue_capacity(&self) -> usize {
        self.delivery.queue_capacity
    }
}

// ============================================
// ConnectionConfig
// ============================================

/// Connection configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-block write timeout in seconds.
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_write_timeout_secs() -> u64 {
    10
}

impl ConnectionConfig {
    fn validate(&self) -> Result<()> {
        if self.connect_timeout_secs == 0 {
            return Err(ClientError::invalid_config(
                "connection.connect_timeout_secs",
                "cannot be 0",
            ));
        }
        if self.write_timeout_secs == 0 {
            return Err(ClientError::invalid_config(
                "connection.write_timeout_secs",
                "cannot be 0",
            ));
        }
        Ok(())
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            write_timeout_secs: default_write_timeout_secs(),
        }
    }
}

// ============================================
// DeliveryConfig
// ============================================

/// Delivery queue configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Capacity of the unsolicited-message queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

const fn default_queue_capacity() -> usize {
    64
}

impl DeliveryConfig {
    fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(ClientError::invalid_config(
                "delivery.queue_capacity",
                "cannot be 0",
            ));
        }
        Ok(())
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ============================================
// Tests
// ============================================
