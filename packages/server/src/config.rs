//! Relay configuration.

use std::time::Duration;

use thiserror::Error;

/// Liveness probe interval
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);
/// Read deadline, extended each time a pong arrives
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);
/// Deadline for a single frame write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-connection outbound queue capacity (frames)
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;
/// Largest inbound message accepted from a client (bytes)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 512;
/// Number of messages returned by the history endpoint
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Pings must be sent before the read deadline expires
    #[error("ping interval ({ping:?}) must be shorter than read timeout ({read:?})")]
    PingIntervalTooLong { ping: Duration, read: Duration },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Settings shared by the hub, the connection pumps and the HTTP handlers
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub ping_interval: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub outbound_capacity: usize,
    pub max_frame_bytes: usize,
    pub history_limit: usize,
    /// Origin allowed by CORS; `None` disables the CORS layer
    pub allowed_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            history_limit: DEFAULT_HISTORY_LIMIT,
            allowed_origin: None,
        }
    }
}

impl ServerConfig {
    /// Check the invariants the connection pumps rely on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the ping interval is not shorter than the read
    /// timeout, or if any timing or size is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ping_interval.is_zero() {
            return Err(ConfigError::Zero("ping interval"));
        }
        if self.write_timeout.is_zero() {
            return Err(ConfigError::Zero("write timeout"));
        }
        if self.outbound_capacity == 0 {
            return Err(ConfigError::Zero("outbound capacity"));
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::Zero("max frame bytes"));
        }
        if self.ping_interval >= self.read_timeout {
            return Err(ConfigError::PingIntervalTooLong {
                ping: self.ping_interval,
                read: self.read_timeout,
            });
        }
        Ok(())
    }
}
