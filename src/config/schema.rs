//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Target resolution and upstream client settings.
    pub relay: UpstreamConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3001").
    pub bind_address: String,

    /// How long shutdown waits for open responses before dropping them,
    /// in milliseconds. SSE streams may never end on their own.
    pub drain_timeout_ms: u64,
}

impl ListenerConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            drain_timeout_ms: 10_000,
        }
    }
}

/// Relay behaviour toward callers and upstream hosts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// First path segment under which encoded targets are mounted.
    pub mount_prefix: String,

    /// Maximum wait for upstream response headers, in milliseconds.
    pub first_byte_timeout_ms: u64,

    /// TCP connect timeout toward the upstream, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Validate upstream TLS certificates. Off by default: targets are
    /// user-supplied third-party hosts.
    pub verify_upstream_tls: bool,
}

impl UpstreamConfig {
    pub fn first_byte_timeout(&self) -> Duration {
        Duration::from_millis(self.first_byte_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            mount_prefix: "proxy".to_string(),
            first_byte_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            verify_upstream_tls: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
