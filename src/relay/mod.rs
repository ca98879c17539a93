//! Relay core.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → target.rs   (decode & validate the mounted URL)
//!     → forward.rs  (mirror method/headers/body upstream)
//!     → response.rs (stream status/headers/body back)
//!
//! failures from target.rs or forward.rs
//!     → error.rs    (fixed status mapping)
//! ```

pub mod error;
pub mod forward;
pub mod headers;
pub mod response;
pub mod target;
pub mod tls;

use axum::{body::Body, http::Request, response::Response};

use crate::config::UpstreamConfig;

pub use error::RelayError;
pub use forward::Forwarder;
pub use target::{resolve, ResolvedTarget};

/// Per-process relay: the mount prefix plus the upstream client.
#[derive(Debug, Clone)]
pub struct Relay {
    mount_prefix: String,
    forwarder: Forwarder,
}

impl Relay {
    pub fn new(config: &UpstreamConfig) -> Result<Self, RelayError> {
        Ok(Self {
            mount_prefix: config.mount_prefix.clone(),
            forwarder: Forwarder::new(config)?,
        })
    }

    pub fn mount_prefix(&self) -> &str {
        &self.mount_prefix
    }

    /// Relay one request. Resolution errors never reach the forwarder and
    /// forwarding errors never reach the response relay.
    pub async fn handle(&self, request: Request<Body>) -> Result<Response, RelayError> {
        let target = resolve(&self.mount_prefix, request.uri())?;
        tracing::Span::current().record("target", tracing::field::display(&target));

        let upstream = self.forwarder.forward(&target, request).await?;
        Ok(response::relay_response(upstream))
    }
}
