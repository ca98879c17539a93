//! Transparent HTTP relay for calling third-party LLM APIs from a browser.
//!
//! A request to `/<mount_prefix>/<percent-encoded absolute URL>` is forwarded
//! to that URL with its method, headers and body intact, and the upstream
//! response is streamed back with permissive CORS headers.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use relay::{Relay, RelayError};
