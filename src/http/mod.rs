//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, trace layer, mount route)
//!     → relay::Relay (resolve, forward, stream back)
//!     → Send to client
//! ```

pub mod server;

pub use server::{build_router, RelayServer};
