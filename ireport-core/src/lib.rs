//! iReport Core - shared plumbing for the iReport crates
//!
//! Error context, logging initialisation and TOML configuration helpers used by
//! the auth core, the web backend and the command-line client.

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
pub use logging::*;

// Re-export commonly used external types
pub use tracing;
