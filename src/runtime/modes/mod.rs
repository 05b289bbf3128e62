//! Execution modes
//!
//! - Server mode (HTTP server, default)
//! - CLI subcommands (data loading, config generation) live in `crate::cli`

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "server")]
pub use server::run_server;
