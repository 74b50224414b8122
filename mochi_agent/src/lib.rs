//! Library surface for the Mochi agent: stat collection, command execution,
//! directory listing and the bridge that exposes them to the UI process.

pub mod bridge;
pub mod config;
pub mod dirlist;
pub mod exec;
pub mod gpu;
pub mod metrics;
pub mod state;
pub mod types;
pub mod ws;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
