//! gcal-mcp - Google Calendar over the Model Context Protocol
//!
//! Exposes calendar operations as MCP tools, including scoped edits of
//! recurring events (one occurrence, the whole series, or an occurrence and
//! everything after it).

pub mod auth;
pub mod config;
pub mod error;
pub mod google;
pub mod mcp;
pub mod recurrence;
pub mod tools;
pub mod types;

pub use error::{CalendarError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
