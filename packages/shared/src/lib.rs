//! Shared utilities for the Kobo workspace.
//!
//! Logging setup and time helpers used by both the server and the client
//! binaries.

pub mod logger;
pub mod time;
