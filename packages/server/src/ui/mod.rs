//! Real-time room coordination server implementation.

mod handler;
mod server;
mod signal;
pub mod state; // bin・テストから DI で構築するため public

pub use server::Server;
