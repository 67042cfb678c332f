//! Realtime room coordination server library.
//!
//! This library backs a collaborative code editor: rooms with a single host,
//! a shared document, code execution through an external provider, cursor
//! presence and line-anchored comment threads, all over one WebSocket per
//! participant.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
