//! Infrastructure 層
//!
//! Domain 層が定義するインターフェース（RoomRegistry, MessagePusher, CodeExecutor）の
//! 具体的な実装と、プロトコルごとの DTO を提供します。

pub mod code_executor;
pub mod dto;
pub mod message_pusher;
pub mod registry;
