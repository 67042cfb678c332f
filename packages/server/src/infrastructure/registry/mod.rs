//! RoomRegistry 実装

pub mod inmemory;

pub use inmemory::InMemoryRoomRegistry;
