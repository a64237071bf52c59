//! Irori real-time messaging router.
//!
//! Routes chat messages, presence and typing indicators between WebSocket
//! connections grouped into channel and direct-message rooms.

pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
