//! Realtime group-chat relay library.
//!
//! Clients publish short text messages over a websocket; the hub fans each
//! message out to every live connection and the message store records it for
//! later retrieval.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
