//! UI 層: HTTP / WebSocket のエンドポイントとサーバー起動

mod error;
pub mod handler;
mod server;
mod signal;
pub mod state;

pub use error::ServerError;
pub use server::{Server, build_router};
pub use signal::shutdown_signal;
