//! Infrastructure 層
//!
//! - `dto`: ワイヤーフォーマット
//! - `hub`: 接続集合を管理するアクター
//! - `repository`: `MessageStore` の実装（インメモリ、PostgreSQL）

pub mod dto;
pub mod hub;
pub mod repository;
