//! # MailHands API
//!
//! HTTP task API over the [`TaskRegistry`](mailhands_core::TaskRegistry).
//!
//! - **HTTP**: submit send tasks, poll their status, list and evict them,
//!   sample a provider's DOM
//! - **WebSocket**: push a task's record every second until it finishes

pub mod error;
pub mod http;
pub mod server;
pub mod state;
pub mod websocket;

pub use error::ApiError;
pub use http::routes::create_router;
pub use server::{ApiConfig, ApiServer};
pub use state::AppState;
