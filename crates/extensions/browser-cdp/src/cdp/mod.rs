//! Chrome DevTools Protocol client.
//!
//! A single browser-level WebSocket carries every command; page sessions
//! are attached with `flatten: true` and addressed by `sessionId`.

mod client;
mod error;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
