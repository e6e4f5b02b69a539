//! WebSocket task updates.

mod handler;
mod message;

pub use handler::task_updates;
pub use message::TaskUpdate;
