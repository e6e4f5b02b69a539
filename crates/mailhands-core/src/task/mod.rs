//! Asynchronous task tracking.

mod record;
mod registry;

pub use record::{TaskRecord, TaskStatus};
pub use registry::TaskRegistry;
