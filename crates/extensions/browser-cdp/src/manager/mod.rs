//! Chrome process and connection manager.
//!
//! Launches Chrome with remote debugging on first use (or attaches to one
//! already listening on the debug port) and hands out fresh tabs.

mod manager_core;
mod manager_types;

pub use manager_core::BrowserManager;
pub use manager_types::{BrowserError, BrowserManagerConfig};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
