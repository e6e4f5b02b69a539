//! # MailHands Chrome driver
//!
//! Drives a local Chrome over the DevTools Protocol.
//!
//! - [`ChromeLauncher`] - [`SessionLauncher`](mailhands_protocols::SessionLauncher)
//!   that starts (or reuses) Chrome and opens one tab per session
//! - [`CdpPage`] - [`PageDriver`](mailhands_protocols::PageDriver) over one tab
//! - [`BrowserManager`] - Chrome process and connection lifecycle

pub mod cdp;
mod launcher;
mod manager;
mod page;

pub use launcher::ChromeLauncher;
pub use manager::{BrowserError, BrowserManager, BrowserManagerConfig};
pub use page::CdpPage;
