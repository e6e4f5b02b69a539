//! # MailHands Protocols
//!
//! Core protocol definitions for the MailHands framework.
//! Contains the shared data model and interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`PageDriver`] - One live browser page, driven by the action engine
//! - [`SessionLauncher`] - Opens fresh pages for a task
//! - [`IntentParser`] - Turns an instruction into an [`EmailIntent`]

pub mod driver;
pub mod error;
pub mod parser;
pub mod types;

pub use driver::{ElementHandle, PageDriver, SessionLauncher, SessionOptions};
pub use error::{DriverError, EngineError, ErrorKind};
pub use parser::IntentParser;
pub use types::*;
