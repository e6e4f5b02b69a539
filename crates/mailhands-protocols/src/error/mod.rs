//! Error types for the MailHands protocol layer.

mod driver;
mod engine;

pub use driver::*;
pub use engine::*;
