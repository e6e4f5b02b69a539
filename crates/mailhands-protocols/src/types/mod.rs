//! Shared data model.

mod field;
mod intent;
mod locator;

pub use field::Field;
pub use intent::{EmailIntent, is_valid_email};
pub use locator::{Locator, LocatorError, LocatorSet, LocatorStrategy};
