//! Intent parser protocol.

use crate::error::EngineError;
use crate::types::EmailIntent;

/// Turns a natural-language instruction into a structured [`EmailIntent`].
///
/// Fails with [`EngineError::UnparsableInstruction`] when no recipient
/// address can be found.
pub trait IntentParser: Send + Sync {
    fn parse(&self, instruction: &str) -> Result<EmailIntent, EngineError>;
}
