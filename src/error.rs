//! Error types for the orchestration core
//!
//! Nothing in this crate may crash the host process: action failures are
//! flattened into `ActionOutcome` at the executor boundary, and preference
//! persistence failures are logged and recovered locally.

use thiserror::Error;

/// Errors raised while dispatching a message action.
///
/// These never escape `execute_action`; the boundary converts them to
/// `ActionOutcome { success: false, error }`.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unknown action")]
    UnknownAction,

    #[error("unknown persona: {0}")]
    UnknownPersona(String),

    #[error("failed to encode action result: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from the preference persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("home directory could not be resolved")]
    NoHomeDir,
}
