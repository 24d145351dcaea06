use crate::playback::PlayerState;
use thiserror::Error;

/// Errors produced while building patterns, pulling streams or driving players.
///
/// Every error is local: a failing stream aborts only the player that owns it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    /// Operation not valid in the player's current state.
    #[error("cannot {operation} a player that is {state}")]
    InvalidState {
        operation: &'static str,
        state: PlayerState,
    },

    /// An infinite pattern was used where termination is required.
    #[error("unbounded composition: {0}")]
    UnboundedComposition(String),

    /// A produced value did not have the expected shape.
    #[error("value error: {0}")]
    Value(String),

    /// A constructor was given arguments it cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl PatternError {
    pub(crate) fn invalid_state(operation: &'static str, state: PlayerState) -> Self {
        PatternError::InvalidState { operation, state }
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        PatternError::Value(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PatternError>;
