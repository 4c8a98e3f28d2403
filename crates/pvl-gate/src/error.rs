/// Errors that can occur while running the gate itself.
///
/// A refused transition is not an error here; it is reported as a
/// [`Denial`](crate::Denial) inside the [`GateResult`](crate::GateResult).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    /// A stage could not reach a decision.
    #[error("stage error in '{stage}': {message}")]
    StageError { stage: String, message: String },

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GateError {
    /// Create a stage error with a name and message.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageError {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
