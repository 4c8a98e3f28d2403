use std::time::Duration;

use pvl_types::{BatchStatus, Role};

use crate::denial::Denial;
use crate::error::GateError;

// ---------------------------------------------------------------------------
// TransitionRequest
// ---------------------------------------------------------------------------

/// A requested status change, evaluated by the gate pipeline.
///
/// Carries only what the decision depends on; the gate never looks at the
/// store or the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionRequest {
    pub current: BatchStatus,
    pub requested: BatchStatus,
    pub role: Role,
}

impl TransitionRequest {
    pub fn new(current: BatchStatus, requested: BatchStatus, role: Role) -> Self {
        Self {
            current,
            requested,
            role,
        }
    }
}

// ---------------------------------------------------------------------------
// StageDecision
// ---------------------------------------------------------------------------

/// The outcome of a single gate stage evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageDecision {
    /// The stage passed; proceed to the next stage.
    Pass,
    /// The stage refused the transition.
    Deny(Denial),
}

impl StageDecision {
    /// Returns `true` if the decision is `Pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl From<Result<(), Denial>> for StageDecision {
    fn from(result: Result<(), Denial>) -> Self {
        match result {
            Ok(()) => Self::Pass,
            Err(denial) => Self::Deny(denial),
        }
    }
}

// ---------------------------------------------------------------------------
// StageResult
// ---------------------------------------------------------------------------

/// Recorded result from a completed stage evaluation.
#[derive(Clone, Debug)]
pub struct StageResult {
    /// Name of the stage that produced this result.
    pub stage_name: String,
    /// Whether the stage passed.
    pub passed: bool,
    /// Populated when the stage refused the transition.
    pub denial: Option<Denial>,
    /// Wall-clock time the stage took to evaluate.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// GateStage trait
// ---------------------------------------------------------------------------

/// A single evaluation stage in the gate pipeline.
///
/// Stages are evaluated in order and must be pure: the same request always
/// yields the same decision. The trait is object-safe and `Send + Sync` so
/// stages can be stored in a `Vec<Box<dyn GateStage>>`.
pub trait GateStage: Send + Sync {
    /// Human-readable name of this stage (e.g. "lifecycle", "authorization").
    fn name(&self) -> &str;

    /// Evaluate the request and return a decision.
    fn evaluate(&self, request: &TransitionRequest) -> Result<StageDecision, GateError>;
}
