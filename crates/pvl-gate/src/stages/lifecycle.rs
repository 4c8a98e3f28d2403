use crate::error::GateError;
use crate::lifecycle::check_step;
use crate::stage::{GateStage, StageDecision, TransitionRequest};

/// Lifecycle legality stage.
///
/// Refuses terminal batches and anything other than the immediate successor,
/// for every role.
pub struct LifecycleStage;

impl GateStage for LifecycleStage {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn evaluate(&self, request: &TransitionRequest) -> Result<StageDecision, GateError> {
        Ok(check_step(request.current, request.requested).into())
    }
}
