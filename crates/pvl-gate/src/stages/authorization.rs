use crate::authorization::AuthorizationTable;
use crate::error::GateError;
use crate::stage::{GateStage, StageDecision, TransitionRequest};

/// Role authorization stage.
///
/// Looks the step up in the authorization table. Runs after the lifecycle
/// stage, so it only ever sees legal steps.
pub struct AuthorizationStage {
    table: AuthorizationTable,
}

impl AuthorizationStage {
    pub fn new(table: AuthorizationTable) -> Self {
        Self { table }
    }
}

impl GateStage for AuthorizationStage {
    fn name(&self) -> &str {
        "authorization"
    }

    fn evaluate(&self, request: &TransitionRequest) -> Result<StageDecision, GateError> {
        Ok(self
            .table
            .check(request.role, request.current, request.requested)
            .into())
    }
}
