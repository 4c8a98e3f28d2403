use std::time::{Duration, Instant};

use pvl_types::Role;
use tracing::debug;

use crate::authorization::AuthorizationTable;
use crate::config::GateConfig;
use crate::denial::Denial;
use crate::error::GateError;
use crate::stage::{GateStage, StageDecision, StageResult, TransitionRequest};
use crate::stages::{AuthorizationStage, LifecycleStage};

// ---------------------------------------------------------------------------
// GateResult
// ---------------------------------------------------------------------------

/// The outcome of running a request through the full gate pipeline.
#[derive(Clone, Debug)]
pub struct GateResult {
    /// The first denial, if any stage refused the request.
    pub denial: Option<Denial>,
    /// Per-stage results in evaluation order.
    pub stage_results: Vec<StageResult>,
    /// Total wall-clock time for the pipeline evaluation.
    pub elapsed: Duration,
}

impl GateResult {
    /// Returns `true` if every stage passed.
    pub fn is_allowed(&self) -> bool {
        self.denial.is_none()
    }

    /// The decision as a `Result`.
    pub fn into_result(self) -> Result<(), Denial> {
        match self.denial {
            Some(denial) => Err(denial),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// TransitionGate
// ---------------------------------------------------------------------------

/// The transition gate: a pipeline of stages that every status change must
/// pass before anything is appended to a ledger.
pub struct TransitionGate {
    stages: Vec<Box<dyn GateStage>>,
    table: AuthorizationTable,
    config: GateConfig,
}

impl TransitionGate {
    /// Create a gate with an empty pipeline.
    ///
    /// Use [`Self::add_stage`] to add stages, or [`Self::with_default_stages`]
    /// for the standard pipeline.
    pub fn new(config: GateConfig) -> Result<Self, GateError> {
        config.validate()?;
        Ok(Self {
            stages: Vec::new(),
            table: AuthorizationTable::from_config(&config),
            config,
        })
    }

    /// Create a gate with the default stage pipeline: lifecycle -> authorization.
    pub fn with_default_stages(config: GateConfig) -> Result<Self, GateError> {
        let mut gate = Self::new(config)?;
        let table = gate.table.clone();
        gate.add_stage(Box::new(LifecycleStage));
        gate.add_stage(Box::new(AuthorizationStage::new(table)));
        Ok(gate)
    }

    /// Append a stage to the end of the pipeline.
    pub fn add_stage(&mut self, stage: Box<dyn GateStage>) {
        self.stages.push(stage);
    }

    /// The current configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Evaluate a request through the full pipeline.
    ///
    /// The pipeline is **fail-fast**: the first stage that denies stops
    /// evaluation.
    pub fn evaluate(&self, request: &TransitionRequest) -> Result<GateResult, GateError> {
        let pipeline_start = Instant::now();
        let mut stage_results = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let stage_start = Instant::now();
            let decision = stage.evaluate(request)?;
            let elapsed = stage_start.elapsed();

            debug!(
                stage = stage.name(),
                passed = decision.is_pass(),
                elapsed_us = elapsed.as_micros() as u64,
                "gate stage evaluated"
            );

            let denial = match decision {
                StageDecision::Pass => None,
                StageDecision::Deny(denial) => Some(denial),
            };
            stage_results.push(StageResult {
                stage_name: stage.name().to_string(),
                passed: denial.is_none(),
                denial,
                elapsed,
            });

            if denial.is_some() {
                return Ok(GateResult {
                    denial,
                    stage_results,
                    elapsed: pipeline_start.elapsed(),
                });
            }
        }

        Ok(GateResult {
            denial: None,
            stage_results,
            elapsed: pipeline_start.elapsed(),
        })
    }

    /// Check whether `role` may register a new batch.
    pub fn check_creation(&self, role: Role) -> Result<(), Denial> {
        self.table.check_creation(role)
    }
}

impl std::fmt::Debug for TransitionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        f.debug_struct("TransitionGate")
            .field("stages", &names)
            .field("administrator_override", &self.config.administrator_override)
            .finish()
    }
}
