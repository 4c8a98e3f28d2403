//! Transition gate for the Provenance Ledger.
//!
//! Every requested status change passes through the gate before anything is
//! appended to a batch's ledger. The gate runs a fail-fast pipeline of pure
//! stages (lifecycle legality, then role authorization) and produces either
//! an allow decision or a typed [`Denial`], with a per-stage audit trail.
//!
//! # Quick Start
//!
//! ```rust
//! use pvl_gate::{GateConfig, TransitionGate, TransitionRequest};
//! use pvl_types::{BatchStatus, Role};
//!
//! let gate = TransitionGate::with_default_stages(GateConfig::default()).unwrap();
//! let request = TransitionRequest::new(BatchStatus::Harvested, BatchStatus::InTransit, Role::Aggregator);
//! let result = gate.evaluate(&request).unwrap();
//! assert!(result.is_allowed());
//! ```

pub mod authorization;
pub mod config;
pub mod denial;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod stage;
pub mod stages;

pub use authorization::AuthorizationTable;
pub use config::{GateConfig, TransitionRule};
pub use denial::Denial;
pub use error::GateError;
pub use gate::{GateResult, TransitionGate};
pub use stage::{GateStage, StageDecision, StageResult, TransitionRequest};
pub use stages::{AuthorizationStage, LifecycleStage};

use pvl_types::{BatchStatus, Role};

/// Evaluate a status change against the default authorization table.
pub fn evaluate(current: BatchStatus, requested: BatchStatus, role: Role) -> Result<(), Denial> {
    lifecycle::check_step(current, requested)?;
    AuthorizationTable::default().check(role, current, requested)
}

/// `true` when [`evaluate`] allows the change.
pub fn allowed_transition(current: BatchStatus, requested: BatchStatus, role: Role) -> bool {
    evaluate(current, requested, role).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_gate() -> TransitionGate {
        TransitionGate::with_default_stages(GateConfig::default()).unwrap()
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    fn status_strategy() -> impl Strategy<Value = BatchStatus> {
        prop::sample::select(BatchStatus::ALL.to_vec())
    }

    // -----------------------------------------------------------------------
    // 1. Default gate allows the happy path
    // -----------------------------------------------------------------------
    #[test]
    fn default_gate_allows_legal_step() {
        let gate = default_gate();
        let request =
            TransitionRequest::new(BatchStatus::Harvested, BatchStatus::InTransit, Role::Aggregator);
        let result = gate.evaluate(&request).unwrap();
        assert!(result.is_allowed());
        assert_eq!(result.stage_results.len(), 2);
        assert!(result.stage_results.iter().all(|r| r.passed));
    }

    // -----------------------------------------------------------------------
    // 2. Skipping a status fails fast at the lifecycle stage
    // -----------------------------------------------------------------------
    #[test]
    fn skip_fails_at_lifecycle() {
        let gate = default_gate();
        let request =
            TransitionRequest::new(BatchStatus::Harvested, BatchStatus::Delivered, Role::Administrator);
        let result = gate.evaluate(&request).unwrap();
        assert_eq!(result.stage_results.len(), 1);
        assert_eq!(result.stage_results[0].stage_name, "lifecycle");
        assert_eq!(
            result.into_result(),
            Err(Denial::OutOfOrder {
                from: BatchStatus::Harvested,
                to: BatchStatus::Delivered
            })
        );
    }

    // -----------------------------------------------------------------------
    // 3. A producer jumping straight to verified is refused
    // -----------------------------------------------------------------------
    #[test]
    fn producer_cannot_verify_directly() {
        assert!(!allowed_transition(
            BatchStatus::Harvested,
            BatchStatus::Verified,
            Role::Producer
        ));
    }

    // -----------------------------------------------------------------------
    // 4. Legal step, wrong role, fails at authorization
    // -----------------------------------------------------------------------
    #[test]
    fn wrong_role_fails_at_authorization() {
        let gate = default_gate();
        let request =
            TransitionRequest::new(BatchStatus::Harvested, BatchStatus::InTransit, Role::Producer);
        let result = gate.evaluate(&request).unwrap();
        assert_eq!(result.stage_results.len(), 2);
        assert_eq!(result.stage_results[1].stage_name, "authorization");
        assert!(result.denial.is_some_and(|d| d.is_authorization()));
    }

    // -----------------------------------------------------------------------
    // 5. Invalid configuration is rejected at construction
    // -----------------------------------------------------------------------
    #[test]
    fn invalid_config_rejected() {
        let config = GateConfig {
            rules: vec![TransitionRule::new(
                BatchStatus::Verified,
                BatchStatus::Harvested,
                [Role::Administrator],
            )],
            ..GateConfig::default()
        };
        assert!(matches!(
            TransitionGate::with_default_stages(config),
            Err(GateError::Config(_))
        ));
    }

    // -----------------------------------------------------------------------
    // 6. Custom stages run after the built-in ones
    // -----------------------------------------------------------------------
    #[test]
    fn custom_stage_appended() {
        struct NoVerifyStage;
        impl GateStage for NoVerifyStage {
            fn name(&self) -> &str {
                "no-verify"
            }
            fn evaluate(&self, request: &TransitionRequest) -> Result<StageDecision, GateError> {
                if request.requested == BatchStatus::Verified {
                    Err(GateError::stage("no-verify", "verification disabled"))
                } else {
                    Ok(StageDecision::Pass)
                }
            }
        }

        let mut gate = default_gate();
        gate.add_stage(Box::new(NoVerifyStage));
        assert_eq!(gate.stage_count(), 3);
        let request =
            TransitionRequest::new(BatchStatus::Delivered, BatchStatus::Verified, Role::Distributor);
        assert!(matches!(
            gate.evaluate(&request),
            Err(GateError::StageError { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // 7. Creation rights
    // -----------------------------------------------------------------------
    #[test]
    fn creation_rights() {
        let gate = default_gate();
        assert!(gate.check_creation(Role::Producer).is_ok());
        assert!(gate.check_creation(Role::EndpointVerifier).is_err());
    }

    proptest! {
        // Allowed exactly when the step is the successor and the role is
        // permitted (administrators always, under the default override).
        #[test]
        fn allowed_iff_successor_and_permitted(
            current in status_strategy(),
            requested in status_strategy(),
            role in role_strategy(),
        ) {
            let table = AuthorizationTable::default();
            let expected = current.successor() == Some(requested)
                && table.permits(role, current, requested);
            prop_assert_eq!(allowed_transition(current, requested, role), expected);
        }

        #[test]
        fn verified_is_terminal_for_every_role(
            requested in status_strategy(),
            role in role_strategy(),
        ) {
            prop_assert_eq!(
                evaluate(BatchStatus::Verified, requested, role),
                Err(Denial::TerminalState { status: BatchStatus::Verified })
            );
        }

        #[test]
        fn gate_agrees_with_free_function(
            current in status_strategy(),
            requested in status_strategy(),
            role in role_strategy(),
        ) {
            let gate = default_gate();
            let result = gate
                .evaluate(&TransitionRequest::new(current, requested, role))
                .unwrap();
            prop_assert_eq!(result.into_result(), evaluate(current, requested, role));
        }

        #[test]
        fn never_moves_backwards(
            current in status_strategy(),
            requested in status_strategy(),
            role in role_strategy(),
        ) {
            if allowed_transition(current, requested, role) {
                prop_assert_eq!(requested.ordinal(), current.ordinal() + 1);
            }
        }
    }
}
