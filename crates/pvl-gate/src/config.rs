use pvl_types::{BatchStatus, Role};
use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// One row of the authorization table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub from: BatchStatus,
    pub to: BatchStatus,
    /// Roles permitted to perform this step.
    pub roles: Vec<Role>,
}

impl TransitionRule {
    pub fn new(from: BatchStatus, to: BatchStatus, roles: impl Into<Vec<Role>>) -> Self {
        Self {
            from,
            to,
            roles: roles.into(),
        }
    }
}

/// Configuration for the transition gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// When `true`, administrators may perform any legal step regardless of
    /// the rules below. Terminal batches stay terminal either way.
    pub administrator_override: bool,
    /// Who may perform each lifecycle step.
    pub rules: Vec<TransitionRule>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            administrator_override: true,
            rules: vec![
                TransitionRule::new(
                    BatchStatus::Harvested,
                    BatchStatus::InTransit,
                    [Role::Aggregator, Role::Distributor],
                ),
                TransitionRule::new(
                    BatchStatus::InTransit,
                    BatchStatus::Delivered,
                    [Role::Distributor, Role::EndpointVerifier],
                ),
                TransitionRule::new(
                    BatchStatus::Delivered,
                    BatchStatus::Verified,
                    [Role::Aggregator, Role::Distributor, Role::EndpointVerifier],
                ),
            ],
        }
    }
}

impl GateConfig {
    /// Reject rules that could never apply: steps that are not a lifecycle
    /// successor, or a step listed twice.
    pub fn validate(&self) -> Result<(), GateError> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.from.successor() != Some(rule.to) {
                return Err(GateError::Config(format!(
                    "rule {index}: {} -> {} is not a lifecycle step",
                    rule.from, rule.to
                )));
            }
            if self.rules[..index]
                .iter()
                .any(|earlier| earlier.from == rule.from && earlier.to == rule.to)
            {
                return Err(GateError::Config(format!(
                    "rule {index}: {} -> {} is listed more than once",
                    rule.from, rule.to
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        assert!(GateConfig::default().validate().is_ok());
    }

    #[test]
    fn non_successor_rule_is_rejected() {
        let config = GateConfig {
            rules: vec![TransitionRule::new(
                BatchStatus::Harvested,
                BatchStatus::Verified,
                [Role::Producer],
            )],
            ..GateConfig::default()
        };
        assert!(matches!(config.validate(), Err(GateError::Config(_))));
    }

    #[test]
    fn duplicate_rule_is_rejected() {
        let mut config = GateConfig::default();
        let first = config.rules[0].clone();
        config.rules.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_overrides_fill_defaults() {
        let config: GateConfig = toml::from_str("administrator_override = false").unwrap();
        assert!(!config.administrator_override);
        assert_eq!(config.rules, GateConfig::default().rules);

        let custom: GateConfig = toml::from_str(
            r#"
            [[rules]]
            from = "harvested"
            to = "in-transit"
            roles = ["farmer"]
            "#,
        )
        .unwrap();
        assert_eq!(custom.rules.len(), 1);
        assert_eq!(custom.rules[0].roles, vec![Role::Producer]);
    }
}
