use std::collections::{HashMap, HashSet};

use pvl_types::{BatchStatus, Role};

use crate::config::GateConfig;
use crate::denial::Denial;

/// Role lookups over the configured transition rules.
#[derive(Clone, Debug)]
pub struct AuthorizationTable {
    administrator_override: bool,
    permitted: HashMap<(BatchStatus, BatchStatus), HashSet<Role>>,
}

impl AuthorizationTable {
    pub fn from_config(config: &GateConfig) -> Self {
        let mut permitted: HashMap<(BatchStatus, BatchStatus), HashSet<Role>> = HashMap::new();
        for rule in &config.rules {
            permitted
                .entry((rule.from, rule.to))
                .or_default()
                .extend(rule.roles.iter().copied());
        }
        Self {
            administrator_override: config.administrator_override,
            permitted,
        }
    }

    /// Whether `role` may perform the step `from -> to`.
    ///
    /// Says nothing about whether the step itself is legal; that is the
    /// lifecycle check's job.
    pub fn permits(&self, role: Role, from: BatchStatus, to: BatchStatus) -> bool {
        if role == Role::Administrator && self.administrator_override {
            return true;
        }
        self.permitted
            .get(&(from, to))
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Check a legal step against the table.
    pub fn check(&self, role: Role, from: BatchStatus, to: BatchStatus) -> Result<(), Denial> {
        if self.permits(role, from, to) {
            Ok(())
        } else {
            Err(Denial::RoleNotPermitted {
                role,
                from: Some(from),
                to,
            })
        }
    }

    /// Check that `role` may register new batches.
    pub fn check_creation(&self, role: Role) -> Result<(), Denial> {
        if role.may_create_batches() {
            Ok(())
        } else {
            Err(Denial::RoleNotPermitted {
                role,
                from: None,
                to: BatchStatus::Harvested,
            })
        }
    }
}

impl Default for AuthorizationTable {
    fn default() -> Self {
        Self::from_config(&GateConfig::default())
    }
}
