use std::time::Duration;

use pvl_gate::GateConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Tunables for the command services.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// How long a transition waits for another writer on the same batch.
    pub lock_timeout_ms: u64,
    /// Lookup keys tried per new batch before giving up.
    pub lookup_key_attempts: u32,
    pub gate: GateConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 250,
            lookup_key_attempts: 8,
            gate: GateConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.lookup_key_attempts == 0 {
            return Err(ServiceError::InvalidInput(
                "lookup_key_attempts must be at least 1".into(),
            ));
        }
        self.gate.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
        assert_eq!(config.lookup_key_attempts, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            lock_timeout_ms = 50

            [gate]
            administrator_override = false
            "#,
        )
        .unwrap();
        assert_eq!(config.lock_timeout_ms, 50);
        assert_eq!(config.lookup_key_attempts, 8);
        assert!(!config.gate.administrator_override);
        assert_eq!(config.gate.rules.len(), 3);
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = ServiceConfig {
            lookup_key_attempts: 0,
            ..ServiceConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServiceError::InvalidInput(_))));
    }
}
