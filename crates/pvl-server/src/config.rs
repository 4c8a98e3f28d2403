use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use pvl_service::ServiceConfig;
use pvl_types::{ActorRegistration, Role};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding the write-ahead log. In-memory when unset.
    pub data_dir: Option<PathBuf>,
    pub service: ServiceConfig,
    /// Actors registered (or re-attached) at startup, with their bearer tokens.
    pub bootstrap_actors: Vec<BootstrapActor>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            data_dir: None,
            service: ServiceConfig::default(),
            bootstrap_actors: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML configuration file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ServerResult<()> {
        self.service
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let mut tokens = HashSet::new();
        for actor in &self.bootstrap_actors {
            if actor.token.trim().is_empty() {
                return Err(ServerError::Config(format!(
                    "bootstrap actor {:?} has an empty token",
                    actor.display_name
                )));
            }
            if !tokens.insert(actor.token.as_str()) {
                return Err(ServerError::Config(format!(
                    "bootstrap actor {:?} reuses another actor's token",
                    actor.display_name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapActor {
    pub display_name: String,
    pub role: Role,
    /// Lets a durable server find the same actor again after a restart.
    #[serde(default)]
    pub external_identity: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub token: String,
}

impl BootstrapActor {
    pub fn registration(&self) -> ActorRegistration {
        ActorRegistration {
            display_name: self.display_name.clone(),
            role: self.role,
            external_identity: self.external_identity.clone(),
            location: self.location.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert!(c.data_dir.is_none());
        assert!(c.bootstrap_actors.is_empty());
        assert_eq!(c.service, ServiceConfig::default());
    }

    #[test]
    fn load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            bind_addr = "0.0.0.0:9000"
            data_dir = "/var/lib/pvl"

            [service]
            lock_timeout_ms = 100

            [[bootstrap_actors]]
            display_name = "Ops"
            role = "admin"
            external_identity = "ops@example.com"
            token = "ops-token"
            "#
        )
        .unwrap();

        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/pvl")));
        assert_eq!(config.service.lock_timeout_ms, 100);
        assert_eq!(config.bootstrap_actors[0].role, Role::Administrator);
    }

    #[test]
    fn duplicate_tokens_rejected() {
        let actor = BootstrapActor {
            display_name: "A".into(),
            role: Role::Producer,
            external_identity: None,
            location: None,
            token: "same".into(),
        };
        let config = ServerConfig {
            bootstrap_actors: vec![actor.clone(), BootstrapActor { display_name: "B".into(), ..actor }],
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "bind_addr = 42").unwrap();
        assert!(matches!(
            ServerConfig::load(file.path()),
            Err(ServerError::Config(_))
        ));
    }
}
