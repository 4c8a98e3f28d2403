use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use parking_lot::RwLock;
use pvl_service::{ActorDirectory, ServiceError};
use pvl_types::{ActorId, Role};
use tracing::info;

use crate::config::BootstrapActor;
use crate::error::{ServerError, ServerResult};

/// Who is calling, as vouched for by an [`IdentityProvider`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Identity {
    pub actor_id: ActorId,
    pub role: Role,
}

impl Identity {
    /// Fail with `Forbidden` unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> ServerResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ServerError::Forbidden(format!(
                "role {} may not perform this operation",
                self.role
            )))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| Self::Bearer(token.trim().to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

/// Authenticates callers. The ledger trusts whatever identity this returns.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;

    /// Mint a credential for `identity`.
    ///
    /// Providers backed by an external identity system return `None`; their
    /// users obtain credentials elsewhere.
    async fn issue(&self, _identity: Identity) -> ServerResult<Option<String>> {
        Ok(None)
    }
}

/// Bearer tokens mapped to registered actors.
///
/// Seeded from the configuration's bootstrap actors; tokens issued at runtime
/// live in memory only and are lost on restart.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    tokens: RwLock<HashMap<String, Identity>>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: impl Into<String>, identity: Identity) {
        self.tokens.write().insert(token.into(), identity);
    }

    /// Register each bootstrap actor and map its token.
    ///
    /// Actors with an external identity that is already registered are
    /// re-attached instead, so a durable server can restart with the same
    /// configuration.
    pub fn bootstrap(directory: &ActorDirectory, actors: &[BootstrapActor]) -> ServerResult<Self> {
        let provider = Self::new();
        for entry in actors {
            let existing = match &entry.external_identity {
                Some(identity) => match directory.resolve_identity(identity) {
                    Ok(actor) => Some(actor),
                    Err(ServiceError::NotFound(_)) => None,
                    Err(err) => return Err(err.into()),
                },
                None => None,
            };
            let actor = match existing {
                Some(actor) if actor.role != entry.role => {
                    return Err(ServerError::Config(format!(
                        "bootstrap actor {:?} is registered as {}, configured as {}",
                        entry.display_name, actor.role, entry.role
                    )));
                }
                Some(actor) => actor,
                None => directory.register(entry.registration())?,
            };
            info!(actor = %actor.id, role = %actor.role, name = %actor.display_name, "bootstrap actor ready");
            provider.insert(
                entry.token.clone(),
                Identity {
                    actor_id: actor.id,
                    role: actor.role,
                },
            );
        }
        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Bearer(token) => self
                .tokens
                .read()
                .get(token)
                .copied()
                .ok_or_else(|| ServerError::Unauthorized("unknown bearer token".into())),
            Credentials::Anonymous => Err(ServerError::Unauthorized(
                "missing bearer token".into(),
            )),
        }
    }

    async fn issue(&self, identity: Identity) -> ServerResult<Option<String>> {
        let token = format!(
            "pvl_{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        self.insert(token.clone(), identity);
        info!(actor = %identity.actor_id, role = %identity.role, "bearer token issued");
        Ok(Some(token))
    }
}
