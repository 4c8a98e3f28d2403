use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::ActorId;
use crate::role::Role;
use crate::temporal::Timestamp;

/// A registered participant in the supply chain.
///
/// Only `display_name` and `location` may change after registration; the id
/// and role are fixed so that historical ledger entries stay resolvable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub display_name: String,
    pub role: Role,
    /// Identity-provider handle (e.g. an e-mail address), unique when present.
    pub external_identity: Option<String>,
    /// Default location recorded on entries this actor appends.
    pub location: Option<String>,
    pub registered_at: Timestamp,
}

/// Input for registering a new actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRegistration {
    pub display_name: String,
    pub role: Role,
    #[serde(default)]
    pub external_identity: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ActorRegistration {
    pub fn new(display_name: impl Into<String>, role: Role) -> Self {
        Self {
            display_name: display_name.into(),
            role,
            external_identity: None,
            location: None,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.external_identity = Some(identity.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Validate and turn the registration into an actor with a fresh id.
    ///
    /// External identities are compared case-insensitively, so they are
    /// stored lower-cased.
    pub fn into_actor(self, registered_at: Timestamp) -> Result<Actor, TypeError> {
        let display_name = self.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(TypeError::InvalidDetails(
                "display name must not be empty".into(),
            ));
        }
        Ok(Actor {
            id: ActorId::new(),
            display_name,
            role: self.role,
            external_identity: non_blank(self.external_identity).map(|s| s.to_lowercase()),
            location: non_blank(self.location),
            registered_at,
        })
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
