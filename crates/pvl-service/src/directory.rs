use std::sync::Arc;

use pvl_store::{ActorStore, TraceStore};
use pvl_types::{Actor, ActorId, ActorRegistration, Timestamp};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};

/// Registry of the actors allowed to touch the ledger.
#[derive(Clone)]
pub struct ActorDirectory {
    store: Arc<dyn TraceStore>,
}

impl ActorDirectory {
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        Self { store }
    }

    /// Register a new actor.
    ///
    /// Fails with `DuplicateActor` when the external identity is already
    /// registered and with `InvalidInput` for a blank display name.
    pub fn register(&self, registration: ActorRegistration) -> ServiceResult<Actor> {
        let actor = registration.into_actor(Timestamp::now())?;
        self.store.insert_actor(&actor)?;
        info!(
            actor = %actor.id,
            role = %actor.role,
            name = %actor.display_name,
            "actor registered"
        );
        Ok(actor)
    }

    pub fn resolve(&self, id: &ActorId) -> ServiceResult<Actor> {
        self.store
            .actor(id)?
            .ok_or_else(|| ServiceError::actor_not_found(id))
    }

    /// Find an actor by the identity its provider vouches for.
    pub fn resolve_identity(&self, identity: &str) -> ServiceResult<Actor> {
        let normalised = identity.trim().to_lowercase();
        self.store
            .actor_by_identity(&normalised)?
            .ok_or_else(|| ServiceError::actor_not_found(&normalised))
    }

    /// All actors in registration order.
    pub fn list(&self) -> ServiceResult<Vec<Actor>> {
        Ok(self.store.actors()?)
    }

    pub fn rename(&self, id: &ActorId, display_name: &str) -> ServiceResult<Actor> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ServiceError::InvalidInput(
                "display name must not be empty".into(),
            ));
        }
        let mut actor = self.resolve(id)?;
        actor.display_name = display_name.to_string();
        self.store.update_actor(&actor)?;
        info!(actor = %actor.id, name = %actor.display_name, "actor renamed");
        Ok(actor)
    }

    /// Set or clear (with a blank value) the actor's registered location.
    pub fn relocate(&self, id: &ActorId, location: &str) -> ServiceResult<Actor> {
        let mut actor = self.resolve(id)?;
        let location = location.trim();
        actor.location = (!location.is_empty()).then(|| location.to_string());
        self.store.update_actor(&actor)?;
        info!(actor = %actor.id, location = ?actor.location, "actor relocated");
        Ok(actor)
    }
}

impl std::fmt::Debug for ActorDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorDirectory").finish_non_exhaustive()
    }
}
