//! Command and query services for the Provenance Ledger.
//!
//! This is the main entry point for applications embedding PVL. The
//! [`Traceability`] facade wires one store to three services:
//!
//! - [`ActorDirectory`]: register and resolve the actors allowed to write
//! - [`TransitionService`]: the only write path; creates batches and advances
//!   their status through the transition gate
//! - [`QueryService`]: batch lookups, history, chain verification, audits,
//!   and aggregation
//!
//! ```rust
//! use pvl_service::{ServiceConfig, Traceability, TransitionCommand};
//! use pvl_types::{ActorRegistration, BatchDetails, BatchStatus, Role};
//!
//! let pvl = Traceability::in_memory(ServiceConfig::default()).unwrap();
//! let farmer = pvl.directory().register(ActorRegistration::new("Farm", Role::Producer)).unwrap();
//! let hub = pvl.directory().register(ActorRegistration::new("Hub", Role::Aggregator)).unwrap();
//!
//! let details = BatchDetails {
//!     name: "Tomatoes".into(),
//!     category: "Vegetable".into(),
//!     origin_location: "California, USA".into(),
//!     produced_on: "2024-01-15".parse().unwrap(),
//!     quantity: 100,
//!     unit: "kg".into(),
//!     unit_price: 250,
//! };
//! let batch = pvl.transitions().create_batch(&farmer.id, details, None).unwrap();
//! pvl.transitions()
//!     .transition(TransitionCommand::new(batch.id, BatchStatus::InTransit, hub.id))
//!     .unwrap();
//!
//! assert!(pvl.queries().verify_chain(&batch.id).unwrap().valid);
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod locks;
pub mod query;
pub mod transition;

#[cfg(test)]
mod testing;

use std::path::Path;
use std::sync::Arc;

use pvl_store::{DurableTraceStore, InMemoryTraceStore, TraceStore};

pub use config::ServiceConfig;
pub use directory::ActorDirectory;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use locks::BatchLocks;
pub use query::QueryService;
pub use transition::{TransitionCommand, TransitionService, GENESIS_NOTE, UNSPECIFIED_LOCATION};

// Re-export the result types callers handle most.
pub use pvl_gate::Denial;
pub use pvl_ledger::{ActorActivity, AuditReport, ChainReport, LedgerStats, ReplayResult};

/// One store and the services over it.
pub struct Traceability {
    store: Arc<dyn TraceStore>,
    config: ServiceConfig,
    directory: ActorDirectory,
    transitions: TransitionService,
    queries: QueryService,
}

impl Traceability {
    pub fn new(store: Arc<dyn TraceStore>, config: ServiceConfig) -> ServiceResult<Self> {
        Ok(Self {
            directory: ActorDirectory::new(Arc::clone(&store)),
            transitions: TransitionService::new(Arc::clone(&store), &config)?,
            queries: QueryService::new(Arc::clone(&store)),
            store,
            config,
        })
    }

    /// Services over a fresh in-memory store.
    pub fn in_memory(config: ServiceConfig) -> ServiceResult<Self> {
        Self::new(Arc::new(InMemoryTraceStore::new()), config)
    }

    /// Services over the write-ahead log in `dir`, replaying it first.
    pub fn open_durable(dir: &Path, config: ServiceConfig) -> ServiceResult<Self> {
        Self::new(Arc::new(DurableTraceStore::open(dir)?), config)
    }

    pub fn directory(&self) -> &ActorDirectory {
        &self.directory
    }

    pub fn transitions(&self) -> &TransitionService {
        &self.transitions
    }

    pub fn queries(&self) -> &QueryService {
        &self.queries
    }

    pub fn store(&self) -> &Arc<dyn TraceStore> {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

impl std::fmt::Debug for Traceability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traceability")
            .field("config", &self.config)
            .field("transitions", &self.transitions)
            .finish_non_exhaustive()
    }
}
