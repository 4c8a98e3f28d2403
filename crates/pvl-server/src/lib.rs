//! HTTP server for the Provenance Ledger.
//!
//! A thin JSON adapter over [`pvl_service::Traceability`]: every route maps
//! onto one command or query operation. Writes authenticate through an
//! [`IdentityProvider`]; the bundled [`StaticTokenProvider`] maps bearer
//! tokens from the configuration's bootstrap actors and mints tokens for
//! actors registered over HTTP.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use auth::{Credentials, Identity, IdentityProvider, StaticTokenProvider};
pub use config::{BootstrapActor, ServerConfig};
pub use error::{ErrorBody, ServerError, ServerResult};
pub use handler::AppState;
pub use server::PvlServer;
