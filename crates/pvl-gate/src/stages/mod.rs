//! Built-in gate stages.

pub mod authorization;
pub mod lifecycle;

pub use authorization::AuthorizationStage;
pub use lifecycle::LifecycleStage;
