//! Canonical presence cache and its bootstrap sources.

pub mod bootstrap;
#[allow(clippy::module_inception)]
pub mod store;

pub use bootstrap::BootstrapSnapshot;
pub use store::PresenceStore;
