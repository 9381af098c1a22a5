//! # huddle-core
//!
//! Core crate for the Huddle presence subsystem. Contains configuration
//! schemas, typed identifiers, the presence data model, wire event types,
//! collaborator traits, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Huddle crates.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
