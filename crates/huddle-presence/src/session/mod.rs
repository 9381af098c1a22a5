//! Local session activity tracking.

pub mod activity;

pub use activity::{LocalState, SessionActivity};
