//! Push transport readiness.

pub mod gate;

pub use gate::TransportGate;
