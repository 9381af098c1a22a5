//! REST directory collaborators: HTTP client and cached lookups.

pub mod client;
pub mod lookup;

pub use client::RestDirectoryClient;
pub use lookup::UserDirectory;
