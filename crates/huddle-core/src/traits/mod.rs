//! Seams to external collaborators owned by the host application.

pub mod directory;
pub mod transport;

pub use directory::DirectoryClient;
pub use transport::PushTransport;
