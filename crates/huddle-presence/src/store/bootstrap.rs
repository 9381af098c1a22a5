//! Initial snapshot sources for the presence store.

use tracing::warn;

use huddle_core::types::presence::PresenceRecord;

/// Sources for the initial presence snapshot, resolved in strict
/// priority order: a host-provided snapshot wins over the page-embedded
/// JSON payload, which wins over starting empty.
///
/// The order is deterministic so hydration can be tested source by
/// source.
#[derive(Debug, Clone, Default)]
pub struct BootstrapSnapshot {
    /// Snapshot handed over directly by the host application.
    pub provided: Option<Vec<PresenceRecord>>,
    /// Raw page-embedded JSON array, parsed best-effort.
    pub embedded_json: Option<String>,
}

impl BootstrapSnapshot {
    /// Resolve the highest-priority usable source.
    pub fn resolve(&self) -> Vec<PresenceRecord> {
        if let Some(provided) = &self.provided {
            return provided.clone();
        }
        if let Some(raw) = &self.embedded_json {
            match serde_json::from_str::<Vec<PresenceRecord>>(raw) {
                Ok(records) => return records,
                Err(err) => warn!(%err, "ignoring unparseable embedded snapshot"),
            }
        }
        Vec::new()
    }
}
