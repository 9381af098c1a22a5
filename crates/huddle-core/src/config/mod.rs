//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every section (and every field) has a default so the
//! subsystem can be embedded with zero configuration.

pub mod cache;
pub mod directory;
pub mod logging;
pub mod presence;
pub mod session;

use serde::{Deserialize, Serialize};

use self::cache::CacheConfig;
use self::directory::DirectoryConfig;
use self::logging::LoggingConfig;
use self::presence::PresenceConfig;
use self::session::SessionConfig;

use crate::error::AppError;

/// Root configuration for the presence subsystem.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Lookup cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Local session activity settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Presence store and projector settings.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// REST directory collaborator settings.
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific
    /// overlay and `HUDDLE__`-prefixed environment variables, with `__`
    /// separating nested sections (e.g.
    /// `HUDDLE__SESSION__IDLE_THRESHOLD_SECONDS`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HUDDLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
