//! # Serve Configuration
//!
//! Optional TOML configuration for the `serve` command. Every field is
//! optional; explicit CLI flags always win over file values.
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 9000
//! database = "/var/lib/ednova/records.db"
//! backend = "redb"
//! ```

use ednova_core::EdnovaError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Parsed `serve` configuration file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    /// Host to bind to.
    pub host: Option<String>,
    /// Port to bind to.
    pub port: Option<u16>,
    /// Path to the record database.
    pub database: Option<PathBuf>,
    /// Storage backend: "redb" or "memory".
    pub backend: Option<String>,
}

impl ServeConfig {
    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, EdnovaError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EdnovaError::Validation(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&raw).map_err(|e| {
            EdnovaError::Validation(format!("Invalid config '{}': {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let config: ServeConfig = toml::from_str("port = 9000\n").unwrap();
        assert_eq!(config.port, Some(9000));
        assert!(config.host.is_none());
        assert!(config.database.is_none());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<ServeConfig>("listen = \"0.0.0.0\"\n").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let result = ServeConfig::load(Path::new("/nonexistent/ednova.toml"));
        assert!(matches!(result, Err(EdnovaError::Validation(_))));
    }
}
