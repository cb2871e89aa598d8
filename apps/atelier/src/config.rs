//! # Application Configuration
//!
//! TOML configuration for the Atelier binary. All fields are optional;
//! missing values fall back to defaults, so an empty file is valid.
//!
//! ```toml
//! database = "workshop.db"
//! colors = ["Black", "Red", "Sky Blue"]
//! default_alert_threshold = 5
//! ```

use atelier_core::{AtelierError, primitives::DEFAULT_ALERT_THRESHOLD};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// APP CONFIG
// =============================================================================

/// Configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Database path, used when `--database` is not given.
    pub database: Option<PathBuf>,

    /// Color palette. When non-empty, stock additions with colors outside
    /// the palette produce a warning (never an error).
    pub colors: Vec<String>,

    /// Alert threshold applied to new components without an explicit one.
    pub default_alert_threshold: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: None,
            colors: Vec::new(),
            default_alert_threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, AtelierError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AtelierError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            AtelierError::SerializationError(format!(
                "Invalid config '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sensible() {
        let config = AppConfig::default();
        assert!(config.database.is_none());
        assert!(config.colors.is_empty());
        assert_eq!(config.default_alert_threshold, DEFAULT_ALERT_THRESHOLD);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "database = \"workshop.db\"").expect("write");

        let config = AppConfig::load(file.path()).expect("load");
        assert_eq!(config.database, Some(PathBuf::from("workshop.db")));
        assert_eq!(config.default_alert_threshold, DEFAULT_ALERT_THRESHOLD);
    }

    #[test]
    fn full_file_parses() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "database = \"w.db\"").expect("write");
        writeln!(file, "colors = [\"Black\", \"Red\"]").expect("write");
        writeln!(file, "default_alert_threshold = 7").expect("write");

        let config = AppConfig::load(file.path()).expect("load");
        assert_eq!(config.colors, vec!["Black", "Red"]);
        assert_eq!(config.default_alert_threshold, 7);
    }

    #[test]
    fn unknown_keys_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "databse = \"typo.db\"").expect("write");

        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::load(Path::new("/nonexistent/atelier.toml")).is_err());
    }
}
