//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AgentConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading and static registration data.
///
/// Every variant is fatal for the process; see [`crate::lifecycle::exit_on_fatal`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("need valid register data in either {primary} or {secondary}")]
    NoStaticData { primary: String, secondary: String },

    #[error("did not set lifecycle manager {0} coordinates")]
    MissingCoordinates(&'static str),

    #[error("invalid lifecycle manager {field} coordinates: {source}")]
    InvalidCoordinates {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AgentConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: AgentConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [directory.lc_manager]
            host = "lcm.internal"
            port = 3000

            [discovery]
            cache_enabled = true
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.discovery.cache_enabled);
        assert_eq!(config.directory.lc_manager.unwrap().host, "lcm.internal");
    }

    #[test]
    fn test_load_rejects_invalid_deadlines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [shutdown]
            soft_deadline_ms = 3000
            hard_deadline_ms = 1000
            "#
        )
        .unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("must exceed soft deadline"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/agent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
