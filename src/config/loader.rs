//! Configuration loading from disk.

use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{ValidationError, validate_config};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_minimal_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
bind_address = "127.0.0.1:9000"

[rate_limits.contact]
limit = 3
window_secs = 300
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.rate_limits.contact.limit, 3);
        // Untouched sections keep their defaults.
        assert_eq!(config.rate_limits.admin.limit, 30);
    }

    #[test]
    fn invalid_config_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
bind_address = "nope"
"#
        )
        .unwrap();

        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }
}
