//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::KilnConfig;
use kiln_common::Encoding;
use std::path::Path;

/// Name of the configuration file looked up in a session directory.
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Loads and validates a `kiln.toml` configuration from a session directory.
///
/// Reads `<dir>/kiln.toml`, parses it, and validates required fields.
pub fn load_config(dir: &Path) -> Result<KilnConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `kiln.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<KilnConfig, ConfigError> {
    let config: KilnConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &KilnConfig) -> Result<(), ConfigError> {
    if config.session.languages.is_empty() {
        return Err(ConfigError::MissingField("session.languages".to_string()));
    }
    config
        .session
        .encoding
        .parse::<Encoding>()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    for (name, container) in &config.containers {
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "container names must not be empty".to_string(),
            ));
        }
        for (language, outlets) in &container.outputs {
            for (outlet, cfg) in outlets {
                if cfg.target.is_empty() {
                    return Err(ConfigError::MissingField(format!(
                        "containers.{name}.outputs.{language}.{outlet}.target"
                    )));
                }
            }
        }
        for dependency in &container.dependencies {
            if !config.containers.contains_key(dependency) {
                return Err(ConfigError::UnknownContainer(dependency.clone()));
            }
        }
    }

    if let Some(debug_info) = &config.debug_info {
        if debug_info.classes_dir.is_empty() {
            return Err(ConfigError::MissingField("debug_info.classes_dir".to_string()));
        }
    }
    Ok(())
}

/// Checks that every output configuration names a known language.
///
/// Run once the language registry is built, since only it knows which
/// language identifiers the registered setups provide.
pub fn validate_output_languages(
    config: &KilnConfig,
    is_known: impl Fn(&str) -> bool,
) -> Result<(), ConfigError> {
    for container in config.containers.values() {
        for language in container.outputs.keys() {
            if !is_known(language) {
                return Err(ConfigError::UnknownLanguage(language.clone()));
            }
        }
    }
    Ok(())
}
