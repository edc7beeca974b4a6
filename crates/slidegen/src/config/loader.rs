use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::theme::ThemeRegistry;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Names a config file to load instead of [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_ENV_VAR: &str = "SLIDEGEN_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "slidegen.json";

const PORT_ENV_VAR: &str = "SLIDEGEN_PORT";
const BIND_ADDRESS_ENV_VAR: &str = "SLIDEGEN_BIND_ADDRESS";
const DATA_DIR_ENV_VAR: &str = "SLIDEGEN_DATA_DIR";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// The config file named by `SLIDEGEN_CONFIG`, if set.
pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Loads configuration for a service process.
///
/// An explicit `path`, or one named by `SLIDEGEN_CONFIG`, must exist. When
/// neither is given, `slidegen.json` in the working directory is used if
/// present and built-in defaults otherwise. Environment overrides are
/// applied last.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    let explicit = path.map(Path::to_path_buf).or_else(config_path_from_env);

    let mut config = match explicit {
        Some(path) => load_config(&path)?,
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                load_config(fallback)?
            } else {
                tracing::debug!("No config file found, using defaults");
                Config::default()
            }
        }
    };

    apply_env_overrides(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
    if let Some(port) = env_value(PORT_ENV_VAR) {
        config.server.port = port.parse().map_err(|_| ConfigError::Validation {
            message: format!("{} must be a port number, got '{}'", PORT_ENV_VAR, port),
        })?;
    }
    if let Some(address) = env_value(BIND_ADDRESS_ENV_VAR) {
        config.server.bind_address = address;
    }
    if let Some(dir) = env_value(DATA_DIR_ENV_VAR) {
        config.storage.data_dir = dir;
    }
    Ok(())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if !ThemeRegistry::builtin().contains(&config.pipeline.default_theme) {
        return Err(ConfigError::Validation {
            message: format!("Unknown default theme: {}", config.pipeline.default_theme),
        });
    }

    if config.pipeline.accepted_formats.is_empty() {
        return Err(ConfigError::Validation {
            message: "pipeline.accepted_formats must not be empty".to_string(),
        });
    }

    if config.openai.max_tokens == 0 {
        return Err(ConfigError::Validation {
            message: "openai.max_tokens must be positive".to_string(),
        });
    }

    if config.storage.data_dir.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "storage.data_dir must not be empty".to_string(),
        });
    }

    Ok(())
}
