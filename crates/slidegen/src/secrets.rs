//! API key resolution.
//!
//! A key can come from three places, checked in order:
//!
//! 1. **Direct value** in the config file (`api_key`)
//! 2. **File reference**, for mounted secrets (`api_key_file: /run/secrets/openai`)
//! 3. **Env var reference** (`api_key_env_var`, default `OPENAI_API_KEY`)

use secrecy::SecretString;
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Secret from {origin} is empty")]
    Empty { origin: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where to look for a secret. Empty strings count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretSource<'a> {
    pub direct: Option<&'a str>,
    pub file_path: Option<&'a str>,
    pub env_var: Option<&'a str>,
}

impl<'a> SecretSource<'a> {
    pub fn is_configured(&self) -> bool {
        present(self.direct).is_some()
            || present(self.file_path).is_some()
            || present(self.env_var).is_some()
    }

    /// Resolves the first configured source. Later sources are not consulted
    /// once an earlier one is configured, even if reading it fails.
    pub fn resolve(&self) -> Result<SecretString> {
        if let Some(value) = present(self.direct) {
            return Ok(SecretString::from(value.to_string()));
        }

        if let Some(path) = present(self.file_path) {
            let expanded = expand_home(path);
            let content = fs::read_to_string(&expanded).map_err(|source| {
                SecretError::FileReadError {
                    path: expanded.clone(),
                    source,
                }
            })?;
            return non_empty(content.trim(), format!("file '{}'", expanded));
        }

        if let Some(name) = present(self.env_var) {
            return match std::env::var(name) {
                Ok(value) => non_empty(value.trim(), format!("env var '{}'", name)),
                Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: name.to_string(),
                }),
            };
        }

        Err(SecretError::NoSourceProvided)
    }

    /// Like [`SecretSource::resolve`], but `None` when nothing is configured
    /// or the named env var is unset.
    pub fn resolve_optional(&self) -> Result<Option<SecretString>> {
        match self.resolve() {
            Ok(secret) => Ok(Some(secret)),
            Err(SecretError::NoSourceProvided) | Err(SecretError::EnvVarNotSet { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn non_empty(value: &str, origin: String) -> Result<SecretString> {
    if value.is_empty() {
        return Err(SecretError::Empty { origin });
    }
    Ok(SecretString::from(value.to_string()))
}

/// Expands a leading `~` or `~/` to the current user's home directory.
/// `~user/...` is left as is.
pub fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            if path == "~" {
                return home.into_owned();
            }
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
