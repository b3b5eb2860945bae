// src/settings.rs

//! Runtime settings for dispatch.
//!
//! Settings come from, in increasing priority: built-in defaults, a TOML file
//! named by `ARGDECO_CONFIG`, and the individual `ARGDECO_*` variables.

use crate::{constants, error::Error};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

/// Which source wins when a parameter name exists both in the parsed
/// namespace and in the caller-supplied extras.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// Caller-supplied extras override parsed values.
    #[default]
    Context,
    /// Parsed values override caller-supplied extras.
    Namespace,
}

/// Where usage text goes when no handler was matched.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UsageStream {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
}

impl UsageStream {
    /// Writes `text` as is to the stream.
    pub fn emit(self, text: &str) {
        match self {
            Self::Stdout => print!("{}", text),
            Self::Stderr => eprint!("{}", text),
        }
    }
}

/// Runtime settings of the dispatcher.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Which side wins when a name is both parsed and passed as an extra.
    pub precedence: Precedence,
    /// Where usage goes when no handler matched.
    pub usage_stream: UsageStream,
}

impl Settings {
    /// Parses settings from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        Ok(toml::from_str(content)?)
    }

    /// Reads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Settings(format!("cannot read '{}': {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Builds settings from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match lookup(constants::ENV_CONFIG) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(value) = lookup(constants::ENV_PRECEDENCE) {
            settings.precedence = parse_variant(constants::ENV_PRECEDENCE, &value)?;
        }
        if let Some(value) = lookup(constants::ENV_USAGE_STREAM) {
            settings.usage_stream = parse_variant(constants::ENV_USAGE_STREAM, &value)?;
        }

        log::debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }
}

/// Parses a single enum variant through serde, so env values and TOML values
/// accept the same spelling.
fn parse_variant<T: for<'de> Deserialize<'de>>(key: &str, value: &str) -> Result<T, Error> {
    let normalized = value.trim().to_lowercase();
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| Error::Settings(format!("{}: unsupported value '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.precedence, Precedence::Context);
        assert_eq!(settings.usage_stream, UsageStream::Stdout);
    }

    #[test]
    fn test_from_toml_str_partial() {
        let settings = Settings::from_toml_str("precedence = \"namespace\"").unwrap();
        assert_eq!(settings.precedence, Precedence::Namespace);
        assert_eq!(settings.usage_stream, UsageStream::Stdout);

        assert!(Settings::from_toml_str("precedence = \"sideways\"").is_err());
    }

    #[test]
    fn test_from_lookup_file_then_overrides() {
        // --- Setup ---
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"precedence = \"namespace\"\nusage_stream = \"stderr\"\n")
            .unwrap();
        file.flush().unwrap();

        let vars: HashMap<&str, String> = HashMap::from([
            (constants::ENV_CONFIG, file.path().display().to_string()),
            (constants::ENV_PRECEDENCE, "Context".to_string()),
        ]);

        // --- Execute ---
        let settings = Settings::from_lookup(|key| vars.get(key).cloned()).unwrap();

        // --- Assert ---
        assert_eq!(settings.precedence, Precedence::Context);
        assert_eq!(settings.usage_stream, UsageStream::Stderr);
    }

    #[test]
    fn test_from_lookup_rejects_unknown_value() {
        let result = Settings::from_lookup(|key| {
            (key == constants::ENV_USAGE_STREAM).then(|| "printer".to_string())
        });
        let err = result.unwrap_err();
        assert!(err.to_string().contains("unsupported value 'printer'"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Path::new("definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
    }
}
