//! Layered config store
//!
//! The default config file is read once at startup and never written. Runtime
//! changes go into an override layer which is saved as a whole, in the
//! background, after every accepted change.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::parameter::Parameter;
use crate::constants::config::{APP_DIR, DEFAULT_RUNTIME_FILENAME, FILENAME, RUNTIME_FILE_KEY};
use crate::persistence::{OverrideWriter, PendingWrite};

pub struct ConfigStore {
    defaults: Map<String, Value>,
    overrides: Map<String, Value>,
    writer: OverrideWriter,
}

impl ConfigStore {
    /// Platform location of the default config file
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Load defaults from `defaults_path` and overrides from the runtime file
    /// next to it. The default file must exist; a missing runtime file is an
    /// empty override layer.
    pub fn load(defaults_path: &Path) -> Result<Self> {
        let mut defaults = read_json_object(defaults_path)
            .with_context(|| format!("Failed to load default config from {:?}", defaults_path))?;
        resolve_env_placeholders(&mut defaults);

        let overrides_path = overrides_path_for(defaults_path, &defaults);
        let overrides = if overrides_path.exists() {
            read_json_object(&overrides_path)
                .with_context(|| {
                    format!("Failed to load config overrides from {:?}", overrides_path)
                })?
        } else {
            debug!(path = %overrides_path.display(), "No override file yet");
            Map::new()
        };

        info!(
            defaults = defaults.len(),
            overrides = overrides.len(),
            path = %defaults_path.display(),
            "Loaded config"
        );
        Ok(Self::from_layers(defaults, overrides, OverrideWriter::spawn(overrides_path)?))
    }

    /// Build a store from already-parsed layers
    pub fn from_layers(
        defaults: Map<String, Value>,
        overrides: Map<String, Value>,
        writer: OverrideWriter,
    ) -> Self {
        Self {
            defaults,
            overrides,
            writer,
        }
    }

    /// Effective value: override if present, default otherwise
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.overrides.get(key).or_else(|| self.defaults.get(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.overrides.contains_key(key) || self.defaults.contains_key(key)
    }

    /// Change or clear an override.
    ///
    /// Unknown keys are ignored. `None` drops the override so the default
    /// shows through again. New values are only accepted for runtime-mutable
    /// parameters. Returns the pending save when something was accepted.
    pub fn set(&mut self, key: &str, value: Option<Value>) -> Option<PendingWrite> {
        if !self.contains(key) {
            debug!(key = %key, "Ignoring change to unknown config key");
            return None;
        }

        match value {
            None => {
                self.overrides.remove(key);
                info!(key = %key, "Cleared config override");
            }
            Some(value) => {
                let mutable = Parameter::from_identifier(key).is_some_and(Parameter::is_mutable);
                if !mutable {
                    warn!(key = %key, "Refusing runtime change to read-only config parameter");
                    return None;
                }
                info!(key = %key, value = %value, "Changed config parameter");
                self.overrides.insert(key.to_string(), value);
            }
        }

        Some(self.persist())
    }

    fn persist(&self) -> PendingWrite {
        match serde_json::to_string_pretty(&self.overrides) {
            Ok(contents) => self.writer.submit(contents),
            Err(e) => PendingWrite::failed(
                anyhow::Error::new(e).context("Failed to serialize config overrides"),
            ),
        }
    }

    pub fn text(&self, parameter: Parameter) -> Option<&str> {
        self.get(parameter.identifier())?.as_str()
    }

    /// Numeric value; strings are accepted since env placeholders inject text
    pub fn number(&self, parameter: Parameter) -> Option<f64> {
        match self.get(parameter.identifier())? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Post age bound if one is configured (blank counts as unset)
    pub fn bound(&self, parameter: Parameter) -> Option<&str> {
        self.text(parameter).filter(|s| !s.trim().is_empty())
    }

    pub fn overrides(&self) -> &Map<String, Value> {
        &self.overrides
    }

    pub fn overrides_path(&self) -> &Path {
        self.writer.path()
    }
}

fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    let contents = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse JSON object from {:?}", path))
}

/// Runtime file named by the default config, resolved next to it
fn overrides_path_for(defaults_path: &Path, defaults: &Map<String, Value>) -> PathBuf {
    let filename = defaults
        .get(RUNTIME_FILE_KEY)
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_RUNTIME_FILENAME);
    match defaults_path.parent() {
        Some(dir) => dir.join(filename),
        None => PathBuf::from(filename),
    }
}

/// Deployment convention: a default value spelled like an environment
/// variable name (`BOT_TOKEN`) is replaced by that variable when it is set.
fn resolve_env_placeholders(values: &mut Map<String, Value>) {
    for (key, value) in values.iter_mut() {
        let resolved = match value {
            Value::String(name) if is_env_name(name) => env::var(name.as_str()).ok(),
            _ => None,
        };
        if let Some(resolved) = resolved {
            info!(key = %key, "Using environment value for config key");
            *value = Value::String(resolved);
        }
    }
}

fn is_env_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase() || c == '_')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
