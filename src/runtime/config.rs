//! Engine configuration.
//!
//! The active configuration is process-wide and seeded from the environment
//! the first time it is read. It can also be parsed from a small text format:
//!
//! ```text
//! # trace every dispatch
//! trace_all = true
//! warn_on_collision = false
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use crate::runtime::ds::error::ModelError;

/// Knobs for diagnostics emitted by the object model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Trace every dispatch, as if every module had tracing enabled.
    pub trace_all: bool,
    /// Warn when a member definition displaces an existing one.
    pub warn_on_collision: bool,
    /// Warn when an already destroyed object is destroyed again.
    pub warn_on_double_destroy: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            trace_all: false,
            warn_on_collision: true,
            warn_on_double_destroy: true,
        }
    }
}

lazy_static! {
    static ref ACTIVE: RwLock<ModelConfig> = RwLock::new(ModelConfig::from_env());
}

/// A copy of the active configuration.
pub fn current() -> ModelConfig {
    match ACTIVE.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// The active `trace_all` flag, read without copying the configuration.
pub fn trace_all() -> bool {
    match ACTIVE.read() {
        Ok(config) => config.trace_all,
        Err(poisoned) => poisoned.into_inner().trace_all,
    }
}

/// Replace the active configuration.
pub fn install(config: ModelConfig) {
    match ACTIVE.write() {
        Ok(mut active) => *active = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

impl ModelConfig {
    /// Defaults overridden by `MIXIN_TRACE`, `MIXIN_WARN_COLLISION` and
    /// `MIXIN_WARN_DOUBLE_DESTROY`. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = ModelConfig::default();
        let vars = [
            ("MIXIN_TRACE", "trace_all"),
            ("MIXIN_WARN_COLLISION", "warn_on_collision"),
            ("MIXIN_WARN_DOUBLE_DESTROY", "warn_on_double_destroy"),
        ];
        for (var, key) in vars.iter() {
            if let Ok(value) = env::var(var) {
                let _ = config.set(key, &value);
            }
        }
        config
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ModelError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse `key = value` lines. Blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self, ModelError> {
        let mut config = ModelConfig::default();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().unwrap_or("").trim();
            let value = match parts.next() {
                Some(v) => v.trim(),
                None => {
                    return Err(ModelError::ConfigError(format!(
                        "line {}: expected `key = value`",
                        number + 1
                    )))
                }
            };
            config
                .set(key, value)
                .map_err(|e| ModelError::ConfigError(format!("line {}: {}", number + 1, e)))?;
        }
        Ok(config)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let flag = parse_bool(value)?;
        match key {
            "trace_all" => self.trace_all = flag,
            "warn_on_collision" => self.warn_on_collision = flag,
            "warn_on_double_destroy" => self.warn_on_double_destroy = flag,
            _ => return Err(format!("unknown key `{}`", key)),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim_matches('"') {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("`{}` is not a boolean", other)),
    }
}
