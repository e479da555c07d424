//! Loop settings.
//!
//! Settings come from code, a TOML string, or (with `config-support`) a
//! settings file layered under `TOOLCHAT_*` environment variables.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolChatError};

/// Default bound on tool cycles per message
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Environment prefix for settings overrides
pub const ENV_PREFIX: &str = "TOOLCHAT";

/// Settings for the tool loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Maximum tool cycles before the session fails
    pub max_iterations: usize,
    /// Check invocation arguments against the declared input schema.
    ///
    /// Only tools whose schemas were compiled into the registry with
    /// `HandlerRegistry::with_declarations` are checked; arguments for any
    /// other tool reach the handler as sent. Needs the `validation` feature.
    pub check_arguments: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            check_arguments: true,
        }
    }
}

impl LoopConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(ToolChatError::config("max_iterations must be at least 1"));
        }
        Ok(())
    }

    /// Parse settings from TOML text
    #[cfg(feature = "config-support")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)
            .map_err(|e| ToolChatError::config(format!("invalid loop settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from an optional file, then apply `TOOLCHAT_*`
    /// environment overrides (e.g. `TOOLCHAT_MAX_ITERATIONS=4`).
    #[cfg(feature = "config-support")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| {
                ToolChatError::config(format!("failed to read '{}': {}", path.display(), e))
            })?;

        let loaded: Self = settings
            .try_deserialize()
            .map_err(|e| ToolChatError::config(format!("invalid loop settings: {}", e)))?;
        loaded.validate()?;
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = LoopConfig::default();
        assert_eq!(settings.max_iterations, 10);
        assert!(settings.check_arguments);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = LoopConfig::default().with_max_iterations(0).validate().unwrap_err();
        assert!(matches!(err, ToolChatError::Config(_)));
    }

    #[cfg(feature = "config-support")]
    #[test]
    fn test_from_toml_str() {
        let settings = LoopConfig::from_toml_str("max_iterations = 3").unwrap();
        assert_eq!(settings.max_iterations, 3);
        assert!(settings.check_arguments);

        assert!(LoopConfig::from_toml_str("max_iterations = 0").is_err());
        assert!(LoopConfig::from_toml_str("max_iterations = \"many\"").is_err());
    }

    #[cfg(feature = "config-support")]
    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("toolchat-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "max_iterations = 4\ncheck_arguments = false\n").unwrap();

        let settings = LoopConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.max_iterations, 4);
        assert!(!settings.check_arguments);
    }

    #[cfg(feature = "config-support")]
    #[test]
    fn test_load_missing_file_uses_defaults() {
        let name = format!("toolchat-missing-{}.toml", uuid::Uuid::new_v4());
        let path = std::env::temp_dir().join(name);
        let settings = LoopConfig::load(&path).unwrap();
        assert_eq!(settings.max_iterations, DEFAULT_MAX_ITERATIONS);
    }
}
