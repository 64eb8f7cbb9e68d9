//! # Engine Configuration
//!
//! Settings shared by every model of a [`ResourceSystem`](super::ResourceSystem).
//! All fields have defaults, so a partial JSON document is enough:
//!
//! ```rust
//! use resource_recipe::framework::Method;
//! use resource_recipe::lifecycle::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "update_method": "PATCH" }"#).unwrap();
//! assert_eq!(config.update_method, Method::Patch);
//! assert_eq!(config.primary_key, "id");
//! ```

use crate::framework::error::ResourceError;
use crate::framework::transport::Method;
use serde::Deserialize;
use tracing::debug;

/// Environment variable holding a JSON config document.
pub const CONFIG_ENV: &str = "RESOURCE_RECIPE_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attribute holding an instance's identity.
    pub primary_key: String,
    /// Prefix marking system attributes, skipped by `each` and by encoding.
    pub system_prefix: String,
    /// Method used by `update`: PUT or PATCH.
    pub update_method: Method,
    /// Whether keys are converted between snake and camel case.
    pub rename_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_key: "id".to_string(),
            system_prefix: "$".to_string(),
            update_method: Method::Put,
            rename_keys: true,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ResourceError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads [`CONFIG_ENV`] when set, defaults otherwise.
    pub fn from_env() -> Result<Self, ResourceError> {
        match std::env::var(CONFIG_ENV) {
            Ok(raw) => {
                debug!(var = CONFIG_ENV, "Loading config from environment");
                Self::from_json(&raw)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.primary_key.is_empty() {
            return Err(ResourceError::InvalidConfig {
                reason: "primary_key must not be empty".into(),
            });
        }
        if self.system_prefix.is_empty() {
            return Err(ResourceError::InvalidConfig {
                reason: "system_prefix must not be empty".into(),
            });
        }
        if !matches!(self.update_method, Method::Put | Method::Patch) {
            return Err(ResourceError::InvalidConfig {
                reason: format!("update_method must be PUT or PATCH, got {}", self.update_method),
            });
        }
        Ok(())
    }
}
