//! Configuration for the Lectern SDK

use crate::error::{Result, SdkError};
use lectern_client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
///
/// ```toml
/// [service]
/// base_url = "https://church.example/api"
/// timeout_secs = 15
///
/// [coordinator]
/// reconcile_after_reorder = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LecternConfig {
    /// Remote content service
    #[serde(default)]
    pub service: ClientConfig,

    /// Hierarchy coordinator behaviour
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Re-fetch a sibling set after every settled reorder
    #[serde(default = "default_true")]
    pub reconcile_after_reorder: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            reconcile_after_reorder: true,
        }
    }
}

impl LecternConfig {
    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| SdkError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = LecternConfig::from_toml(
            r#"
            [service]
            base_url = "https://church.example/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.base_url, "https://church.example/api");
        assert_eq!(config.service.timeout_secs, 30);
        assert!(config.coordinator.reconcile_after_reorder);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lectern.toml");

        let mut config = LecternConfig::default();
        config.service.api_key = Some("secret".to_string());
        config.coordinator.reconcile_after_reorder = false;
        config.save(&path).unwrap();

        let loaded = LecternConfig::load(&path).unwrap();
        assert_eq!(loaded.service.api_key.as_deref(), Some("secret"));
        assert!(!loaded.coordinator.reconcile_after_reorder);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = LecternConfig::from_toml("[service\nbase_url = 1");
        assert!(matches!(result, Err(SdkError::Config(_))));
    }
}
