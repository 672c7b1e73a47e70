//! Viewer configuration from kumdoc.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file looked up next to the sources
pub const CONFIG_FILE_NAME: &str = "kumdoc.toml";

/// Main configuration from kumdoc.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// HTML rendering and export settings
    pub render: RenderConfig,
}

/// `[render]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Embed images as data URLs instead of linking the source files
    pub embed_images: bool,

    /// CSS file replacing the built-in stylesheet, relative to the config file
    pub stylesheet: Option<String>,

    /// Generate "List of examples" and "List of tables" pages
    pub index_pages: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            embed_images: true,
            stylesheet: None,
            index_pages: true,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a kumdoc.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the kumdoc.toml configuration file
    ///
    /// # Returns
    /// * `Ok(ViewerConfig)` - Successfully loaded configuration
    /// * `Err(ViewerConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ViewerConfigError> {
        let content = fs::read_to_string(&path).map_err(ViewerConfigError::IoError)?;
        toml::from_str(&content).map_err(ViewerConfigError::ParseError)
    }

    /// Load `dir/kumdoc.toml`, falling back to defaults when it does not exist
    pub fn load_or_default(dir: &Path) -> Result<Self, ViewerConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            log::info!("Using configuration {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a kumdoc.toml file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ViewerConfigError> {
        let content = toml::to_string_pretty(self).map_err(ViewerConfigError::SerializeError)?;
        fs::write(&path, content).map_err(ViewerConfigError::IoError)?;
        Ok(())
    }
}

/// Errors that can occur when loading or saving the viewer configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ViewerConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),
}

impl std::fmt::Display for ViewerConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ViewerConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ViewerConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
        }
    }
}

impl std::error::Error for ViewerConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ViewerConfig = toml::from_str(
            r#"
[render]
embed_images = false
"#,
        )
        .unwrap();
        assert!(!config.render.embed_images);
        assert!(config.render.index_pages);
        assert_eq!(config.render.stylesheet, None);
    }

    #[test]
    fn test_unknown_sections_are_ignored() {
        let config: ViewerConfig = toml::from_str(
            r#"
[render]
index_pages = false

[connector]
reply_timeout_ms = 1500
"#,
        )
        .unwrap();
        assert!(!config.render.index_pages);
        let saved = toml::to_string(&config).unwrap();
        assert!(!saved.contains("connector"));
        assert_eq!(toml::from_str::<ViewerConfig>(&saved).unwrap(), config);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = std::env::temp_dir().join(format!("kumdoc-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let mut config = ViewerConfig::default();
        config.render.stylesheet = Some("style.css".to_string());
        config.save(dir.join(CONFIG_FILE_NAME)).unwrap();

        let loaded = ViewerConfig::load_or_default(&dir).unwrap();
        assert_eq!(loaded, config);

        fs::remove_dir_all(&dir).ok();
        assert_eq!(
            ViewerConfig::load_or_default(&dir).unwrap(),
            ViewerConfig::default()
        );
    }

    #[test]
    fn test_invalid_config() {
        let result: Result<ViewerConfig, _> = toml::from_str("render = 3");
        assert!(result.is_err());
    }
}
