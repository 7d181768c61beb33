use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Attribute names, as they appear in the config file.
pub const AUTO_HIGHLIGHT: &str = "autohighlight";
pub const AUTO_SAVE: &str = "autosave";
pub const AUTO_LOAD: &str = "autoload";
pub const COLOR: &str = "color";
pub const WRAPPER: &str = "wrapper";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error(r#"Attribute {name} must be an empty string (""), absent, "true" or "false", got {value:?}"#)]
    InvalidBoolean { name: String, value: String },
}

/// Raw highlighter configuration.
///
/// Values keep attribute semantics: the boolean-like flags are strings where
/// `""` and `"true"` mean on, `"false"` means off and an absent key falls back
/// to the default. Use [`Config::settings`] to validate them.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autohighlight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosave: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapper: Option<String>,
    /// Where a file-backed store keeps saved highlights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

/// Validated configuration with defaults applied.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Settings {
    pub auto_highlight: bool,
    pub auto_save: bool,
    pub auto_load: bool,
    pub color: Option<String>,
    /// Wrapper name; interpreted by the engine
    pub wrapper: Option<String>,
    pub store_path: Option<PathBuf>,
}

impl Settings {
    /// The configured store file, or [`Config::default_store_path`]
    pub fn store_file(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(Config::default_store_path)
    }
}

/// Parse a boolean-like attribute value.
///
/// Absent values yield `Ok(None)` so callers can apply their own default.
pub fn parse_boolean(name: &str, value: Option<&str>) -> Result<Option<bool>, ConfigError> {
    match value {
        None => Ok(None),
        Some("") | Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(ConfigError::InvalidBoolean {
            name: name.to_string(),
            value: other.to_string(),
        }),
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the store path
        config.store_path = config
            .store_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/text-highlighter");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Store file used when the config names none
    pub fn default_store_path() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/text-highlighter");
        PathBuf::from(data_dir.as_ref()).join("highlights.json")
    }

    /// Validate the boolean-like flags and apply defaults.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let flag = |name: &str, value: &Option<String>| {
            parse_boolean(name, value.as_deref()).map(|parsed| parsed.unwrap_or(false))
        };

        Ok(Settings {
            auto_highlight: flag(AUTO_HIGHLIGHT, &self.autohighlight)?,
            auto_save: flag(AUTO_SAVE, &self.autosave)?,
            auto_load: flag(AUTO_LOAD, &self.autoload)?,
            color: self.color.clone(),
            wrapper: self.wrapper.clone(),
            store_path: self.store_path.clone(),
        })
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/text-highlighter/config.toml"));
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), Some(true))]
    #[case(Some("true"), Some(true))]
    #[case(Some("false"), Some(false))]
    fn test_parse_boolean_accepts(#[case] value: Option<&str>, #[case] expected: Option<bool>) {
        assert_eq!(parse_boolean(AUTO_SAVE, value).unwrap(), expected);
    }

    #[rstest]
    #[case("yes")]
    #[case("TRUE")]
    #[case("1")]
    #[case(" ")]
    fn test_parse_boolean_rejects(#[case] value: &str) {
        let err = parse_boolean(AUTO_LOAD, Some(value)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBoolean { ref name, .. } if name == AUTO_LOAD));
        assert!(err.to_string().contains("autoload"));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Config::default().settings().unwrap();

        assert!(!settings.auto_highlight);
        assert!(!settings.auto_save);
        assert!(!settings.auto_load);
        assert_eq!(settings.color, None);
        assert_eq!(settings.wrapper, None);
    }

    #[test]
    fn test_store_file_prefers_configured_path() {
        let configured = Config {
            store_path: Some(PathBuf::from("/data/highlights.json")),
            ..Config::default()
        };

        assert_eq!(
            configured.settings().unwrap().store_file(),
            PathBuf::from("/data/highlights.json")
        );
        let fallback = Config::default().settings().unwrap().store_file();
        assert_eq!(fallback, Config::default_store_path());
        assert!(fallback.ends_with(".local/share/text-highlighter/highlights.json"));
    }

    #[test]
    fn test_settings_invalid_flag_is_fatal() {
        let config = Config {
            autohighlight: Some("maybe".to_string()),
            ..Config::default()
        };

        assert!(matches!(
            config.settings(),
            Err(ConfigError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            autosave: Some(String::new()),
            color: Some("yellow".to_string()),
            wrapper: Some("underline".to_string()),
            store_path: Some(PathBuf::from("/tmp/highlights.json")),
            ..Config::default()
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_absolute_path() {
        let path = PathBuf::from("/absolute/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_config_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "autosave = [").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            autohighlight: Some("true".to_string()),
            color: Some("red".to_string()),
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
        assert!(loaded_config.settings().unwrap().auto_highlight);
    }

    #[test]
    fn test_store_path_env_var_in_toml() {
        unsafe {
            env::set_var("HIGHLIGHT_ROOT", "/custom/data");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            r#"
autoload = ""
store_path = "$HIGHLIGHT_ROOT/highlights.json"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(
            config.store_path,
            Some(PathBuf::from("/custom/data/highlights.json"))
        );
        assert!(config.settings().unwrap().auto_load);

        unsafe {
            env::remove_var("HIGHLIGHT_ROOT");
        }
    }
}
