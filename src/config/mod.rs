use crate::models::{AppSettings, Preferences};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// File name of the optional settings file inside the configuration directory
pub const SETTINGS_FILE: &str = "pandorust.yaml";

/// File name of the persisted preferences inside the configuration directory
pub const PREFERENCES_FILE: &str = "preferences.yaml";

/// Prefix of environment variables that override settings (`PANDORUST_BACKEND__PROGRAM`)
pub const ENV_PREFIX: &str = "PANDORUST";

/// Configuration manager for application settings and persisted preferences.
///
/// Manages two files:
/// - Settings (`pandorust.yaml`): backend command, logging, asset overrides.
///   Layered under `PANDORUST_*` environment variables; never written.
/// - Preferences (`preferences.yaml`): the chosen theme, written on every toggle.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    preferences_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            preferences_path: config_dir.join(PREFERENCES_FILE),
            config_dir,
        })
    }

    /// Load application settings.
    ///
    /// Sources, lowest precedence first: built-in defaults, `pandorust.yaml`
    /// (optional), `PANDORUST_*` environment variables.
    pub fn load_settings(&self) -> Result<AppSettings> {
        self.load_settings_with(Environment::with_prefix(ENV_PREFIX))
    }

    fn load_settings_with(&self, environment: Environment) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::debug!(
                "Settings file not found at {}, using defaults and environment",
                self.settings_path
            );
        }

        let settings: AppSettings = Config::builder()
            .add_source(
                File::from(self.settings_path.as_std_path())
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!(
            "Loaded settings: backend={}, log_dir={}, debug={}",
            settings.backend.program,
            settings.logging.dir,
            settings.logging.debug
        );
        Ok(settings)
    }

    /// Load the persisted preferences.
    ///
    /// # Returns
    /// The loaded Preferences, or default (dark theme) if the file doesn't exist
    pub fn load_preferences(&self) -> Result<Preferences> {
        if !self.preferences_path.exists() {
            tracing::debug!(
                "Preferences file not found at {}, using defaults",
                self.preferences_path
            );
            return Ok(Preferences::default());
        }

        let file_contents = fs::read_to_string(&self.preferences_path).with_context(|| {
            format!("Failed to read preferences: {}", self.preferences_path)
        })?;

        let preferences: Preferences = serde_yaml_ng::from_str(&file_contents).with_context(|| {
            format!("Failed to parse preferences: {}", self.preferences_path)
        })?;

        tracing::info!("Loaded preferences from {}", self.preferences_path);
        Ok(preferences)
    }

    /// Save the preferences file.
    pub fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(preferences)
            .context("Failed to serialize preferences to YAML")?;

        fs::write(&self.preferences_path, yaml_string).with_context(|| {
            format!("Failed to write preferences: {}", self.preferences_path)
        })?;

        tracing::debug!("Saved preferences to {}", self.preferences_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the settings file path.
    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Theme;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    fn no_environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(config::Map::new()))
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = Utf8PathBuf::try_from(temp_dir.path().join("a").join("b")).unwrap();

        let manager = ConfigManager::new(&nested).unwrap();

        assert!(nested.exists());
        assert_eq!(manager.config_dir(), nested.as_path());
    }

    #[test]
    fn test_defaults_without_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        let settings = manager.load_settings_with(no_environment()).unwrap();
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn test_settings_file_is_layered_over_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(
            manager.settings_path(),
            "backend:\n  program: /opt/pandorust/backend\nlogging:\n  debug: true\n",
        )
        .unwrap();

        let settings = manager.load_settings_with(no_environment()).unwrap();

        assert_eq!(settings.backend.program, "/opt/pandorust/backend");
        assert!(settings.logging.debug);
        assert_eq!(settings.logging.prefix, "pandorust");
    }

    #[test]
    fn test_environment_overrides_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.settings_path(), "backend:\n  program: from-file\n").unwrap();

        let mut vars = config::Map::new();
        vars.insert(
            "PANDORUST_BACKEND__PROGRAM".to_string(),
            "from-env".to_string(),
        );
        vars.insert("PANDORUST_LOGGING__CONSOLE".to_string(), "true".to_string());
        let environment = Environment::with_prefix(ENV_PREFIX).source(Some(vars));

        let settings = manager.load_settings_with(environment).unwrap();

        assert_eq!(settings.backend.program, "from-env");
        assert!(settings.logging.console);
    }

    #[test]
    fn test_preferences_default_to_dark() {
        let (manager, _temp_dir) = create_test_config_manager();
        assert_eq!(manager.load_preferences().unwrap().theme, Theme::Dark);
    }

    #[test]
    fn test_preferences_round_trip() {
        let (manager, _temp_dir) = create_test_config_manager();

        manager
            .save_preferences(&Preferences {
                theme: Theme::Light,
            })
            .unwrap();

        assert_eq!(manager.load_preferences().unwrap().theme, Theme::Light);
    }

    #[test]
    fn test_corrupt_preferences_is_error() {
        let (manager, temp_dir) = create_test_config_manager();
        fs::write(temp_dir.path().join(PREFERENCES_FILE), "theme: [").unwrap();

        assert!(manager.load_preferences().is_err());
    }
}
