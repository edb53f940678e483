use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Application settings assembled by [`ConfigManager`](crate::config::ConfigManager)
/// from defaults, `pandorust.yaml` and `PANDORUST_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub backend: BackendSettings,
    pub logging: LoggingSettings,

    /// Directory whose files override the built-in page templates
    pub assets_dir: Option<Utf8PathBuf>,
}

/// How to reach the privileged backend process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            program: "pandorust-backend".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: String,
    pub prefix: String,
    pub debug: bool,
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            prefix: "pandorust".to_string(),
            debug: false,
            console: false,
        }
    }
}

/// Visual theme. Dark unless the user picked otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

/// The only client state that survives a restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.backend.program, "pandorust-backend");
        assert!(settings.backend.args.is_empty());
        assert_eq!(settings.logging.dir, "logs");
        assert!(!settings.logging.debug);
        assert!(settings.assets_dir.is_none());
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::default(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().toggled(), Theme::Light);
    }

    #[test]
    fn test_preferences_yaml() {
        let prefs: Preferences = serde_yaml_ng::from_str("theme: light\n").unwrap();
        assert_eq!(prefs.theme, Theme::Light);

        let empty: Preferences = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(empty.theme, Theme::Dark);
    }
}
