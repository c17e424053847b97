use crate::client::DEFAULT_HOST;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DIRECTORY: &str = "~/stable_diffusion/models";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Civitai API key. Some models require a login and fail without one.
    pub api_key: Option<String>,
    /// Download root; `~` and `$HOME` are expanded.
    pub directory: String,
    pub host: String,
    /// How often the clipboard is polled for changes.
    pub poll_interval_ms: u64,
    /// Deadline for a single item, unset means no deadline.
    pub item_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            directory: DEFAULT_DIRECTORY.to_string(),
            host: DEFAULT_HOST.to_string(),
            poll_interval_ms: 500,
            item_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("AIRGRAB_HOME") {
            return Ok(PathBuf::from(home));
        }
        Ok(dirs::config_dir()
            .context("Could not find config directory")?
            .join("airgrab"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<(Self, PathBuf)> {
        let path = Self::default_path()?;
        let settings = Self::load_from(&path)?.with_env();
        Ok((settings, path))
    }

    /// Apply `CIVITAI_API_KEY` and `AIRGRAB_DIR`.
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var("CIVITAI_API_KEY").ok(),
            std::env::var("AIRGRAB_DIR").ok(),
        )
    }

    /// Read `path`, writing a default file first if none exists.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("Writing default config to {:?}", path);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, toml::to_string_pretty(&Self::default())?)?;
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(settings)
    }

    pub fn with_overrides(mut self, api_key: Option<String>, directory: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(dir) = directory.filter(|d| !d.trim().is_empty()) {
            self.directory = dir;
        }
        self
    }

    pub fn download_root(&self) -> PathBuf {
        expand_home(&self.directory, dirs::home_dir().as_deref())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(50))
    }

    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Copy safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.has_api_key() {
            copy.api_key = Some("********".to_string());
        }
        copy
    }
}

fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(path);
    };
    for prefix in ["~", "$HOME", "${HOME}"] {
        if path == prefix {
            return home.to_path_buf();
        }
        if let Some(rest) = path.strip_prefix(prefix) {
            if let Some(rest) = rest.strip_prefix(['/', '\\']) {
                return home.join(rest);
            }
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(path.exists());

        // Second load reads the file it wrote.
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "api_key = \"secret\"\nitem_timeout_secs = 90\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.host, DEFAULT_HOST);
        assert_eq!(settings.directory, DEFAULT_DIRECTORY);
        assert_eq!(settings.item_timeout(), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "poll_interval_ms = \"soon\"").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::default().with_overrides(Some("k".into()), Some("/data".into()));
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(settings.directory, "/data");

        let untouched = Settings::default().with_overrides(Some("  ".into()), None);
        assert_eq!(untouched, Settings::default());
    }

    #[test]
    fn test_expand_home() {
        let home = Path::new("/home/ada");
        assert_eq!(
            expand_home("~/stable_diffusion/models", Some(home)),
            home.join("stable_diffusion/models")
        );
        assert_eq!(expand_home("$HOME/models", Some(home)), home.join("models"));
        assert_eq!(expand_home("~", Some(home)), home.to_path_buf());
        assert_eq!(expand_home("/srv/models", Some(home)), PathBuf::from("/srv/models"));
        assert_eq!(expand_home("~other/x", Some(home)), PathBuf::from("~other/x"));
        assert_eq!(expand_home("~/x", None), PathBuf::from("~/x"));
    }

    #[test]
    fn test_redacted_and_timeouts() {
        let mut settings = Settings::default();
        assert!(!settings.has_api_key());
        assert_eq!(settings.redacted().api_key, None);
        assert_eq!(settings.item_timeout(), None);

        settings.api_key = Some("secret".into());
        settings.item_timeout_secs = Some(0);
        assert_eq!(settings.redacted().api_key.as_deref(), Some("********"));
        assert_eq!(settings.item_timeout(), None);
    }
}
