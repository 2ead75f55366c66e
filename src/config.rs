use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::DEFAULT_API_URL;

pub const API_URL_ENV: &str = "TRIVIAL_API_URL";
const APP_DIR: &str = "trivial";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api_url: String,
    pub tick_rate_ms: u64,
    pub log_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            tick_rate_ms: 200,
            log_dir: None,
            log_filter: "info".to_string(),
        }
    }
}

/// Where [`Config::load`] got its values. Loading happens before logging is
/// set up, so the caller reports this once the subscriber exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Missing(PathBuf),
    NoConfigDir,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!(path = %path.display(), "loaded config"),
            ConfigSource::Missing(path) => {
                warn!(path = %path.display(), "config file not found; using defaults")
            }
            ConfigSource::NoConfigDir => {
                warn!("no config directory on this platform; using defaults")
            }
        }
    }
}

impl Config {
    /// Reads `path`, or the per-user config file when `path` is `None`.
    /// A file that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<(Self, ConfigSource)> {
        let Some(path) = path.map(Path::to_path_buf).or_else(default_path) else {
            return Ok((Self::default(), ConfigSource::NoConfigDir));
        };
        if !path.is_file() {
            return Ok((Self::default(), ConfigSource::Missing(path)));
        }

        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Config = toml::from_str(&text)
            .with_context(|| format!("invalid config in {}", path.display()))?;
        config.api_url = normalize_url(&config.api_url);
        Ok((config, ConfigSource::File(path)))
    }

    /// Environment beats the file; the command line beats both.
    pub fn apply_overrides(&mut self, env_url: Option<String>, cli_url: Option<&str>) {
        let url = cli_url
            .map(str::to_string)
            .or(env_url.filter(|u| !u.trim().is_empty()));
        if let Some(url) = url {
            self.api_url = normalize_url(&url);
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
        })
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged(source: &ConfigSource) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || source.log());
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn missing_file_is_reported_as_a_warning() {
        let out = logged(&ConfigSource::Missing(PathBuf::from("/nowhere/config.toml")));
        assert!(out.contains("WARN"), "{out}");
        assert!(out.contains("config file not found"), "{out}");
        assert!(out.contains("/nowhere/config.toml"), "{out}");
    }

    #[test]
    fn loaded_file_is_reported_at_info() {
        let out = logged(&ConfigSource::File(PathBuf::from("/etc/trivial.toml")));
        assert!(out.contains("INFO"), "{out}");
        assert!(out.contains("loaded config"), "{out}");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let (config, source) = Config::load(Some(&missing)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(source, ConfigSource::Missing(missing));
        assert_eq!(config.api_url, "http://127.0.0.1:8002");
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_url = \"https://trivial.example/\"").unwrap();
        writeln!(file, "tick_rate_ms = 50").unwrap();
        let (config, source) = Config::load(Some(file.path())).unwrap();
        assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
        assert_eq!(config.api_url, "https://trivial.example");
        assert_eq!(config.tick_rate(), Duration::from_millis(50));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api = \"x\"").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let mut config = Config::default();
        config.apply_overrides(Some("http://env:1/".into()), None);
        assert_eq!(config.api_url, "http://env:1");
        config.apply_overrides(Some("http://env:1".into()), Some("http://cli:2"));
        assert_eq!(config.api_url, "http://cli:2");
        config.apply_overrides(Some("  ".into()), None);
        assert_eq!(config.api_url, "http://cli:2");
    }
}
