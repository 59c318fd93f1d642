//! Application-level configuration loading for the session timing knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_ARENA_CONFIG_PATH";
/// Seconds between the "game started" broadcast and the first question.
const DEFAULT_START_GRACE_SECONDS: u64 = 2;
/// Seconds results stay on screen before the next question begins.
const DEFAULT_RESULTS_DELAY_SECONDS: u64 = 3;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    start_grace: Duration,
    results_delay: Duration,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults
    /// when the file is absent or unreadable. Never fatal.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), ?config, "loaded timing configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Delay between the start broadcast and the first question, letting
    /// clients render their "starting" screen.
    pub fn start_grace(&self) -> Duration {
        self.start_grace
    }

    /// Dwell on the round results before the next question begins.
    pub fn results_delay(&self) -> Duration {
        self.results_delay
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            start_grace: Duration::from_secs(DEFAULT_START_GRACE_SECONDS),
            results_delay: Duration::from_secs(DEFAULT_RESULTS_DELAY_SECONDS),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    start_grace_seconds: Option<u64>,
    #[serde(default)]
    results_delay_seconds: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            start_grace: value
                .start_grace_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.start_grace),
            results_delay: value
                .results_delay_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.results_delay),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
