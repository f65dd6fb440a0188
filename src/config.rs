//! Application-level configuration loading: broadcast tuning, history depth,
//! and the control credential.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "JANBOARD_BACK_CONFIG_PATH";
/// Environment variable that overrides the configured control key.
const CONTROL_KEY_ENV: &str = "JANBOARD_CONTROL_KEY";

/// Debounce window applied to snapshot broadcasts.
const DEFAULT_DEBOUNCE_MS: u64 = 100;
/// Undo history entries kept per room.
const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    broadcast_debounce: Duration,
    history_capacity: usize,
    control_key: String,
}

impl AppConfig {
    /// Load the configuration from disk, applying environment overrides and
    /// falling back to built-in defaults when the file is absent or broken.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let raw = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    RawConfig::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                RawConfig::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                RawConfig::default()
            }
        };

        let control_key = env::var(CONTROL_KEY_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .or(raw.control_key)
            .unwrap_or_else(|| {
                let generated = Uuid::new_v4().simple().to_string();
                info!(key = %generated, "no control key configured; generated one for this run");
                generated
            });

        Self {
            broadcast_debounce: Duration::from_millis(
                raw.broadcast_debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
            ),
            history_capacity: raw.history_capacity.unwrap_or(DEFAULT_HISTORY_CAPACITY),
            control_key,
        }
    }

    /// Window within which successive mutations coalesce into one broadcast.
    pub fn broadcast_debounce(&self) -> Duration {
        self.broadcast_debounce
    }

    /// Maximum undo snapshots retained per room.
    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Shared credential control connections must present.
    pub fn control_key(&self) -> &str {
        &self.control_key
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            broadcast_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            control_key: Uuid::new_v4().simple().to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    broadcast_debounce_ms: Option<u64>,
    history_capacity: Option<usize>,
    control_key: Option<String>,
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
