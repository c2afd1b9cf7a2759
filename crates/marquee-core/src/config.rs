use std::path::{Path, PathBuf};

use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub plex: PlexConfig,
    pub discord: DiscordConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Channel name shown while nothing is playing; also the rename prefix.
    pub base_name: String,
    /// Only sessions owned by this user are shown. Any user when unset.
    pub target_user: Option<String>,
    /// Seconds between session polls.
    pub poll_interval: u64,
    /// Minimum seconds between renames in poll mode.
    pub rename_cooldown: u64,
    /// Minimum seconds between renames in event mode.
    pub event_rename_cooldown: u64,
    /// Seconds a sink call may take before it counts as failed.
    pub sink_timeout: u64,
    /// Pending events kept in event mode before the oldest are dropped.
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlexConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub token: Option<String>,
    pub channel_id: Option<u64>,
    pub presence_enabled: bool,
    /// Rich Presence application id, required when presence is enabled.
    pub application_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write daily log files here.
    pub directory: Option<PathBuf>,
}

/// How sessions reach the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fixed-interval fetches from a session source.
    Poll,
    /// Pushed activity updates for one identity.
    Event,
}

/// Immutable settings the engine is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub base_name: String,
    pub cooldown: Duration,
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    ///
    /// `path` overrides the platform config location.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let user_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)?;
            Self::from_toml(&user_str)
        } else if path.is_some() {
            Err(CoreError::Config(format!(
                "config file {} does not exist",
                user_path.display()
            )))
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a (possibly partial) TOML document over the defaults.
    pub fn from_toml(s: &str) -> Result<Self, CoreError> {
        let mut merged: toml::Table =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| CoreError::Config(e.to_string()))?;
        let user: toml::Table = toml::from_str(s).map_err(|e| CoreError::Config(e.to_string()))?;
        merge_tables(&mut merged, user);
        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| CoreError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "marquee")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Check everything `mode` needs is present.
    pub fn validate(&self, mode: Mode) -> Result<(), CoreError> {
        let mut missing = Vec::new();

        if is_blank(self.discord.token.as_deref()) {
            missing.push("DISCORD_TOKEN");
        }
        if self.discord.channel_id.is_none() {
            missing.push("CINEMA_CHANNEL_ID");
        }
        if mode == Mode::Poll {
            if is_blank(self.plex.url.as_deref()) {
                missing.push("PLEX_URL");
            }
            if is_blank(self.plex.token.as_deref()) {
                missing.push("PLEX_TOKEN");
            }
        }
        if self.discord.presence_enabled && is_blank(self.discord.application_id.as_deref()) {
            missing.push("discord.application_id");
        }

        if !missing.is_empty() {
            return Err(CoreError::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }
        if mode == Mode::Event && is_blank(self.general.target_user.as_deref()) {
            return Err(CoreError::Config(
                "event mode needs a user to watch (TARGET_USER)".into(),
            ));
        }
        if self.general.poll_interval == 0 {
            return Err(CoreError::Config("poll_interval must be at least 1".into()));
        }
        if self.general.queue_capacity == 0 {
            return Err(CoreError::Config("queue_capacity must be at least 1".into()));
        }
        Ok(())
    }

    pub fn engine_config(&self, mode: Mode) -> EngineConfig {
        let cooldown = match mode {
            Mode::Poll => self.general.rename_cooldown,
            Mode::Event => self.general.event_rename_cooldown,
        };
        let secs = i64::try_from(cooldown)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1_000);
        EngineConfig {
            base_name: self.general.base_name.clone(),
            cooldown: Duration::seconds(secs),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

fn is_blank(s: Option<&str>) -> bool {
    s.map_or(true, |s| s.trim().is_empty())
}

/// Recursively overlay `over` onto `base`.
fn merge_tables(base: &mut toml::Table, over: toml::Table) {
    for (key, value) in over {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(b)), toml::Value::Table(o)) => merge_tables(b, o),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
