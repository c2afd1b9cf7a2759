use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use marquee_core::{AppConfig, Mode};

#[derive(Debug, Parser)]
#[command(name = "marquee", version, about = "Show what's playing on Plex in a Discord voice channel name")]
pub struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll Plex for active sessions.
    Poll,
    /// Read activity events (one JSON object per line) from stdin.
    Listen,
    /// Validate the configuration and print the effective settings.
    Check,
}

impl Command {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Listen => Mode::Event,
            Self::Poll | Self::Check => Mode::Poll,
        }
    }
}

/// Settings that may come from the environment or the command line.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true, global = true)]
    pub discord_token: Option<String>,

    #[arg(long, env = "CINEMA_CHANNEL_ID", global = true)]
    pub channel_id: Option<u64>,

    #[arg(long, env = "BASE_CHANNEL_NAME", global = true)]
    pub base_name: Option<String>,

    /// Only follow this user's sessions.
    #[arg(long, env = "TARGET_USER", global = true)]
    pub target_user: Option<String>,

    /// Seconds between renames in the selected mode.
    #[arg(long, env = "RENAME_COOLDOWN", global = true)]
    pub rename_cooldown: Option<u64>,

    #[arg(long, env = "POLL_INTERVAL", global = true)]
    pub poll_interval: Option<u64>,

    #[arg(long, env = "PLEX_URL", global = true)]
    pub plex_url: Option<String>,

    #[arg(long, env = "PLEX_TOKEN", hide_env_values = true, global = true)]
    pub plex_token: Option<String>,
}

impl Overrides {
    pub fn apply(self, config: &mut AppConfig, mode: Mode) {
        let general = &mut config.general;
        if let Some(v) = self.base_name {
            general.base_name = v;
        }
        if let Some(v) = self.target_user.filter(|v| !v.trim().is_empty()) {
            general.target_user = Some(v);
        }
        if let Some(v) = self.rename_cooldown {
            match mode {
                Mode::Poll => general.rename_cooldown = v,
                Mode::Event => general.event_rename_cooldown = v,
            }
        }
        if let Some(v) = self.poll_interval {
            general.poll_interval = v;
        }
        if self.discord_token.is_some() {
            config.discord.token = self.discord_token;
        }
        if self.channel_id.is_some() {
            config.discord.channel_id = self.channel_id;
        }
        if self.plex_url.is_some() {
            config.plex.url = self.plex_url;
        }
        if self.plex_token.is_some() {
            config.plex.token = self.plex_token;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "marquee",
            "listen",
            "--channel-id",
            "42",
            "--rename-cooldown",
            "5",
            "--base-name",
            "🎬 Theater",
        ])
        .unwrap();
        let mode = cli.command.mode();
        assert_eq!(mode, Mode::Event);

        let mut config = AppConfig::default();
        cli.overrides.apply(&mut config, mode);
        assert_eq!(config.discord.channel_id, Some(42));
        assert_eq!(config.general.event_rename_cooldown, 5);
        assert_eq!(config.general.rename_cooldown, 300);
        assert_eq!(config.general.base_name, "🎬 Theater");
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = AppConfig::default();
        config.discord.channel_id = Some(7);
        Overrides::default().apply(&mut config, Mode::Poll);
        assert_eq!(config.discord.channel_id, Some(7));
        assert_eq!(config.general.base_name, " Cinema");
    }
}
