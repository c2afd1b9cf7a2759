//! Wires config, sources and sinks together and runs one mode to completion.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use marquee_core::{AppConfig, Mode, NoPresence, PresenceError, PresenceSink, Presentation};
use marquee_discord::{DiscordChannel, RichPresence};
use marquee_plex::PlexClient;

use crate::driver::{feed_lines, run_events, run_poll};
use crate::error::RuntimeError;
use crate::queue::EventQueue;
use crate::timed::Timed;
use crate::worker::Worker;

/// Presence backend chosen by config.
pub enum Presence {
    Rich(RichPresence),
    Off(NoPresence),
}

impl Presence {
    pub fn from_config(config: &AppConfig) -> Result<Self, RuntimeError> {
        match (
            config.discord.presence_enabled,
            config.discord.application_id.as_deref(),
        ) {
            (true, Some(app_id)) => Ok(Self::Rich(RichPresence::start(app_id.to_string())?)),
            _ => Ok(Self::Off(NoPresence)),
        }
    }

    fn shutdown(&self) {
        if let Self::Rich(rich) = self {
            rich.shutdown();
        }
    }
}

impl PresenceSink for Presence {
    async fn set_presence(&self, presentation: &Presentation) -> Result<(), PresenceError> {
        match self {
            Self::Rich(rich) => rich.set_presence(presentation).await,
            Self::Off(off) => off.set_presence(presentation).await,
        }
    }

    async fn clear_presence(&self) -> Result<(), PresenceError> {
        match self {
            Self::Rich(rich) => rich.clear_presence().await,
            Self::Off(off) => off.clear_presence().await,
        }
    }
}

type AppWorker = Worker<Timed<DiscordChannel>, Timed<Presence>>;

/// Validate `config` for `mode` and run until Ctrl-C (or end of input in
/// event mode).
pub async fn run(config: AppConfig, mode: Mode) -> Result<(), RuntimeError> {
    config.validate(mode)?;
    log_startup(&config, mode);

    let timeout = Duration::from_secs(config.general.sink_timeout);
    let channel_id = config.discord.channel_id.unwrap_or_default();
    let token = config.discord.token.clone().unwrap_or_default();

    let channel = Timed::new(DiscordChannel::new(channel_id, token, timeout)?, timeout);
    let presence = Timed::new(Presence::from_config(&config)?, timeout);
    let mut worker = Worker::new(
        &config.engine_config(mode),
        config.general.target_user.clone(),
        channel,
        presence,
    );

    match mode {
        Mode::Poll => poll_mode(&config, &mut worker).await?,
        Mode::Event => event_mode(&config, &mut worker).await?,
    }

    worker.shutdown().await;
    worker.presence().inner().shutdown();
    info!("Stopped");
    Ok(())
}

async fn poll_mode(config: &AppConfig, worker: &mut AppWorker) -> Result<(), RuntimeError> {
    let timeout = Duration::from_secs(config.general.sink_timeout);
    let plex = PlexClient::new(
        config.plex.url.as_deref().unwrap_or_default(),
        config.plex.token.clone().unwrap_or_default(),
        timeout,
    )?;
    let source = Timed::new(plex, timeout);
    let interval = Duration::from_secs(config.general.poll_interval);

    run_poll(&source, worker, interval, shutdown_signal()).await;
    Ok(())
}

async fn event_mode(config: &AppConfig, worker: &mut AppWorker) -> Result<(), RuntimeError> {
    let watched = config.general.target_user.clone().unwrap_or_default();
    let queue = Arc::new(EventQueue::new(config.general.queue_capacity));

    // Stdin reads block, so they get their own thread like the presence actor.
    {
        let queue = queue.clone();
        std::thread::Builder::new()
            .name("event-reader".into())
            .spawn(move || {
                let stdin = std::io::stdin().lock();
                if let Err(e) = feed_lines(stdin, &watched, &queue) {
                    warn!(error = %e, "Stopped reading activity events");
                }
            })?;
    }

    run_events(&queue, worker, shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until input ends.
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

fn log_startup(config: &AppConfig, mode: Mode) {
    let general = &config.general;
    info!(
        mode = ?mode,
        base_name = %general.base_name,
        target_user = general.target_user.as_deref().unwrap_or("(any)"),
        channel_id = config.discord.channel_id.unwrap_or_default(),
        cooldown_secs = config.engine_config(mode).cooldown.num_seconds(),
        poll_interval_secs = general.poll_interval,
        presence = config.discord.presence_enabled,
        "marquee starting"
    );
    if mode == Mode::Poll {
        info!(url = config.plex.url.as_deref().unwrap_or_default(), "Plex server");
    }
}
