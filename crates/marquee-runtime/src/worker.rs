//! The single consumer that owns an [`Engine`] and its sinks.
//!
//! Both drivers hand record batches to [`Worker::process`] one at a time;
//! a batch runs to completion before the next one starts.

use tracing::{debug, error, info, warn};

use marquee_core::{
    ChannelError, ChannelSink, Clock, CycleOutcome, Engine, EngineConfig, PresenceSink,
    RawSessionRecord, SourceError, SystemClock,
};

pub struct Worker<C, P, K = SystemClock> {
    engine: Engine,
    channel: C,
    presence: P,
    clock: K,
    filter: Option<String>,
    channel_missing: bool,
}

impl<C: ChannelSink, P: PresenceSink> Worker<C, P, SystemClock> {
    pub fn new(config: &EngineConfig, filter: Option<String>, channel: C, presence: P) -> Self {
        Self::with_clock(config, filter, channel, presence, SystemClock)
    }
}

impl<C: ChannelSink, P: PresenceSink, K: Clock> Worker<C, P, K> {
    pub fn with_clock(
        config: &EngineConfig,
        filter: Option<String>,
        channel: C,
        presence: P,
        clock: K,
    ) -> Self {
        Self {
            engine: Engine::new(config),
            channel,
            presence,
            clock,
            filter,
            channel_missing: false,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn presence(&self) -> &P {
        &self.presence
    }

    /// Reconcile one batch against the sinks and log how it went.
    pub async fn process(
        &mut self,
        batch: Result<Vec<RawSessionRecord>, SourceError>,
    ) -> CycleOutcome {
        let now = self.clock.now();
        let outcome = self
            .engine
            .run_cycle(
                batch,
                self.filter.as_deref(),
                now,
                &self.channel,
                &self.presence,
            )
            .await;
        self.report(&outcome);
        outcome
    }

    fn report(&mut self, outcome: &CycleOutcome) {
        let missing = matches!(outcome, CycleOutcome::Skipped(ChannelError::NotFound(_)));
        if !missing && self.channel_missing {
            info!("Target channel is reachable again");
        }

        match outcome {
            CycleOutcome::Renamed { name } => info!(name = %name, "Updated channel name"),
            CycleOutcome::Unchanged { name } => debug!(name = %name, "Channel name unchanged"),
            CycleOutcome::CoolingDown { pending, remaining } => debug!(
                pending = %pending,
                remaining_secs = remaining.num_seconds(),
                "Rename cooldown active"
            ),
            CycleOutcome::Skipped(ChannelError::NotFound(id)) => {
                if self.channel_missing {
                    debug!(channel_id = id, "Channel still not found; skipping this cycle");
                } else {
                    error!(channel_id = id, "Channel not found in any guild; skipping this cycle");
                }
            }
            CycleOutcome::Skipped(e) => warn!(error = %e, "Could not read channel; skipping this cycle"),
            CycleOutcome::PresenceFailed(e) => warn!(error = %e, "Failed to update presence"),
            CycleOutcome::RenameFailed { name, error } => {
                warn!(name = %name, error = %error, "Failed to rename channel")
            }
        }

        self.channel_missing = missing;
    }

    /// Best-effort presence reset on the way out.
    pub async fn shutdown(&self) {
        if let Err(e) = self.presence.clear_presence().await {
            debug!(error = %e, "Could not clear presence on shutdown");
        }
    }
}
