//! Reconciliation engine: session batch → presence and rename commands.
//!
//! One engine per target channel. It is driven by a single worker, so
//! `&mut self` on every cycle keeps decide and commit in one critical section.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{ChannelError, PresenceError, SourceError};
use crate::governor::{RenameGovernor, MAX_TITLE_CHARS, NAME_SEPARATOR};
use crate::models::{Presentation, RawSessionRecord};
use crate::normalize::normalize;
use crate::select::select;
use crate::sink::{ChannelSink, PresenceSink};

/// Audit-log reason attached to every rename.
pub const RENAME_REASON: &str = "Update cinema name from Plex session";

/// Channel suffix used when a presentation has nothing printable.
pub const UNTITLED_SUFFIX: &str = "Watching";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceCommand {
    Set(Presentation),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameCommand {
    pub name: String,
    pub reason: &'static str,
}

/// What one cycle wants the sinks to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub presence: PresenceCommand,
    /// Channel name this cycle would like to show, already fitted.
    pub candidate: String,
    pub rename: Option<RenameCommand>,
    /// Set when the candidate differs but the cooldown holds it back.
    pub cooling_down: Option<Duration>,
}

impl Reconciliation {
    pub fn is_idle(&self) -> bool {
        self.presence == PresenceCommand::Clear
    }
}

/// How a cycle ended.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Renamed { name: String },
    Unchanged { name: String },
    CoolingDown { pending: String, remaining: Duration },
    /// The target channel could not be read; nothing was touched.
    Skipped(ChannelError),
    PresenceFailed(PresenceError),
    RenameFailed { name: String, error: ChannelError },
}

#[derive(Debug, Clone)]
pub struct Engine {
    base_name: String,
    governor: RenameGovernor,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_name: config.base_name.clone(),
            governor: RenameGovernor::new(&config.base_name, config.cooldown),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn governor(&self) -> &RenameGovernor {
        &self.governor
    }

    /// Channel name for a presentation, or the idle base name for none.
    pub fn candidate_name(&self, presentation: Option<&Presentation>) -> String {
        let Some(p) = presentation else {
            return self.base_name.clone();
        };
        let title = match p.details.trim() {
            "" => UNTITLED_SUFFIX,
            t => t,
        };
        let title: String = title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{}{NAME_SEPARATOR}{title}", self.base_name)
    }

    /// Work out the commands for one batch. Does not commit anything.
    pub fn reconcile(
        &mut self,
        records: &[RawSessionRecord],
        filter: Option<&str>,
        current_name: &str,
        now: DateTime<Utc>,
    ) -> Reconciliation {
        self.governor.seed(current_name);

        let presentation = select(records, filter).map(|r| normalize(r, now));
        let candidate = self.candidate_name(presentation.as_ref());
        let decision = self.governor.decide(current_name, &candidate, now);

        let pending = decision.target_name.as_str()
            != self.governor.state().last_applied_name.as_deref().unwrap_or(current_name);
        let cooling_down = if pending && !decision.should_rename {
            self.governor.cooldown_remaining(now)
        } else {
            None
        };

        let rename = decision.should_rename.then(|| RenameCommand {
            name: decision.target_name.clone(),
            reason: RENAME_REASON,
        });

        Reconciliation {
            presence: match presentation {
                Some(p) => PresenceCommand::Set(p),
                None => PresenceCommand::Clear,
            },
            candidate: decision.target_name,
            rename,
            cooling_down,
        }
    }

    /// Run a full cycle against the sinks.
    ///
    /// A failed fetch counts as "nothing playing". A channel that cannot be
    /// read skips the cycle. Sink failures end the cycle without committing.
    pub async fn run_cycle<C, P>(
        &mut self,
        batch: Result<Vec<RawSessionRecord>, SourceError>,
        filter: Option<&str>,
        now: DateTime<Utc>,
        channel: &C,
        presence: &P,
    ) -> CycleOutcome
    where
        C: ChannelSink,
        P: PresenceSink,
    {
        let current_name = match channel.current_name().await {
            Ok(name) => name,
            Err(e) => return CycleOutcome::Skipped(e),
        };

        let records = batch.unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to idle");
            Vec::new()
        });

        let plan = self.reconcile(&records, filter, &current_name, now);
        debug!(
            candidate = %plan.candidate,
            idle = plan.is_idle(),
            rename = plan.rename.is_some(),
            "Reconciled"
        );

        let presence_result = match &plan.presence {
            PresenceCommand::Set(p) => presence.set_presence(p).await,
            PresenceCommand::Clear => presence.clear_presence().await,
        };
        if let Err(e) = presence_result {
            return CycleOutcome::PresenceFailed(e);
        }

        match plan.rename {
            Some(cmd) => match channel.rename(&cmd.name, cmd.reason).await {
                Ok(()) => {
                    self.governor.commit(&cmd.name, now);
                    CycleOutcome::Renamed { name: cmd.name }
                }
                Err(error) => CycleOutcome::RenameFailed {
                    name: cmd.name,
                    error,
                },
            },
            None => match plan.cooling_down {
                Some(remaining) => CycleOutcome::CoolingDown {
                    pending: plan.candidate,
                    remaining,
                },
                None => CycleOutcome::Unchanged {
                    name: plan.candidate,
                },
            },
        }
    }
}
