//! Rename governor: decides whether the channel should be renamed.
//!
//! Deciding never touches state. The engine [`commit`](RenameGovernor::commit)s
//! a name only after the channel confirmed the rename, so a failed rename is
//! retried on the next cycle without having advanced the cooldown.

use chrono::{DateTime, Duration, Utc};

/// Separator between the base name and the title.
pub const NAME_SEPARATOR: &str = " – ";

/// Maximum characters of title kept after the base-name prefix.
pub const MAX_TITLE_CHARS: usize = 50;

/// Output of [`RenameGovernor::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDecision {
    pub should_rename: bool,
    pub target_name: String,
}

/// Process-lifetime rename bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct RenameState {
    pub last_applied_name: Option<String>,
    pub last_applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct RenameGovernor {
    prefix: String,
    cooldown: Duration,
    state: RenameState,
}

impl RenameGovernor {
    pub fn new(base_name: &str, cooldown: Duration) -> Self {
        Self {
            prefix: format!("{base_name}{NAME_SEPARATOR}"),
            cooldown,
            state: RenameState::default(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn state(&self) -> &RenameState {
        &self.state
    }

    /// Clamp the part after the base-name prefix to [`MAX_TITLE_CHARS`].
    pub fn fit(&self, candidate: &str) -> String {
        match candidate.strip_prefix(&self.prefix) {
            Some(title) if title.chars().count() > MAX_TITLE_CHARS => {
                let title: String = title.chars().take(MAX_TITLE_CHARS).collect();
                format!("{}{title}", self.prefix)
            }
            _ => candidate.to_string(),
        }
    }

    /// Adopt the live channel name as the baseline if nothing was applied yet.
    pub fn seed(&mut self, current_name: &str) {
        if self.state.last_applied_name.is_none() {
            self.state.last_applied_name = Some(current_name.to_string());
        }
    }

    /// Decide whether `candidate` should be applied at `now`.
    pub fn decide(&self, current_name: &str, candidate: &str, now: DateTime<Utc>) -> RenameDecision {
        let target_name = self.fit(candidate);
        let baseline = self.state.last_applied_name.as_deref().unwrap_or(current_name);

        RenameDecision {
            should_rename: target_name != baseline && self.cooldown_elapsed(now),
            target_name,
        }
    }

    /// Record a rename the channel accepted.
    pub fn commit(&mut self, name: &str, now: DateTime<Utc>) {
        self.state.last_applied_name = Some(self.fit(name));
        self.state.last_applied_at = Some(now);
    }

    pub fn cooldown_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_remaining(now).is_none()
    }

    /// Time left before another rename is allowed, if any.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.state.last_applied_at?;
        let remaining = self.cooldown - (now - last);
        (remaining > Duration::zero()).then_some(remaining)
    }
}
