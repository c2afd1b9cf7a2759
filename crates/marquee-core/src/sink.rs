//! Collaborator interfaces the engine talks to.
//!
//! Sources and sinks own all transport details; the engine only awaits them.

use std::future::Future;

use crate::error::{ChannelError, PresenceError, SourceError};
use crate::models::{Presentation, RawSessionRecord};

/// Something that can list what is currently playing.
pub trait SessionSource: Send + Sync {
    fn list_active_sessions(
        &self,
    ) -> impl Future<Output = Result<Vec<RawSessionRecord>, SourceError>> + Send;
}

/// The user-facing presence ("Watching ...").
pub trait PresenceSink: Send + Sync {
    fn set_presence(
        &self,
        presentation: &Presentation,
    ) -> impl Future<Output = Result<(), PresenceError>> + Send;

    fn clear_presence(&self) -> impl Future<Output = Result<(), PresenceError>> + Send;
}

/// The voice channel whose name acts as the marquee.
pub trait ChannelSink: Send + Sync {
    /// Current name of the channel. May be served from a cache.
    fn current_name(&self) -> impl Future<Output = Result<String, ChannelError>> + Send;

    fn rename(
        &self,
        new_name: &str,
        reason: &str,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Presence sink used when presence updates are turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPresence;

impl PresenceSink for NoPresence {
    async fn set_presence(&self, _presentation: &Presentation) -> Result<(), PresenceError> {
        Ok(())
    }

    async fn clear_presence(&self) -> Result<(), PresenceError> {
        Ok(())
    }
}
