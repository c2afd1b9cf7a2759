//! Deadline wrappers for sources and sinks. A call that overruns counts as an
//! ordinary failure of that collaborator.

use std::time::Duration;

use tokio::time::timeout;

use marquee_core::{
    ChannelError, ChannelSink, PresenceError, PresenceSink, Presentation, RawSessionRecord,
    SessionSource, SourceError,
};

#[derive(Debug, Clone)]
pub struct Timed<S> {
    inner: S,
    limit: Duration,
}

impl<S> Timed<S> {
    pub fn new(inner: S, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn expired(&self) -> String {
        format!("timed out after {}s", self.limit.as_secs_f32())
    }
}

impl<S: SessionSource> SessionSource for Timed<S> {
    async fn list_active_sessions(&self) -> Result<Vec<RawSessionRecord>, SourceError> {
        timeout(self.limit, self.inner.list_active_sessions())
            .await
            .unwrap_or_else(|_| Err(SourceError(self.expired())))
    }
}

impl<S: PresenceSink> PresenceSink for Timed<S> {
    async fn set_presence(&self, presentation: &Presentation) -> Result<(), PresenceError> {
        timeout(self.limit, self.inner.set_presence(presentation))
            .await
            .unwrap_or_else(|_| Err(PresenceError(self.expired())))
    }

    async fn clear_presence(&self) -> Result<(), PresenceError> {
        timeout(self.limit, self.inner.clear_presence())
            .await
            .unwrap_or_else(|_| Err(PresenceError(self.expired())))
    }
}

impl<S: ChannelSink> ChannelSink for Timed<S> {
    async fn current_name(&self) -> Result<String, ChannelError> {
        timeout(self.limit, self.inner.current_name())
            .await
            .unwrap_or_else(|_| Err(ChannelError::Lookup(self.expired())))
    }

    async fn rename(&self, new_name: &str, reason: &str) -> Result<(), ChannelError> {
        timeout(self.limit, self.inner.rename(new_name, reason))
            .await
            .unwrap_or_else(|_| Err(ChannelError::RenameFailed(self.expired())))
    }
}
