use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure fetching the raw session/activity list.
#[derive(Debug, Clone, Error)]
#[error("session source unavailable: {0}")]
pub struct SourceError(pub String);

/// Failure setting or clearing the presence.
#[derive(Debug, Clone, Error)]
#[error("presence update failed: {0}")]
pub struct PresenceError(pub String);

/// Errors from the target channel.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// The channel id does not resolve in any accessible guild.
    #[error("channel {0} not found")]
    NotFound(u64),

    #[error("rename failed: {0}")]
    RenameFailed(String),

    #[error("channel lookup failed: {0}")]
    Lookup(String),
}
