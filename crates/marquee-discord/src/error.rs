use thiserror::Error;

/// Errors from the Discord REST client.
#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:.1}s")]
    RateLimited { retry_after: f64 },

    /// Unknown channel or no access to it.
    #[error("channel not accessible (status {status})")]
    Inaccessible { status: u16 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("failed to start presence thread: {0}")]
    Spawn(#[from] std::io::Error),
}
