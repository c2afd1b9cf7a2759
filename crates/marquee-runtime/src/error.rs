use marquee_core::CoreError;
use marquee_discord::DiscordError;
use marquee_plex::PlexError;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] CoreError),
    #[error("plex error: {0}")]
    Plex(#[from] PlexError),
    #[error("discord error: {0}")]
    Discord(#[from] DiscordError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
