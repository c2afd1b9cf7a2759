//! Discord side of the marquee: the voice channel and the user's presence.

pub mod channel;
pub mod error;
pub mod presence;

pub use channel::DiscordChannel;
pub use error::DiscordError;
pub use presence::{ActivityPayload, RichPresence};
