use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad category of what is showing, used to pick presence artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Movie,
    Tv,
    Other,
}

impl Category {
    /// Rich presence large-image asset key.
    pub fn asset_key(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Other => "plex",
        }
    }
}

/// Wall-clock span of the current playback, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Display-ready derivation of a single session.
///
/// `details` is never empty and is what the channel title is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub main_line: String,
    pub details: String,
    pub state_text: String,
    pub category: Category,
    pub paused: bool,
    /// Player state as reported, defaulting to `"playing"`.
    pub player_state: String,
    pub elapsed_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    /// Only present while playing with known progress.
    pub window: Option<PlaybackWindow>,
}

impl Presentation {
    pub const LARGE_TEXT: &'static str = "Watching on Plex";

    pub fn large_image(&self) -> &'static str {
        self.category.asset_key()
    }

    pub fn small_image(&self) -> &'static str {
        if self.paused {
            "paused"
        } else {
            "playing"
        }
    }

    /// Capitalized player state, e.g. `"Paused"`.
    pub fn small_text(&self) -> String {
        crate::normalize::capitalize(&self.player_state)
    }
}
