use serde::{Deserialize, Serialize};

/// What kind of media a session or activity is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Episode,
    /// A screen share or go-live activity. Never shown as "now playing".
    Streaming,
    /// Anything else (tracks, clips, photos...), keeping the source's label.
    Other(String),
}

impl MediaKind {
    /// Map a source type string (`"movie"`, `"episode"`, `"track"`...) to a kind.
    pub fn from_type(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Self::Movie,
            "episode" => Self::Episode,
            "streaming" => Self::Streaming,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "episode",
            Self::Streaming => "streaming",
            Self::Other(s) => s,
        }
    }
}

/// Who owns a session, as reported by the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOwner {
    /// Explicit account title, when the source reports one.
    pub user_title: Option<String>,
    /// Usernames attached to the session, in source order.
    #[serde(default)]
    pub usernames: Vec<String>,
}

/// One active playback or activity entry as delivered by a source.
///
/// Fields a given source does not know about are left as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSessionRecord {
    pub kind: MediaKind,
    pub title: Option<String>,
    pub year: Option<u32>,
    /// Show name for episodes.
    pub show_title: Option<String>,
    pub season_index: Option<u32>,
    pub episode_index: Option<u32>,
    /// Playback position in milliseconds.
    pub view_offset_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub owner: SessionOwner,
    /// Raw player state, e.g. `"playing"`, `"paused"`, `"buffering"`.
    pub player_state: Option<String>,
}

impl RawSessionRecord {
    /// An empty record of the given kind.
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            title: None,
            year: None,
            show_title: None,
            season_index: None,
            episode_index: None,
            view_offset_ms: None,
            duration_ms: None,
            owner: SessionOwner::default(),
            player_state: None,
        }
    }

    pub fn movie(title: impl Into<String>, year: Option<u32>) -> Self {
        Self {
            title: Some(title.into()),
            year,
            ..Self::new(MediaKind::Movie)
        }
    }

    pub fn episode(
        show: impl Into<String>,
        season: Option<u32>,
        episode: Option<u32>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            show_title: Some(show.into()),
            season_index: season,
            episode_index: episode,
            ..Self::new(MediaKind::Episode)
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.player_state = Some(state.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.owner.user_title = Some(user.into());
        self
    }

    pub fn with_progress(mut self, view_offset_ms: u64, duration_ms: u64) -> Self {
        self.view_offset_ms = Some(view_offset_ms);
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.kind == MediaKind::Streaming
    }
}
