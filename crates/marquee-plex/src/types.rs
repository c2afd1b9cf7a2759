use serde::Deserialize;

use marquee_core::{MediaKind, RawSessionRecord, SessionOwner};

// ── /status/sessions ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SessionsResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: MediaContainer,
}

#[derive(Debug, Deserialize)]
pub struct MediaContainer {
    #[serde(default)]
    pub size: u32,
    /// Absent entirely when nothing is playing.
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<SessionMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub year: Option<u32>,
    pub grandparent_title: Option<String>,
    pub parent_index: Option<u32>,
    pub index: Option<u32>,
    pub view_offset: Option<u64>,
    pub duration: Option<u64>,
    #[serde(rename = "User")]
    pub user: Option<PlexUser>,
    #[serde(rename = "Player")]
    pub player: Option<PlexPlayer>,
}

#[derive(Debug, Deserialize)]
pub struct PlexUser {
    pub title: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlexPlayer {
    pub state: Option<String>,
    pub title: Option<String>,
    pub product: Option<String>,
}

// ── Conversions to core records ─────────────────────────────────

impl SessionMetadata {
    pub fn into_record(self) -> RawSessionRecord {
        let (user_title, usernames) = match self.user {
            Some(user) => (user.title, user.username.into_iter().collect()),
            None => (None, Vec::new()),
        };

        RawSessionRecord {
            kind: MediaKind::from_type(&self.kind),
            title: self.title,
            year: self.year,
            show_title: self.grandparent_title,
            season_index: self.parent_index,
            episode_index: self.index,
            view_offset_ms: self.view_offset,
            duration_ms: self.duration,
            owner: SessionOwner {
                user_title,
                usernames,
            },
            player_state: self.player.and_then(|p| p.state),
        }
    }
}

impl SessionsResponse {
    pub fn into_records(self) -> Vec<RawSessionRecord> {
        self.media_container
            .metadata
            .into_iter()
            .map(SessionMetadata::into_record)
            .collect()
    }
}
