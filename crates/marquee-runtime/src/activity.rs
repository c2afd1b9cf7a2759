//! Pushed activity updates for event mode.
//!
//! One JSON document per line:
//!
//! ```json
//! {"user": "alice", "activities": [{"type": "episode", "show": "Foo", "season": 1, "episode": 5, "title": "Bar", "state": "playing"}]}
//! ```

use serde::Deserialize;

use marquee_core::{MediaKind, RawSessionRecord, SessionOwner};

/// The full current activity set of one identity.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityEvent {
    pub user: String,
    #[serde(default)]
    pub activities: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: String,
    /// Activity name; used as the title when `title` is absent.
    pub name: Option<String>,
    pub title: Option<String>,
    pub year: Option<u32>,
    pub show: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub elapsed_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    pub state: Option<String>,
}

impl ActivityEvent {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Records owned by this event's user, in activity order.
    pub fn into_records(self) -> Vec<RawSessionRecord> {
        let user = self.user;
        self.activities
            .into_iter()
            .map(|a| a.into_record(&user))
            .collect()
    }
}

impl ActivityEntry {
    fn into_record(self, user: &str) -> RawSessionRecord {
        RawSessionRecord {
            kind: MediaKind::from_type(&self.kind),
            title: self.title.or(self.name),
            year: self.year,
            show_title: self.show,
            season_index: self.season,
            episode_index: self.episode,
            view_offset_ms: self.elapsed_ms,
            duration_ms: self.duration_ms,
            owner: SessionOwner {
                user_title: Some(user.to_string()),
                usernames: Vec::new(),
            },
            player_state: self.state,
        }
    }
}
