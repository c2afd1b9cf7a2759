//! Session normalization: raw session record → [`Presentation`].
//!
//! Total over its input. Missing fields fall back to placeholders so the
//! result always has a non-empty `details` line to build a channel name from.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Category, MediaKind, PlaybackWindow, Presentation, RawSessionRecord};

/// Show name used when an episode does not report one.
pub const UNKNOWN_SHOW: &str = "Unknown Show";

/// Title used when a record has no usable title at all.
pub const FALLBACK_TITLE: &str = "Media";

/// Player state assumed when the source does not report one.
const DEFAULT_PLAYER_STATE: &str = "playing";

/// Normalize one record as observed at `now`.
pub fn normalize(record: &RawSessionRecord, now: DateTime<Utc>) -> Presentation {
    let player_state = record
        .player_state
        .clone()
        .unwrap_or_else(|| DEFAULT_PLAYER_STATE.to_string());
    let paused = player_state != "playing";

    let (main_line, details, state_text, category) = match &record.kind {
        MediaKind::Movie => {
            let details = movie_details(record);
            (details.clone(), details.clone(), details, Category::Movie)
        }
        MediaKind::Episode => {
            let show = non_empty(record.show_title.as_deref()).unwrap_or(UNKNOWN_SHOW);
            let tag = episode_tag(record.season_index, record.episode_index);
            let title = record.title.as_deref().unwrap_or_default();

            let details = trim_leading_dashes(&format!("{show} - {tag}: {title}"));
            let state_text = trim_leading_colons(&format!("{tag}: {title}"));
            (show.to_string(), details, state_text, Category::Tv)
        }
        kind @ (MediaKind::Streaming | MediaKind::Other(_)) => {
            let details = title_or_fallback(record);
            (
                details.clone(),
                details,
                capitalize(kind.as_str()),
                Category::Other,
            )
        }
    };

    // Episodes with an empty show and title can still trim down to nothing.
    let details = if details.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        details
    };

    let window = if paused {
        None
    } else {
        playback_window(record.view_offset_ms, record.duration_ms, now)
    };

    Presentation {
        main_line,
        details,
        state_text,
        category,
        paused,
        player_state,
        elapsed_ms: record.view_offset_ms,
        duration_ms: record.duration_ms,
        window,
    }
}

// ── Field formatting ──────────────────────────────────────────────────

fn movie_details(record: &RawSessionRecord) -> String {
    let title = title_or_fallback(record);
    match record.year.filter(|y| *y > 0) {
        Some(year) => format!("{title} ({year})"),
        None => title,
    }
}

/// `S01E05`, `S01`, `E05` or empty. Index 0 (Plex specials) is left out.
fn episode_tag(season: Option<u32>, episode: Option<u32>) -> String {
    let mut tag = String::new();
    if let Some(s) = season.filter(|s| *s > 0) {
        tag.push_str(&format!("S{s:02}"));
    }
    if let Some(e) = episode.filter(|e| *e > 0) {
        tag.push_str(&format!("E{e:02}"));
    }
    tag
}

fn title_or_fallback(record: &RawSessionRecord) -> String {
    non_empty(record.title.as_deref())
        .unwrap_or(FALLBACK_TITLE)
        .to_string()
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn trim_leading_dashes(s: &str) -> String {
    s.trim_start_matches([' ', '-']).to_string()
}

fn trim_leading_colons(s: &str) -> String {
    s.trim_start_matches([':', ' ']).to_string()
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ── Progress ──────────────────────────────────────────────────────────

fn playback_window(
    elapsed_ms: Option<u64>,
    duration_ms: Option<u64>,
    now: DateTime<Utc>,
) -> Option<PlaybackWindow> {
    let elapsed = Duration::milliseconds(i64::try_from(elapsed_ms?).ok()?);
    let duration = Duration::milliseconds(i64::try_from(duration_ms?).ok()?);
    let start = now.checked_sub_signed(elapsed)?;
    let end = start.checked_add_signed(duration)?;
    Some(PlaybackWindow { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    // ── Movies ────────────────────────────────────────────────────────

    #[test]
    fn test_movie_with_year() {
        let p = normalize(
            &RawSessionRecord::movie("Dune", Some(2021)).with_state("playing"),
            now(),
        );
        assert_eq!(p.details, "Dune (2021)");
        assert_eq!(p.main_line, "Dune (2021)");
        assert_eq!(p.state_text, "Dune (2021)");
        assert_eq!(p.category, Category::Movie);
        assert!(!p.paused);
    }

    #[test]
    fn test_movie_without_year() {
        let p = normalize(&RawSessionRecord::movie("Alien", None), now());
        assert_eq!(p.details, "Alien");
    }

    #[test]
    fn test_movie_without_title_uses_fallback() {
        let p = normalize(&RawSessionRecord::new(MediaKind::Movie), now());
        assert_eq!(p.details, "Media");
    }

    // ── Episodes ──────────────────────────────────────────────────────

    #[test]
    fn test_episode_full() {
        let r = RawSessionRecord::episode("Foo", Some(1), Some(5), "Bar").with_state("paused");
        let p = normalize(&r, now());
        assert_eq!(p.details, "Foo - S01E05: Bar");
        assert_eq!(p.main_line, "Foo");
        assert_eq!(p.state_text, "S01E05: Bar");
        assert_eq!(p.category, Category::Tv);
        assert!(p.paused);
        assert!(p.window.is_none());
    }

    #[test]
    fn test_episode_missing_indices() {
        let p = normalize(&RawSessionRecord::episode("Foo", None, Some(5), "Bar"), now());
        assert_eq!(p.details, "Foo - E05: Bar");
        assert_eq!(p.state_text, "E05: Bar");

        let p = normalize(&RawSessionRecord::episode("Foo", Some(2), None, "Bar"), now());
        assert_eq!(p.details, "Foo - S02: Bar");

        let p = normalize(&RawSessionRecord::episode("Foo", None, None, "Bar"), now());
        assert_eq!(p.state_text, "Bar");
    }

    #[test]
    fn test_zero_indices_are_not_tagged() {
        let r = RawSessionRecord::episode("Foo", Some(0), Some(1), "Special");
        let p = normalize(&r, now());
        assert_eq!(p.details, "Foo - E01: Special");
        assert_eq!(p.state_text, "E01: Special");

        let p = normalize(&RawSessionRecord::movie("Dune", Some(0)), now());
        assert_eq!(p.details, "Dune");
    }

    #[test]
    fn test_episode_never_starts_with_separator() {
        for (season, episode) in [(None, None), (Some(1), None), (None, Some(3)), (Some(1), Some(3))] {
            let mut r = RawSessionRecord::episode("", season, episode, "Pilot");
            r.show_title = Some(String::new());
            let p = normalize(&r, now());
            assert!(!p.details.starts_with(' '), "{:?}", p.details);
            assert!(!p.details.starts_with('-'), "{:?}", p.details);

            r.show_title = None;
            let p = normalize(&r, now());
            assert!(p.details.starts_with(UNKNOWN_SHOW));
        }
    }

    #[test]
    fn test_episode_missing_show() {
        let mut r = RawSessionRecord::episode("x", Some(1), Some(1), "Pilot");
        r.show_title = None;
        let p = normalize(&r, now());
        assert_eq!(p.details, "Unknown Show - S01E01: Pilot");
        assert_eq!(p.main_line, "Unknown Show");
    }

    // ── Other kinds ───────────────────────────────────────────────────

    #[test]
    fn test_other_kind() {
        let mut r = RawSessionRecord::new(MediaKind::Other("track".into()));
        r.title = Some("Song".into());
        let p = normalize(&r, now());
        assert_eq!(p.details, "Song");
        assert_eq!(p.state_text, "Track");
        assert_eq!(p.category, Category::Other);
        assert_eq!(p.large_image(), "plex");
    }

    #[test]
    fn test_other_kind_without_title() {
        let p = normalize(&RawSessionRecord::new(MediaKind::Other("clip".into())), now());
        assert_eq!(p.details, "Media");
    }

    // ── State & progress ──────────────────────────────────────────────

    #[test]
    fn test_missing_state_means_playing() {
        let p = normalize(&RawSessionRecord::movie("Dune", None), now());
        assert!(!p.paused);
        assert_eq!(p.small_text(), "Playing");
        assert_eq!(p.small_image(), "playing");
    }

    #[test]
    fn test_buffering_counts_as_paused() {
        let p = normalize(
            &RawSessionRecord::movie("Dune", None).with_state("buffering"),
            now(),
        );
        assert!(p.paused);
        assert_eq!(p.small_text(), "Buffering");
    }

    #[test]
    fn test_player_state_compared_as_reported() {
        let p = normalize(
            &RawSessionRecord::movie("Dune", None).with_state("Playing"),
            now(),
        );
        assert!(p.paused);
        assert_eq!(p.player_state, "Playing");
    }

    #[test]
    fn test_window_when_playing() {
        let r = RawSessionRecord::movie("Dune", Some(2021))
            .with_state("playing")
            .with_progress(60_000, 600_000);
        let p = normalize(&r, now());
        let w = p.window.unwrap();
        assert_eq!(w.start.timestamp(), 1_700_000_000 - 60);
        assert_eq!(w.end.timestamp(), 1_700_000_000 - 60 + 600);
        assert_eq!(p.elapsed_ms, Some(60_000));
    }

    #[test]
    fn test_no_window_when_paused_or_incomplete() {
        let paused = RawSessionRecord::movie("Dune", None)
            .with_state("paused")
            .with_progress(1_000, 2_000);
        assert!(normalize(&paused, now()).window.is_none());

        let mut partial = RawSessionRecord::movie("Dune", None);
        partial.view_offset_ms = Some(1_000);
        assert!(normalize(&partial, now()).window.is_none());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("paused"), "Paused");
        assert_eq!(capitalize("EPISODE"), "Episode");
        assert_eq!(capitalize(""), "");
    }
}
