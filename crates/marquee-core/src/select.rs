//! Picks the one authoritative session out of a batch.

use crate::models::RawSessionRecord;

/// Owning identity of a record: explicit user title, else the first username.
pub fn owner_identity(record: &RawSessionRecord) -> Option<&str> {
    record
        .owner
        .user_title
        .as_deref()
        .filter(|t| !t.is_empty())
        .or_else(|| record.owner.usernames.first().map(String::as_str))
}

/// Select the first record owned by `filter`, or the first record at all when
/// there is no filter. Source order is preserved.
pub fn select<'a>(
    records: &'a [RawSessionRecord],
    filter: Option<&str>,
) -> Option<&'a RawSessionRecord> {
    match filter {
        Some(identity) => records
            .iter()
            .find(|r| owner_identity(r) == Some(identity)),
        None => records.first(),
    }
}

/// Drop screen-share / go-live entries from an activity list.
pub fn without_streaming(records: Vec<RawSessionRecord>) -> Vec<RawSessionRecord> {
    records.into_iter().filter(|r| !r.is_streaming()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    #[test]
    fn test_empty_selects_nothing() {
        assert!(select(&[], None).is_none());
        assert!(select(&[], Some("alice")).is_none());
    }

    #[test]
    fn test_no_filter_takes_first() {
        let records = vec![
            RawSessionRecord::movie("A", None).with_user("bob"),
            RawSessionRecord::movie("B", None).with_user("alice"),
        ];
        assert_eq!(select(&records, None).unwrap().title.as_deref(), Some("A"));
    }

    #[test]
    fn test_filter_finds_match_not_first() {
        let records = vec![
            RawSessionRecord::movie("A", None).with_user("bob"),
            RawSessionRecord::movie("B", None).with_user("alice"),
            RawSessionRecord::movie("C", None).with_user("alice"),
        ];
        let chosen = select(&records, Some("alice")).unwrap();
        assert_eq!(chosen.title.as_deref(), Some("B"));
    }

    #[test]
    fn test_filter_without_match() {
        let records = vec![RawSessionRecord::movie("A", None).with_user("bob")];
        assert!(select(&records, Some("alice")).is_none());
    }

    #[test]
    fn test_identity_fallback_to_usernames() {
        let mut r = RawSessionRecord::movie("A", None);
        r.owner.usernames = vec!["carol".into(), "dave".into()];
        assert_eq!(owner_identity(&r), Some("carol"));

        r.owner.user_title = Some(String::new());
        assert_eq!(owner_identity(&r), Some("carol"));

        r.owner.user_title = Some("erin".into());
        assert_eq!(owner_identity(&r), Some("erin"));

        assert_eq!(owner_identity(&RawSessionRecord::movie("B", None)), None);
    }

    #[test]
    fn test_without_streaming() {
        let mut live = RawSessionRecord::new(MediaKind::Streaming);
        live.title = Some("Go Live".into());
        let kept = without_streaming(vec![live, RawSessionRecord::movie("A", None)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, MediaKind::Movie);
    }
}
