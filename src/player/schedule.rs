//! Day-of-week eligibility.

use chrono::{Datelike, Local, Weekday};

use crate::models::MediaRecord;

/// Today's weekday in the server's local time zone.
pub fn today() -> Weekday {
    Local::now().weekday()
}

/// Visible and scheduled for `day` (either its own weekday folder or "todos").
pub fn is_eligible(media: &MediaRecord, day: Weekday) -> bool {
    !media.hidden && media.folder.is_active_on(day)
}

/// Keep catalog order, drop everything not playing on `day`.
pub fn eligible_for(media: Vec<MediaRecord>, day: Weekday) -> Vec<MediaRecord> {
    media
        .into_iter()
        .filter(|m| is_eligible(m, day))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;
    use crate::models::{Folder, MediaKind};

    #[test]
    fn test_hidden_never_eligible() {
        let mut all = record("a", MediaKind::Image, Folder::All);
        all.hidden = true;
        let mut monday = record("b", MediaKind::Image, Folder::Monday);
        monday.hidden = true;

        for day in [Weekday::Mon, Weekday::Wed, Weekday::Sun] {
            assert!(!is_eligible(&all, day));
            assert!(!is_eligible(&monday, day));
        }
    }

    #[test]
    fn test_todos_every_day_segunda_only_monday() {
        let todos = record("a", MediaKind::Image, Folder::All);
        let segunda = record("b", MediaKind::Video, Folder::Monday);

        assert!(is_eligible(&todos, Weekday::Mon));
        assert!(is_eligible(&todos, Weekday::Sat));
        assert!(is_eligible(&segunda, Weekday::Mon));
        assert!(!is_eligible(&segunda, Weekday::Tue));
    }

    #[test]
    fn test_eligible_keeps_order() {
        let media = vec![
            record("a", MediaKind::Image, Folder::All),
            record("b", MediaKind::Image, Folder::Friday),
            record("c", MediaKind::Video, Folder::Monday),
            record("d", MediaKind::Image, Folder::All),
        ];

        let ids: Vec<String> = eligible_for(media, Weekday::Mon)
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
    }
}
