//! Scheduling folders: the seven weekdays plus "todos".

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Scheduling tag of a media record.
///
/// Wire names follow the data the displays were built around (Portuguese
/// weekday names); English names are accepted on input as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Folder {
    #[serde(rename = "todos", alias = "all")]
    All,
    #[serde(rename = "domingo", alias = "sunday")]
    Sunday,
    #[serde(rename = "segunda", alias = "monday")]
    Monday,
    #[serde(rename = "terça", alias = "tuesday")]
    Tuesday,
    #[serde(rename = "quarta", alias = "wednesday")]
    Wednesday,
    #[serde(rename = "quinta", alias = "thursday")]
    Thursday,
    #[serde(rename = "sexta", alias = "friday")]
    Friday,
    #[serde(rename = "sábado", alias = "saturday")]
    Saturday,
}

impl Folder {
    /// Every folder, in the order the admin screens list them.
    pub const EVERY: [Folder; 8] = [
        Folder::All,
        Folder::Sunday,
        Folder::Monday,
        Folder::Tuesday,
        Folder::Wednesday,
        Folder::Thursday,
        Folder::Friday,
        Folder::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Folder::All => "todos",
            Folder::Sunday => "domingo",
            Folder::Monday => "segunda",
            Folder::Tuesday => "terça",
            Folder::Wednesday => "quarta",
            Folder::Thursday => "quinta",
            Folder::Friday => "sexta",
            Folder::Saturday => "sábado",
        }
    }

    /// ASCII name used for object storage keys.
    pub fn slug(&self) -> &'static str {
        match self {
            Folder::Tuesday => "terca",
            Folder::Saturday => "sabado",
            other => other.as_str(),
        }
    }

    /// Parse a folder from its wire name or English alias (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "todos" | "all" => Some(Folder::All),
            "domingo" | "sunday" => Some(Folder::Sunday),
            "segunda" | "monday" => Some(Folder::Monday),
            "terça" | "terca" | "tuesday" => Some(Folder::Tuesday),
            "quarta" | "wednesday" => Some(Folder::Wednesday),
            "quinta" | "thursday" => Some(Folder::Thursday),
            "sexta" | "friday" => Some(Folder::Friday),
            "sábado" | "sabado" | "saturday" => Some(Folder::Saturday),
            _ => None,
        }
    }

    pub fn for_weekday(day: Weekday) -> Self {
        match day {
            Weekday::Sun => Folder::Sunday,
            Weekday::Mon => Folder::Monday,
            Weekday::Tue => Folder::Tuesday,
            Weekday::Wed => Folder::Wednesday,
            Weekday::Thu => Folder::Thursday,
            Weekday::Fri => Folder::Friday,
            Weekday::Sat => Folder::Saturday,
        }
    }

    /// Whether media in this folder plays on the given day.
    pub fn is_active_on(&self, day: Weekday) -> bool {
        *self == Folder::All || *self == Folder::for_weekday(day)
    }
}

impl std::fmt::Display for Folder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_active_every_day() {
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert!(Folder::All.is_active_on(day));
        }
    }

    #[test]
    fn test_weekday_folder_only_on_its_day() {
        assert!(Folder::Monday.is_active_on(Weekday::Mon));
        assert!(!Folder::Monday.is_active_on(Weekday::Tue));
        assert!(!Folder::Monday.is_active_on(Weekday::Sun));
    }

    #[test]
    fn test_parse_accepts_wire_names_and_aliases() {
        assert_eq!(Folder::parse("todos"), Some(Folder::All));
        assert_eq!(Folder::parse("ALL"), Some(Folder::All));
        assert_eq!(Folder::parse("terça"), Some(Folder::Tuesday));
        assert_eq!(Folder::parse("sabado"), Some(Folder::Saturday));
        assert_eq!(Folder::parse("someday"), None);
    }

    #[test]
    fn test_serde_wire_names() {
        let json = serde_json::to_string(&Folder::Saturday).unwrap();
        assert_eq!(json, "\"sábado\"");

        let parsed: Folder = serde_json::from_str("\"monday\"").unwrap();
        assert_eq!(parsed, Folder::Monday);
    }

    #[test]
    fn test_slugs_are_ascii() {
        for folder in Folder::EVERY {
            assert!(folder.slug().is_ascii(), "{} has a non-ASCII slug", folder);
        }
    }
}
