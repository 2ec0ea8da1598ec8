//! Media payloads exchanged with the backend API.
//!
//! Only the fields the functional tests read or write are modelled.
//! Elements the backend adds that are not listed here are skipped when
//! reading, so changes to existing objects go through [`crate::xml`]
//! edits of the raw document or the targeted endpoints instead of posting
//! a model read back from the backend.

mod search;
mod streaming;
mod update;

pub use search::{InstantRange, MediaForm, MediaPager, TitleForm};
pub use streaming::StreamingStatus;
pub use update::{
    AvAttributes, ImageLocation, ImageUpdate, Images, LocationUpdate, Locations, ProgramUpdate,
    SegmentUpdate, Segments, Title,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const UPDATE_NAMESPACE: &str = "urn:vpro:media:update:2009";
pub const SEARCH_NAMESPACE: &str = "urn:vpro:media:search:2012";
pub const NOTIFY_NAMESPACE: &str = "urn:vpro:media:notify:2017";

/// The broadcaster the functional tests create their content for.
pub const VPRO: &str = "VPRO";

/// Child elements of an update `<program>` in the order the schema requires.
pub const PROGRAM_ELEMENTS: &[&str] = &[
    "crid",
    "broadcaster",
    "portal",
    "exclusive",
    "region",
    "title",
    "description",
    "tag",
    "country",
    "language",
    "genre",
    "intentions",
    "targetGroups",
    "geoLocations",
    "topics",
    "avAttributes",
    "releaseYear",
    "duration",
    "credits",
    "memberOf",
    "ageRating",
    "contentRating",
    "email",
    "website",
    "twitter",
    "prediction",
    "locations",
    "scheduleEvents",
    "relation",
    "images",
    "asset",
    "episodeOf",
    "segments",
];

/// The program elements that must come after `name`.
pub fn program_elements_after(name: &str) -> &'static [&'static str] {
    match PROGRAM_ELEMENTS.iter().position(|element| *element == name) {
        Some(index) => &PROGRAM_ELEMENTS[index + 1..],
        None => &[],
    }
}

/// Enumerations of the media schema. A value not listed is kept as `Other`,
/// so a document read from the backend can be written back unchanged.
macro_rules! schema_enum {
    ($name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $value,)+
                    $name::Other(value) => value,
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $($value => $name::$variant,)+
                    other => $name::Other(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Ok($name::from(value.trim()))
            }
        }
    };
}

schema_enum!(ProgramType {
    Broadcast => "BROADCAST",
    Clip => "CLIP",
    Strand => "STRAND",
    Trailer => "TRAILER",
    Movie => "MOVIE",
    Podcast => "PODCAST",
});

schema_enum!(SegmentType {
    Segment => "SEGMENT",
    Visualradiosegment => "VISUALRADIOSEGMENT",
});

schema_enum!(AvType {
    Audio => "AUDIO",
    Video => "VIDEO",
    Mixed => "MIXED",
});

schema_enum!(AgeRating {
    Six => "6",
    Nine => "9",
    Twelve => "12",
    Fourteen => "14",
    Sixteen => "16",
    Eighteen => "18",
    All => "ALL",
});

schema_enum!(TitleType {
    Main => "MAIN",
    Sub => "SUB",
    Short => "SHORT",
    Abbreviation => "ABBREVIATION",
    Work => "WORK",
    Original => "ORIGINAL",
    Lexico => "LEXICO",
});

schema_enum!(ImageType {
    Picture => "PICTURE",
    Portrait => "PORTRAIT",
    Still => "STILL",
    Logo => "LOGO",
    Icon => "ICON",
});

schema_enum!(License {
    Copyrighted => "COPYRIGHTED",
    CcBy => "CC_BY",
    CcBySa => "CC_BY_SA",
    PublicDomain => "PUBLIC_DOMAIN",
});

schema_enum!(AvFileFormat {
    Mp3 => "MP3",
    M4v => "M4V",
    H264 => "H264",
    Mp4 => "MP4",
    Hasp => "HASP",
    Unknown => "UNKNOWN",
});

/// ISO-8601 durations as the backend writes them: `P0DT0H1M10.000S`.
pub(crate) mod iso_duration {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    const DATE_UNITS: &[(char, f64)] = &[('D', 86_400_000.0)];
    const TIME_UNITS: &[(char, f64)] = &[('H', 3_600_000.0), ('M', 60_000.0), ('S', 1000.0)];

    pub fn format(duration: &Duration) -> String {
        let total = duration.as_secs();
        format!(
            "P{}DT{}H{}M{}.{:03}S",
            total / 86_400,
            (total % 86_400) / 3600,
            (total % 3600) / 60,
            total % 60,
            duration.subsec_millis()
        )
    }

    pub fn parse(text: &str) -> Option<Duration> {
        let rest = text.trim().strip_prefix('P')?;
        let (date, time) = match rest.split_once('T') {
            Some((date, time)) => (date, time),
            None => (rest, ""),
        };
        let mut millis: f64 = 0.0;
        for (part, units) in [(date, DATE_UNITS), (time, TIME_UNITS)] {
            let mut number = String::new();
            for c in part.chars() {
                if c.is_ascii_digit() || c == '.' {
                    number.push(c);
                    continue;
                }
                let factor = units.iter().find(|(unit, _)| *unit == c)?.1;
                millis += number.parse::<f64>().ok()? * factor;
                number.clear();
            }
            if !number.is_empty() {
                return None;
            }
        }
        Some(Duration::from_millis(millis.round() as u64))
    }

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| de::Error::custom(format!("Invalid duration: {}", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_unknown_schema_values_are_kept() {
        assert_eq!(TitleType::from("EPISODE"), TitleType::Other("EPISODE".to_string()));
        assert_eq!(TitleType::Other("EPISODE".to_string()).as_str(), "EPISODE");
        assert_eq!(ImageType::from("BACKGROUND").to_string(), "BACKGROUND");
        assert_eq!(AgeRating::from("ALL"), AgeRating::All);
        assert_eq!(License::from("CC_BY_SA"), License::CcBySa);
    }

    #[test]
    fn test_program_elements_after() {
        assert_eq!(program_elements_after("episodeOf"), &["segments"]);
        assert_eq!(program_elements_after("region")[0], "title");
        assert!(program_elements_after("images").contains(&"segments"));
        assert!(!program_elements_after("images").contains(&"locations"));
        assert!(program_elements_after("segments").is_empty());
        assert!(program_elements_after("unknown").is_empty());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(iso_duration::format(&Duration::from_secs(70)), "P0DT0H1M10.000S");
        assert_eq!(
            iso_duration::format(&Duration::from_millis(90_061_500)),
            "P1DT1H1M1.500S"
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(iso_duration::parse("P0DT0H1M10.000S"), Some(Duration::from_secs(70)));
        assert_eq!(iso_duration::parse("PT1H"), Some(Duration::from_secs(3600)));
        assert_eq!(iso_duration::parse("P2D"), Some(Duration::from_secs(172_800)));
        assert_eq!(iso_duration::parse("1M10S"), None);
        assert_eq!(iso_duration::parse("PT1X"), None);
    }
}
