///! Core catalogue data structures
///!
///! One `CatalogueEntry` per constellation. Every numeric and enum field
///! is always populated: either parsed from source text or filled by the
///! deterministic generators in `builder`. Consumers never see a missing
///! value.

use serde::{Deserialize, Serialize};

/// One harvested constellation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueEntry {
    /// Stable slug derived from `display_name` (see [`slugify`]).
    pub id: String,
    pub display_name: String,
    /// Latin/IAU name when parsed, otherwise `display_name`.
    pub canonical_name: String,
    /// Three-letter abbreviation, e.g. "AND" for Andromeda.
    pub short_code: String,
    pub narrative: Narrative,
    pub astronomy: Astronomy,
    pub position: Position,
    pub notable_objects: Vec<NotableObject>,
    /// Empty string when no image was found, never null on the wire.
    pub image_url: String,
    pub detail_chart_url: String,
}

/// Mythology and naming background for one constellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narrative {
    pub origin_culture: String,
    pub story: String,
    pub meaning: String,
    pub related_figures: Vec<String>,
}

/// Observational reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Astronomy {
    /// Usually the brightest star of the constellation.
    pub reference_object_name: String,
    pub object_count: u32,
    /// Sky coverage in square degrees.
    pub coverage_area: f64,
    pub hemisphere: Hemisphere,
    pub seasonal_peak: Month,
    pub declination_deg: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub right_ascension_hours: f64,
    pub declination_deg: f64,
}

/// A bright star or deep-sky object inside a constellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotableObject {
    pub name: String,
    pub magnitude: f64,
    pub kind: String,
    /// Distance from Earth in light-years.
    pub distance: f64,
}

/// Coarse visibility classification, used as a cheap pre-filter before
/// the altitude computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    Northern,
    Southern,
    Both,
}

impl Hemisphere {
    /// Classify from declination. Constellations straddling the celestial
    /// equator (|dec| < 25) count as visible from both hemispheres.
    pub fn from_declination(declination_deg: f64) -> Self {
        if declination_deg >= 25.0 {
            Hemisphere::Northern
        } else if declination_deg <= -25.0 {
            Hemisphere::Southern
        } else {
            Hemisphere::Both
        }
    }
}

/// Calendar month, kept as its own enum so seasonal-peak values serialize
/// as readable month names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

impl Month {
    /// 1-based month number, January = 1.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    /// Build from a 1-based month number, wrapping out-of-range input.
    pub fn from_number(n: u32) -> Self {
        MONTHS[((n.max(1) - 1) % 12) as usize]
    }

    /// Parse an English month name or its three-letter prefix.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        if lower.len() < 3 {
            return None;
        }
        MONTHS
            .iter()
            .copied()
            .find(|m| m.name().to_lowercase().starts_with(&lower) || lower.starts_with(&m.name().to_lowercase()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Distance in months around the calendar circle, always 0..=6.
    pub fn circular_distance(self, other: Month) -> u32 {
        let a = self.number() as i32;
        let b = other.number() as i32;
        let diff = (a - b).unsigned_abs();
        diff.min(12 - diff)
    }
}

/// Derive the stable entry id from a display name: lowercase, runs of
/// non-alphanumeric characters collapsed to single hyphens, no leading or
/// trailing hyphen. Pure and idempotent.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Three-letter uppercase abbreviation; names of three characters or
/// fewer are used whole.
pub fn short_code(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.chars().count() <= 3 {
        trimmed.to_uppercase()
    } else {
        trimmed
            .chars()
            .filter(|c| c.is_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Ursa Major"), "ursa-major");
        assert_eq!(slugify("Canes Venatici"), "canes-venatici");
        assert_eq!(slugify("Corona   Borealis!"), "corona-borealis");
        assert_eq!(slugify("--Lyra--"), "lyra");
    }

    #[test]
    fn test_slugify_idempotent() {
        for name in ["Ursa Major", "Boötes", "Canis Minor", "  Crux "] {
            let once = slugify(name);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn test_slugify_shape() {
        // ^[a-z0-9]+(-[a-z0-9]+)*$
        for name in ["Ursa Major", "Boötes", "47 Tucanae!!", "a---b"] {
            let slug = slugify(name);
            assert!(!slug.is_empty());
            assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            assert!(!slug.contains("--"));
            assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        }
    }

    #[test]
    fn test_short_code() {
        assert_eq!(short_code("Andromeda"), "AND");
        assert_eq!(short_code("Ursa Major"), "URS");
        assert_eq!(short_code("Ara"), "ARA");
        assert_eq!(short_code("Leo"), "LEO");
    }

    #[test]
    fn test_hemisphere_from_declination() {
        assert_eq!(Hemisphere::from_declination(45.0), Hemisphere::Northern);
        assert_eq!(Hemisphere::from_declination(-60.0), Hemisphere::Southern);
        assert_eq!(Hemisphere::from_declination(0.0), Hemisphere::Both);
        assert_eq!(Hemisphere::from_declination(-10.0), Hemisphere::Both);
    }

    #[test]
    fn test_month_circular_distance() {
        assert_eq!(Month::June.circular_distance(Month::June), 0);
        assert_eq!(Month::January.circular_distance(Month::December), 1);
        assert_eq!(Month::January.circular_distance(Month::July), 6);
        assert_eq!(Month::October.circular_distance(Month::February), 4);
    }

    #[test]
    fn test_month_from_name() {
        assert_eq!(Month::from_name("June"), Some(Month::June));
        assert_eq!(Month::from_name("jan"), Some(Month::January));
        assert_eq!(Month::from_name("SEPTEMBER"), Some(Month::September));
        assert_eq!(Month::from_name("notamonth"), None);
    }

    #[test]
    fn test_month_serializes_lowercase() {
        let json = serde_json::to_string(&Month::June).unwrap();
        assert_eq!(json, "\"june\"");
    }
}
