///! Detail-page parser
///!
///! Extracts per-constellation fields from a detail page body. Every field
///! has an ordered list of candidate patterns; the first in-range capture
///! wins and unmatched fields stay `None`. Synthesis of missing values
///! happens later, in `builder`, so "actually found" stays distinguishable
///! from "made up" until assembly.

use regex::Regex;
use std::sync::LazyLock;

use super::sources::{CatalogSource, decode_entities, resolve_url};
use super::types::{Hemisphere, Month};

/// Partial extraction result; `None` means no pattern matched.
#[derive(Debug, Default, Clone)]
pub struct ParsedDetail {
    pub canonical_name: Option<String>,
    pub origin_culture: Option<String>,
    pub story: Option<String>,
    pub meaning: Option<String>,
    pub related_figures: Option<Vec<String>>,
    pub reference_object_name: Option<String>,
    pub object_count: Option<u32>,
    pub coverage_area: Option<f64>,
    pub hemisphere: Option<Hemisphere>,
    pub seasonal_peak: Option<Month>,
    pub declination_deg: Option<f64>,
    pub right_ascension_hours: Option<f64>,
    /// Names of parsed deep-sky objects; magnitudes and distances are
    /// filled at assembly.
    pub notable_objects: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub detail_chart_url: Option<String>,
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p.as_ref()).expect("valid extraction pattern"))
        .collect()
}

// Candidate patterns, most specific first. Both sources run the same
// chains; the handful of source-specific cases (images) branch below.

static CANONICAL_NAME: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)latin name\s*:?\s*(?:<[^>]+>\s*)*([A-Z][A-Za-z ]{2,40}?)\s*<",
        r"(?i)<h1[^>]*>([A-Z][A-Za-z ]{2,40}?)(?:\s+Constellation)?\s*</h1>",
        r"(?i)<title>([A-Z][A-Za-z ]{2,40}?)(?:\s+Constellation)?\s*[|<-]",
    ])
});

static ORIGIN_CULTURE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)catalogued[^.<]{0,80}?by the (Greek|Roman|Babylonian|Egyptian|Chinese|Arabic|Polynesian|Sumerian) astronomer",
        r"(?i)\b(Greek|Roman|Babylonian|Egyptian|Chinese|Arabic|Polynesian|Sumerian)\s+(?:mythology|tradition|origin|astronomers)",
    ])
});

static MEANING: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)meaning\s*:?\s*(?:<[^>]+>\s*)*(?:the\s+)?([A-Za-z][^<.,;|]{2,60}?)\s*[<.,;|]",
        r"(?i)(?:name means|means|represents|depicts|is named after)\s+(?:the\s+)?([A-Za-z][^.<;]{2,80}?)[.<;]",
    ])
});

static STORY_MYTH: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)(?:in (?:greek |roman )?mythology,?\s+)([^<]{80,600})",
    ])
});

static STORY_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p[^>]*>([^<]{120,600})</p>").expect("valid paragraph pattern"));

static RELATED_FIGURES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)associated with\s+([A-Z][^.<;]{2,120}?)[.<;]",
        r"(?i)(?:daughter|son|wife|husband|mother|father) of\s+([A-Z][A-Za-z]+(?:\s+and\s+[A-Z][A-Za-z]+)?)",
    ])
});

static REFERENCE_OBJECT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)brightest star\s*:?\s*(?:<[^>]+>\s*)*([A-Z][A-Za-z0-9' -]{1,40}?)\s*[,(<.]",
        r"(?i)brightest star in [^.<]{0,60}? is\s+([A-Z][A-Za-z0-9' -]{1,40}?)\s*[,(<.]",
    ])
});

static OBJECT_COUNT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)main stars\s*:?\s*(?:<[^>]+>\s*)*(\d{1,3})",
        r"(?i)contains\s+(?:about\s+|around\s+)?(\d{1,5})\s+stars",
        r"(?i)(\d{1,5})\s+stars?\s+(?:brighter|visible|with)",
    ])
});

static COVERAGE_AREA: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)area\s*(?:of)?\s*:?\s*(?:<[^>]+>\s*)*(\d{1,4}(?:\.\d+)?)\s*(?:square degrees|sq\.?\s*deg)",
        r"(?i)occupies an area of\s+(\d{1,4}(?:\.\d+)?)\s+square degrees",
        r"(?i)(\d{1,4}(?:\.\d+)?)\s*(?:square degrees|sq\.?\s*deg)",
    ])
});

static HEMISPHERE_NAMED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)(northern|southern)\s+(?:celestial\s+)?(?:hemisphere|sky)",
    ])
});

static HEMISPHERE_BOTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:visible from|seen from|in) both hemispheres").expect("valid hemisphere pattern")
});

static MONTH_NAME: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

static SEASONAL_PEAK: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        &format!(r"(?i)best (?:seen|viewed|visible|observed)[^.<]{{0,60}}?\b({MONTH_NAME})\b"),
        &format!(r"(?i)best viewed\s*:?\s*(?:<[^>]+>\s*)*({MONTH_NAME})"),
        &format!(r"(?i)culminat[^.<]{{0,60}}?\b({MONTH_NAME})\b"),
    ])
});

static DECLINATION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)declination\s*:?\s*(?:<[^>]+>\s*)*([+-]?\d{1,2}(?:\.\d+)?)",
        r"(?i)\bdec\.?\s*:?\s*([+-]?\d{1,2}(?:\.\d+)?)\s*°",
    ])
});

static RIGHT_ASCENSION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)right ascension\s*:?\s*(?:<[^>]+>\s*)*(\d{1,2}(?:\.\d+)?)\s*h",
        r"(?i)\bRA\s*:?\s*(\d{1,2}(?:\.\d+)?)\s*h",
    ])
});

static NOTABLE_OBJECTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        // Messier designations with a common name, e.g. "M31 (Andromeda Galaxy)"
        r"\b(M\s?\d{1,3}\s*\(([^)<]{3,40})\))",
        // "the Orion Nebula", "the Double Cluster"
        r"(?i)the ([A-Z][A-Za-z]+ (?:Nebula|Cluster|Galaxy))",
    ])
});

static IMAGE_PRIMARY: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r#"(?i)<img[^>]+src="([^"]*constellation[^"]*\.(?:jpg|jpeg|png|gif))""#,
        r#"(?i)<img[^>]+src="([^"]+\.(?:jpg|jpeg|png))""#,
    ])
});

static IMAGE_BACKUP: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r#"(?i)<img[^>]+src="([^"]*wp-content/uploads[^"]*\.(?:jpg|jpeg|png|gif))""#,
        r#"(?i)<img[^>]+src="([^"]+\.(?:jpg|jpeg|png))""#,
    ])
});

static CHART: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r#"(?i)<img[^>]+src="([^"]*(?:chart|map|iau)[^"]*\.(?:jpg|jpeg|png|gif))""#,
        r#"(?i)<a[^>]+href="([^"]*(?:chart|map)[^"]*\.(?:jpg|jpeg|png|pdf))""#,
    ])
});

/// First capture of the first matching pattern, entity-decoded and
/// whitespace-normalized.
fn first_capture(body: &str, patterns: &[Regex]) -> Option<String> {
    for re in patterns {
        if let Some(caps) = re.captures(body) {
            if let Some(m) = caps.get(1) {
                let text = decode_entities(m.as_str());
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// First capture parsing to an `f64` inside `[lo, hi]`; out-of-range
/// captures are treated as non-matches and the chain continues.
fn first_f64_in(body: &str, patterns: &[Regex], lo: f64, hi: f64) -> Option<f64> {
    for re in patterns {
        for caps in re.captures_iter(body) {
            if let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                if value >= lo && value <= hi {
                    return Some(value);
                }
            }
        }
    }
    None
}

fn first_u32_in(body: &str, patterns: &[Regex], lo: u32, hi: u32) -> Option<u32> {
    for re in patterns {
        for caps in re.captures_iter(body) {
            if let Some(value) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                if value >= lo && value <= hi {
                    return Some(value);
                }
            }
        }
    }
    None
}

fn parse_hemisphere(body: &str) -> Option<Hemisphere> {
    if HEMISPHERE_BOTH.is_match(body) {
        return Some(Hemisphere::Both);
    }
    match first_capture(body, &HEMISPHERE_NAMED)?.to_lowercase().as_str() {
        "northern" => Some(Hemisphere::Northern),
        "southern" => Some(Hemisphere::Southern),
        _ => None,
    }
}

/// Prefer the mythology sentence; otherwise the first long paragraph, with
/// a bias towards one that mentions the constellation by name.
fn parse_story(body: &str, display_name: &str) -> Option<String> {
    if let Some(story) = first_capture(body, &STORY_MYTH) {
        return Some(story);
    }

    let mut fallback = None;
    for caps in STORY_PARAGRAPH.captures_iter(body) {
        let text = decode_entities(caps[1].trim());
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.contains(display_name) {
            return Some(text);
        }
        if fallback.is_none() {
            fallback = Some(text);
        }
    }
    fallback
}

/// Split "Cepheus and Cassiopeia" / "Perseus, Zeus" style captures into
/// individual figures, keeping at most four.
fn split_figures(raw: &str) -> Vec<String> {
    raw.split(|c| c == ',' || c == ';')
        .flat_map(|part| part.split(" and "))
        .map(|s| s.trim().trim_end_matches('.').to_string())
        .filter(|s| !s.is_empty() && s.len() <= 40)
        .take(4)
        .collect()
}

fn parse_notable_objects(body: &str) -> Option<Vec<String>> {
    let mut names = Vec::new();
    for re in NOTABLE_OBJECTS.iter() {
        for caps in re.captures_iter(body) {
            let name = decode_entities(caps[1].trim());
            let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
            if !names.contains(&name) {
                names.push(name);
            }
            if names.len() >= 5 {
                break;
            }
        }
        if !names.is_empty() {
            break;
        }
    }
    if names.is_empty() { None } else { Some(names) }
}

fn parse_image(body: &str, source: CatalogSource) -> Option<String> {
    let patterns: &[Regex] = match source {
        CatalogSource::Primary => &IMAGE_PRIMARY,
        CatalogSource::Backup => &IMAGE_BACKUP,
    };
    first_capture(body, patterns).map(|href| resolve_url(source.base_url(), &href))
}

/// Run every field chain over one detail page body.
pub fn parse_detail(body: &str, display_name: &str, source: CatalogSource) -> ParsedDetail {
    let reference_object_name = first_capture(body, &REFERENCE_OBJECT)
        // A capture that just repeats the constellation name is page
        // boilerplate, not a star name.
        .filter(|name| name.as_str() != display_name);

    ParsedDetail {
        canonical_name: first_capture(body, &CANONICAL_NAME),
        origin_culture: first_capture(body, &ORIGIN_CULTURE),
        story: parse_story(body, display_name),
        meaning: first_capture(body, &MEANING),
        related_figures: first_capture(body, &RELATED_FIGURES)
            .map(|raw| split_figures(&raw))
            .filter(|figures| !figures.is_empty()),
        reference_object_name,
        object_count: first_u32_in(body, &OBJECT_COUNT, 1, 100_000),
        coverage_area: first_f64_in(body, &COVERAGE_AREA, 0.5, 1400.0),
        hemisphere: parse_hemisphere(body),
        seasonal_peak: first_capture(body, &SEASONAL_PEAK).and_then(|m| Month::from_name(&m)),
        declination_deg: first_f64_in(body, &DECLINATION, -90.0, 90.0),
        right_ascension_hours: first_f64_in(body, &RIGHT_ASCENSION, 0.0, 24.0),
        notable_objects: parse_notable_objects(body),
        image_url: parse_image(body, source),
        detail_chart_url: first_capture(body, &CHART).map(|href| resolve_url(source.base_url(), &href)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><head><title>Andromeda Constellation | Sky Guide</title></head>
        <body>
        <h1>Andromeda</h1>
        <p>Andromeda constellation lies in the northern sky. It occupies an
        area of 722 square degrees and is one of the 48 constellations first
        catalogued in the 2nd century by the Greek astronomer Ptolemy. The
        constellation is best seen in November evenings from mid-northern
        latitudes and it contains about 152 stars visible to the naked eye.</p>
        <p>In mythology, Andromeda was the daughter of Cepheus and Cassiopeia,
        chained to a rock as a sacrifice to the sea monster Cetus before
        Perseus came to her rescue, which is why the figure is also known as
        the Chained Maiden.</p>
        <table>
        <tr><td>Brightest star: Alpheratz (Alpha Andromedae)</td></tr>
        <tr><td>Declination: 37.4</td></tr>
        <tr><td>Right ascension: 0.8h</td></tr>
        <tr><td>Main stars: 16</td></tr>
        </table>
        <p>Deep sky observers know it for M31 (Andromeda Galaxy), the nearest
        major galaxy to our own.</p>
        <img src="/wp-content/uploads/andromeda-constellation.jpg" alt="Andromeda">
        <img src="/images/andromeda-chart.png" alt="chart">
        </body></html>"#;

    #[test]
    fn test_parse_numeric_fields() {
        let parsed = parse_detail(SAMPLE, "Andromeda", CatalogSource::Backup);
        assert_eq!(parsed.coverage_area, Some(722.0));
        assert_eq!(parsed.object_count, Some(16));
        assert_eq!(parsed.declination_deg, Some(37.4));
        assert_eq!(parsed.right_ascension_hours, Some(0.8));
    }

    #[test]
    fn test_parse_text_fields() {
        let parsed = parse_detail(SAMPLE, "Andromeda", CatalogSource::Backup);
        assert_eq!(parsed.origin_culture.as_deref(), Some("Greek"));
        assert_eq!(parsed.hemisphere, Some(Hemisphere::Northern));
        assert_eq!(parsed.seasonal_peak, Some(Month::November));
        assert_eq!(parsed.reference_object_name.as_deref(), Some("Alpheratz"));
        let story = parsed.story.expect("story parsed");
        assert!(story.contains("Andromeda was the daughter"));
        let figures = parsed.related_figures.expect("figures parsed");
        assert_eq!(figures, vec!["Cepheus", "Cassiopeia"]);
    }

    #[test]
    fn test_parse_media_fields() {
        let parsed = parse_detail(SAMPLE, "Andromeda", CatalogSource::Backup);
        assert_eq!(
            parsed.image_url.as_deref(),
            Some("https://www.constellation-guide.com/wp-content/uploads/andromeda-constellation.jpg")
        );
        assert_eq!(
            parsed.detail_chart_url.as_deref(),
            Some("https://www.constellation-guide.com/images/andromeda-chart.png")
        );
        let objects = parsed.notable_objects.expect("objects parsed");
        assert!(objects[0].starts_with("M31"));
    }

    #[test]
    fn test_unmatched_fields_stay_none() {
        let parsed = parse_detail("<html><body>nothing here</body></html>", "Lyra", CatalogSource::Primary);
        assert!(parsed.coverage_area.is_none());
        assert!(parsed.declination_deg.is_none());
        assert!(parsed.story.is_none());
        assert!(parsed.notable_objects.is_none());
        assert!(parsed.image_url.is_none());
    }

    #[test]
    fn test_out_of_range_capture_is_discarded() {
        // 95 degrees declination is impossible; the chain must not accept it.
        let body = "<p>Declination: 95</p>";
        let parsed = parse_detail(body, "Fake", CatalogSource::Primary);
        assert!(parsed.declination_deg.is_none());
    }
}
