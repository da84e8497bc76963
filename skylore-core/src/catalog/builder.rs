///! Entry assembly and deterministic fallback synthesis
///!
///! `build_entry` turns a partial parse into a complete `CatalogueEntry`.
///! Every field a pattern failed to match is filled from a generator that
///! is a pure function of the entry slug: numeric placeholders come from a
///! xorshift PRNG seeded per field with an FNV-1a hash, text placeholders
///! are fixed templates naming the constellation. Harvesting the same
///! source text twice therefore produces byte-identical catalogues.

use super::parser::ParsedDetail;
use super::types::{
    Astronomy, CatalogueEntry, Hemisphere, Month, Narrative, NotableObject, Position, short_code,
    slugify,
};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(text: &str) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in text.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic PRNG for placeholder values. Seeded per `(slug, field)`
/// so one field being parsed never shifts the synthetic value of another.
struct FieldRng(u64);

impl FieldRng {
    fn new(slug: &str, field: &str) -> Self {
        // Guard against a zero state, which xorshift cannot leave.
        FieldRng((fnv1a(slug) ^ fnv1a(field)) | 1)
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn in_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn synth_object_count(slug: &str) -> u32 {
    20 + (FieldRng::new(slug, "object-count").next_u64() % 140) as u32
}

fn synth_coverage_area(slug: &str) -> f64 {
    round1(FieldRng::new(slug, "coverage-area").in_range(80.0, 980.0))
}

fn synth_declination(slug: &str) -> f64 {
    round1(FieldRng::new(slug, "declination").in_range(-75.0, 75.0))
}

fn synth_right_ascension(slug: &str) -> f64 {
    round1(FieldRng::new(slug, "right-ascension").in_range(0.0, 24.0))
}

fn synth_seasonal_peak(slug: &str) -> Month {
    Month::from_number((FieldRng::new(slug, "seasonal-peak").next_u64() % 12) as u32 + 1)
}

const SYNTH_OBJECT_KINDS: [&str; 3] = ["main-sequence star", "giant star", "binary system"];
const SYNTH_OBJECT_PREFIXES: [&str; 3] = ["Alpha", "Beta", "Gamma"];

/// Placeholder star list in the classical Bayer naming style.
fn synth_notable_objects(slug: &str, display_name: &str) -> Vec<NotableObject> {
    let mut rng = FieldRng::new(slug, "notable-objects");
    SYNTH_OBJECT_PREFIXES
        .iter()
        .enumerate()
        .map(|(i, prefix)| NotableObject {
            name: format!("{} {}", prefix, display_name),
            magnitude: round1(rng.in_range(1.5, 5.5)),
            kind: SYNTH_OBJECT_KINDS[i].to_string(),
            distance: (rng.in_range(40.0, 1800.0)).round(),
        })
        .collect()
}

/// Fill magnitude/distance for objects whose names were actually parsed.
fn complete_parsed_objects(slug: &str, names: Vec<String>) -> Vec<NotableObject> {
    let mut rng = FieldRng::new(slug, "parsed-objects");
    names
        .into_iter()
        .map(|name| NotableObject {
            name,
            magnitude: round1(rng.in_range(1.0, 9.0)),
            kind: "deep-sky object".to_string(),
            distance: (rng.in_range(100.0, 20_000.0)).round(),
        })
        .collect()
}

/// Assemble a complete entry from whatever the parser found, synthesizing
/// the rest. Field order of the synthetic draws is irrelevant because each
/// generator carries its own seed.
pub fn build_entry(display_name: &str, parsed: ParsedDetail) -> CatalogueEntry {
    let id = slugify(display_name);

    let declination_deg = parsed
        .declination_deg
        .unwrap_or_else(|| synth_declination(&id));
    let right_ascension_hours = parsed
        .right_ascension_hours
        .unwrap_or_else(|| synth_right_ascension(&id));

    let narrative = Narrative {
        origin_culture: parsed
            .origin_culture
            .unwrap_or_else(|| "Classical antiquity".to_string()),
        story: parsed.story.unwrap_or_else(|| {
            format!(
                "{} has been traced by observers since antiquity; its brightest \
                 stars form a figure that early astronomers wove into the sky \
                 lore passed down through generations.",
                display_name
            )
        }),
        meaning: parsed
            .meaning
            .unwrap_or_else(|| format!("the celestial figure {}", display_name)),
        related_figures: parsed
            .related_figures
            .unwrap_or_else(|| vec!["Ptolemy".to_string()]),
    };

    let astronomy = Astronomy {
        reference_object_name: parsed
            .reference_object_name
            .unwrap_or_else(|| format!("Alpha {}", display_name)),
        object_count: parsed.object_count.unwrap_or_else(|| synth_object_count(&id)),
        coverage_area: parsed
            .coverage_area
            .unwrap_or_else(|| synth_coverage_area(&id)),
        // When no pattern named a hemisphere, classify from declination,
        // synthetic or not.
        hemisphere: parsed
            .hemisphere
            .unwrap_or_else(|| Hemisphere::from_declination(declination_deg)),
        seasonal_peak: parsed
            .seasonal_peak
            .unwrap_or_else(|| synth_seasonal_peak(&id)),
        declination_deg,
    };

    let notable_objects = match parsed.notable_objects {
        Some(names) => complete_parsed_objects(&id, names),
        None => synth_notable_objects(&id, display_name),
    };

    CatalogueEntry {
        short_code: short_code(display_name),
        canonical_name: parsed
            .canonical_name
            .unwrap_or_else(|| display_name.to_string()),
        display_name: display_name.to_string(),
        narrative,
        astronomy,
        position: Position {
            right_ascension_hours,
            declination_deg,
        },
        notable_objects,
        // Media URLs are best-effort: empty string, never null on the wire.
        image_url: parsed.image_url.unwrap_or_default(),
        detail_chart_url: parsed.detail_chart_url.unwrap_or_default(),
        id,
    }
}
