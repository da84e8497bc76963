///! Visibility calculator
///!
///! A deliberately simplified sky model, not an ephemeris engine: coarse
///! hemisphere and altitude-at-transit filters, a seasonal window around
///! each constellation's peak month, and a single "night" gate on the
///! observer's local hour. Defensive defaults everywhere; this module
///! never fails.

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::f64::consts::TAU;

use crate::catalog::{CatalogueEntry, Hemisphere, Month};
use super::types::{MoonPhase, VisibilityReport};

/// Mean synodic month, in days.
const LUNAR_CYCLE_DAYS: f64 = 29.5;

/// Maximum distance from the seasonal peak, in months, for an entry to
/// still count as in season.
const SEASONAL_WINDOW_MONTHS: u32 = 3;

/// Which subset of the catalogue is plausibly visible from `(lat, lon)`
/// at the given observer-local time.
///
/// Longitude is accepted for interface parity; the heuristic depends on
/// latitude and local time alone. Non-finite or out-of-range coordinates
/// are clamped rather than rejected, and an empty catalogue produces a
/// neutral report with no visible entries.
pub fn compute_visibility(
    catalogue: &[CatalogueEntry],
    lat: f64,
    _lon: f64,
    now_local: NaiveDateTime,
) -> VisibilityReport {
    let lat = sanitize_latitude(lat);
    let hour = now_local.hour();
    let month = Month::from_number(now_local.month());

    if catalogue.is_empty() {
        return neutral_report();
    }

    let visible_ids = visible_entries(catalogue, lat, month, hour);

    let cycle_position = (now_local.ordinal() as f64 % LUNAR_CYCLE_DAYS) / LUNAR_CYCLE_DAYS;
    let moon_phase_label = MoonPhase::from_cycle_position(cycle_position);
    let moon_illumination_pct = illumination_pct(cycle_position);

    VisibilityReport {
        visible_ids,
        moon_phase_label,
        moon_illumination_pct,
        best_viewing_window: viewing_window(lat, month).to_string(),
        conditions_note: conditions_note(moon_illumination_pct, hour),
    }
}

fn sanitize_latitude(lat: f64) -> f64 {
    if lat.is_finite() {
        lat.clamp(-90.0, 90.0)
    } else {
        0.0
    }
}

/// Night gate plus the three per-entry filters; survivors sorted by how
/// close the constellation passes to the observer's zenith.
fn visible_entries(catalogue: &[CatalogueEntry], lat: f64, month: Month, hour: u32) -> Vec<String> {
    if !is_night(hour) {
        return Vec::new();
    }

    let mut candidates: Vec<(&CatalogueEntry, f64)> = Vec::new();
    for entry in catalogue {
        match entry.astronomy.hemisphere {
            Hemisphere::Northern if lat < -30.0 => continue,
            Hemisphere::Southern if lat > 30.0 => continue,
            _ => {}
        }

        // Highest elevation the entry ever reaches at this latitude;
        // below zero means it never clears the horizon.
        let altitude_at_transit = 90.0 - (lat - entry.position.declination_deg).abs();
        if altitude_at_transit < 0.0 {
            continue;
        }

        if month.circular_distance(entry.astronomy.seasonal_peak) > SEASONAL_WINDOW_MONTHS {
            continue;
        }

        candidates.push((entry, (entry.position.declination_deg - lat).abs()));
    }

    // Stable sort: equal offsets keep catalogue (discovery) order.
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    candidates.into_iter().map(|(entry, _)| entry.id.clone()).collect()
}

/// Simplified night window: before 06:00 or after 18:00 local.
fn is_night(hour: u32) -> bool {
    hour < 6 || hour > 18
}

fn illumination_pct(cycle_position: f64) -> u8 {
    let pct = 50.0 + 50.0 * (TAU * cycle_position).cos();
    pct.clamp(0.0, 100.0).round() as u8
}

/// Meteorological season of the northern calendar; the southern latitude
/// band below carries the flipped rows.
#[derive(Clone, Copy, PartialEq)]
enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

fn season_of(month: Month) -> Season {
    match month {
        Month::December | Month::January | Month::February => Season::Winter,
        Month::March | Month::April | Month::May => Season::Spring,
        Month::June | Month::July | Month::August => Season::Summer,
        Month::September | Month::October | Month::November => Season::Autumn,
    }
}

/// Fixed clock-range table keyed by latitude band and season. The ranges
/// track how long full darkness lasts, nothing more precise than that.
fn viewing_window(lat: f64, month: Month) -> &'static str {
    let season = season_of(month);
    if lat >= 55.0 {
        match season {
            Season::Winter => "16:30-08:00",
            Season::Spring => "21:30-03:30",
            Season::Summer => "23:30-01:30",
            Season::Autumn => "19:00-05:30",
        }
    } else if lat >= 23.0 {
        match season {
            Season::Winter => "18:00-06:30",
            Season::Spring => "20:30-04:30",
            Season::Summer => "21:30-04:00",
            Season::Autumn => "19:30-05:00",
        }
    } else if lat > -23.0 {
        match season {
            Season::Winter => "18:30-05:30",
            _ => "19:00-05:00",
        }
    } else {
        match season {
            Season::Winter => "21:00-04:30",
            Season::Spring => "19:30-05:00",
            Season::Summer => "18:00-06:30",
            Season::Autumn => "20:00-04:30",
        }
    }
}

/// Moonlight tier plus whether the hour falls in the 22:00-03:00 band
/// where most catalogued figures transit.
fn conditions_note(illumination_pct: u8, hour: u32) -> String {
    let tier = if illumination_pct < 25 {
        "excellent dark skies"
    } else if illumination_pct < 60 {
        "good viewing conditions"
    } else {
        "bright moon affects visibility"
    };

    let timing = if hour >= 22 || hour < 3 {
        "currently inside the optimal 22:00-03:00 band"
    } else {
        "outside the optimal 22:00-03:00 band"
    };

    format!("{}; {}", tier, timing)
}

fn neutral_report() -> VisibilityReport {
    VisibilityReport {
        visible_ids: Vec::new(),
        moon_phase_label: MoonPhase::FirstQuarter,
        moon_illumination_pct: 50,
        best_viewing_window: "20:00-05:00".to_string(),
        conditions_note: "catalogue unavailable; general stargazing guidance only".to_string(),
    }
}
