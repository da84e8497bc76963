///! Visibility result types

use serde::{Deserialize, Serialize};

/// The eight named lunar phases. The cycle position is anchored so that
/// position 0 is a full moon, which keeps the phase label consistent with
/// the cosine illumination approximation used by the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoonPhase {
    #[serde(rename = "Full Moon")]
    Full,
    #[serde(rename = "Waning Gibbous")]
    WaningGibbous,
    #[serde(rename = "Last Quarter")]
    LastQuarter,
    #[serde(rename = "Waning Crescent")]
    WaningCrescent,
    #[serde(rename = "New Moon")]
    New,
    #[serde(rename = "Waxing Crescent")]
    WaxingCrescent,
    #[serde(rename = "First Quarter")]
    FirstQuarter,
    #[serde(rename = "Waxing Gibbous")]
    WaxingGibbous,
}

const PHASE_ORDER: [MoonPhase; 8] = [
    MoonPhase::Full,
    MoonPhase::WaningGibbous,
    MoonPhase::LastQuarter,
    MoonPhase::WaningCrescent,
    MoonPhase::New,
    MoonPhase::WaxingCrescent,
    MoonPhase::FirstQuarter,
    MoonPhase::WaxingGibbous,
];

impl MoonPhase {
    /// Bucket a normalized cycle position `[0,1)` into one of the eight
    /// phases.
    pub fn from_cycle_position(position: f64) -> Self {
        let wrapped = position.rem_euclid(1.0);
        PHASE_ORDER[((wrapped * 8.0).floor() as usize) % 8]
    }

    pub fn label(self) -> &'static str {
        match self {
            MoonPhase::Full => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
            MoonPhase::New => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
        }
    }
}

/// What an observer at a given place and time can plausibly see.
/// Purely derived from the catalogue and the clock, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityReport {
    /// Catalogue entry slugs, best overhead match first.
    pub visible_ids: Vec<String>,
    pub moon_phase_label: MoonPhase,
    /// Approximate illuminated fraction, 0..=100.
    pub moon_illumination_pct: u8,
    /// Clock-time range like "21:30-04:00".
    pub best_viewing_window: String,
    pub conditions_note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_buckets_cover_cycle() {
        assert_eq!(MoonPhase::from_cycle_position(0.0), MoonPhase::Full);
        assert_eq!(MoonPhase::from_cycle_position(0.25), MoonPhase::LastQuarter);
        assert_eq!(MoonPhase::from_cycle_position(0.5), MoonPhase::New);
        assert_eq!(MoonPhase::from_cycle_position(0.75), MoonPhase::FirstQuarter);
        assert_eq!(MoonPhase::from_cycle_position(0.99), MoonPhase::WaxingGibbous);
        // Out-of-range positions wrap instead of panicking.
        assert_eq!(MoonPhase::from_cycle_position(1.0), MoonPhase::Full);
        assert_eq!(MoonPhase::from_cycle_position(-0.25), MoonPhase::FirstQuarter);
    }

    #[test]
    fn test_phase_serializes_as_label() {
        let json = serde_json::to_string(&MoonPhase::WaxingCrescent).unwrap();
        assert_eq!(json, "\"Waxing Crescent\"");
    }
}
