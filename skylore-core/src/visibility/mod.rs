///! Sky visibility module
///!
///! Pure derivation over the harvested catalogue: which constellations an
///! observer can plausibly see, the approximate lunar phase, and a
///! recommended viewing window. Cheap and time-dependent, so results are
///! computed per request and never cached.

mod types;
pub use types::{MoonPhase, VisibilityReport};

mod calculator;
pub use calculator::compute_visibility;
