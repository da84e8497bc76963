///! Error types for the harvest pipeline

use thiserror::Error;

/// Errors surfaced by the fetch layer.
///
/// Parse failures are deliberately not represented here: a field that no
/// pattern matched is resolved by deterministic synthesis at assembly time
/// and never becomes an error.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Every attempt for a URL failed (timeout, transport error, or a
    /// non-2xx status). Entry-level handling drops the single entry;
    /// listing-level handling falls back to the backup source.
    #[error("upstream unavailable after {attempts} attempts: {url}")]
    Unavailable { url: String, attempts: u32 },
}
