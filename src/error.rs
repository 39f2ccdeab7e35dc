use std::path::PathBuf;

/// Failure modes of the ingestion and analysis units.
///
/// None of these are fatal to a pipeline run. A missing season skips its
/// unit, an unusable one fails only that unit, a malformed row is dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("missing data for {league} {season}: {}", .path.display())]
    MissingData {
        league: String,
        season: String,
        path: PathBuf,
    },

    #[error("malformed record in {league} {season} (row {row}): {reason}")]
    MalformedRecord {
        league: String,
        season: String,
        row: usize,
        reason: String,
    },

    #[error("unusable source for {league} {season}: {reason}")]
    InvalidSource {
        league: String,
        season: String,
        reason: String,
    },
}

impl PipelineError {
    /// Skips are expected in normal runs (promoted leagues, seasons not yet
    /// downloaded); everything else is reported as a failed unit.
    pub fn is_skip(&self) -> bool {
        matches!(self, PipelineError::MissingData { .. })
    }
}
