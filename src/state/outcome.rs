/// Terminal outcome definitions for crawl targets
///
/// Every id in the configured range ends a run in exactly one of these states.
use std::fmt;

/// Represents how processing of a single target ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOutcome {
    // ===== Attempted =====
    /// A document was extracted and durably stored
    Stored,

    /// The fetch succeeded but no viable content could be extracted
    Empty,

    /// The fetch exhausted its retries, or the store write failed
    Failed,

    // ===== Not attempted =====
    /// The id was already stored and the run was resuming
    Skipped,

    /// The run was cancelled before this target started
    NotAttempted,
}

impl TargetOutcome {
    /// Returns true if the target went through fetch (successfully or not)
    pub fn is_attempted(&self) -> bool {
        matches!(self, Self::Stored | Self::Empty | Self::Failed)
    }

    /// Converts the outcome to its database/report string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Empty => "empty",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::NotAttempted => "not_attempted",
        }
    }

}

impl fmt::Display for TargetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
