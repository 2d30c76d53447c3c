//! Error types for obstacle search.

use thiserror::Error;

/// Result type alias for obstacle search operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unrecoverable errors surfaced to the caller of a search.
///
/// Recoverable conditions (a failed simulation, a mutation that runs out of
/// attempts, an exhausted candidate pool) are handled inside the search and
/// only show up here once their retry caps are exceeded.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The spiral produced no point inside the generation area.
    #[error("Spiral with {num_points} points has no point inside the generation area")]
    EmptySpiral {
        /// Number of spiral points generated.
        num_points: usize,
    },

    /// No trajectory segment crosses the generation area.
    #[error("No trajectory segment intersects the generation area")]
    NoFlightSegment,

    /// The candidate pool could not yield an unused point pair at any threshold.
    #[error("Candidate pool exhausted at threshold {threshold:.2}m")]
    CandidatePoolExhausted {
        /// Last filter threshold tried, in meters.
        threshold: f64,
    },

    /// Mutation could not find a valid, novel configuration from any fresh parent.
    #[error("No feasible configuration found after {restarts} parent restarts")]
    NoFeasibleRegion {
        /// Number of fresh parents drawn before giving up.
        restarts: usize,
    },

    /// Persisting an interesting case failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Search cancelled before the first evaluation completed.
    #[error("Search cancelled")]
    Cancelled,
}

impl Error {
    /// Returns true if the error stems from parameter misconfiguration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfig(_) | Error::EmptySpiral { .. } | Error::NoFlightSegment
        )
    }
}
