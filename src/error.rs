use thiserror::Error;

/// Errors surfaced by the playoff simulator.
///
/// Nothing here is transient: simulation does no I/O, so callers should
/// never retry on any of these.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("unknown league: {0}")]
    UnknownLeague(String),

    #[error("invalid playoff format for {league}: {reason}")]
    InvalidFormat { league: String, reason: String },

    #[error("team {team} not found in {league} standings")]
    UnknownTeam { team: String, league: String },

    #[error("invalid standings for {league}: {reason}")]
    InvalidStandings { league: String, reason: String },

    #[error("trial count must be positive, got {0}")]
    InvalidTrialCount(i64),

    #[error("simulation cancelled")]
    Cancelled,

    #[error("failed to parse input: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SimulationError {
    /// True for errors caused by league configuration rather than input data.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SimulationError::UnknownLeague(_)
                | SimulationError::InvalidFormat { .. }
                | SimulationError::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(SimulationError::UnknownLeague("XFL".to_string()).is_configuration());
        assert!(SimulationError::InvalidFormat {
            league: "MLB".to_string(),
            reason: "no rounds".to_string(),
        }
        .is_configuration());
        assert!(!SimulationError::Cancelled.is_configuration());
        assert!(!SimulationError::InvalidTrialCount(0).is_configuration());
    }

    #[test]
    fn test_messages() {
        let err = SimulationError::UnknownTeam {
            team: "NYY".to_string(),
            league: "MLB".to_string(),
        };
        assert_eq!(err.to_string(), "team NYY not found in MLB standings");
        assert_eq!(
            SimulationError::InvalidTrialCount(-5).to_string(),
            "trial count must be positive, got -5"
        );
    }
}
