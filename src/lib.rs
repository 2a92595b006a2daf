//! Playoff Core - Monte Carlo playoff and championship probabilities.
//!
//! Simulates the rest of a league's regular season, resolves qualification
//! and seeding, and plays out the bracket, thousands of times per team.
//! Python bindings via PyO3 are available behind the `python` feature.

pub mod aggregate;
pub mod bracket;
pub mod constants;
pub mod error;
pub mod factors;
pub mod format;
pub mod qualification;
pub mod season;
pub mod standings;
pub mod team;
pub mod win_prob;

pub use aggregate::{AggregateResult, SimulationOptions, SimulationProgress, Simulator};
pub use error::{Result, SimulationError};
pub use factors::{FactorWeights, ModelParams};
pub use format::{FormatRegistry, LeagueConfig, PlayoffFormat, Round, SeriesLength};
pub use standings::{LeagueSnapshot, LeagueStandings, StandingsEntry};
pub use team::{TeamAnalytics, TeamProfile};
pub use win_prob::{effective_win_probability, matchup_probability};

#[cfg(feature = "python")]
mod python {
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;
    use std::collections::BTreeMap;

    use crate::constants::{DEFAULT_TRIALS, GAME_NOISE_STDDEV, MAX_GAME_PROBABILITY, MIN_GAME_PROBABILITY};
    use crate::{AggregateResult, FormatRegistry, LeagueSnapshot, SimulationError, SimulationOptions, Simulator};

    impl From<SimulationError> for PyErr {
        fn from(err: SimulationError) -> PyErr {
            match err {
                SimulationError::Cancelled | SimulationError::ThreadPool(_) => {
                    PyRuntimeError::new_err(err.to_string())
                }
                _ => PyValueError::new_err(err.to_string()),
            }
        }
    }

    fn options(trials: i64, seed: Option<u64>) -> Result<SimulationOptions, SimulationError> {
        let trials = usize::try_from(trials)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(SimulationError::InvalidTrialCount(trials))?;
        Ok(SimulationOptions {
            trials,
            seed,
            threads: None,
        })
    }

    #[pymethods]
    impl AggregateResult {
        fn __repr__(&self) -> String {
            format!(
                "AggregateResult(team_code={:?}, league={:?}, playoff_probability={:.4}, championship_probability={:.4}, sample_size={})",
                self.team_code,
                self.league,
                self.playoff_probability,
                self.championship_probability,
                self.sample_size
            )
        }

        #[pyo3(name = "round_probability")]
        fn py_round_probability(&self, round: usize) -> f64 {
            self.round_probability(round)
        }

        fn to_json(&self) -> PyResult<String> {
            serde_json::to_string(self).map_err(|e| PyValueError::new_err(e.to_string()))
        }
    }

    /// Simulator bound to a set of league formats.
    #[pyclass(name = "PlayoffSimulator")]
    struct PlayoffSimulator {
        inner: Simulator,
    }

    #[pymethods]
    impl PlayoffSimulator {
        #[new]
        #[pyo3(signature = (formats_json = None))]
        fn new(formats_json: Option<&str>) -> PyResult<Self> {
            let registry = match formats_json {
                Some(json) => FormatRegistry::from_json(json)?,
                None => FormatRegistry::builtin(),
            };
            Ok(PlayoffSimulator {
                inner: Simulator::new(registry),
            })
        }

        fn leagues(&self) -> Vec<String> {
            self.inner.registry().leagues().map(str::to_string).collect()
        }

        #[pyo3(signature = (snapshot_json, team_code, trials = DEFAULT_TRIALS as i64, seed = None))]
        fn simulate_team(
            &self,
            py: Python<'_>,
            snapshot_json: &str,
            team_code: &str,
            trials: i64,
            seed: Option<u64>,
        ) -> PyResult<AggregateResult> {
            let snapshot = LeagueSnapshot::from_json(snapshot_json)?;
            let options = options(trials, seed)?;
            Ok(py.allow_threads(|| self.inner.simulate_team(&snapshot, team_code, &options))?)
        }

        #[pyo3(signature = (snapshot_json, trials = DEFAULT_TRIALS as i64, seed = None))]
        fn simulate_league(
            &self,
            py: Python<'_>,
            snapshot_json: &str,
            trials: i64,
            seed: Option<u64>,
        ) -> PyResult<BTreeMap<String, AggregateResult>> {
            let snapshot = LeagueSnapshot::from_json(snapshot_json)?;
            let options = options(trials, seed)?;
            Ok(py.allow_threads(|| self.inner.simulate_league(&snapshot, &options))?)
        }
    }

    /// Python module definition
    #[pymodule]
    fn playoff_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Classes
        m.add_class::<PlayoffSimulator>()?;
        m.add_class::<AggregateResult>()?;

        // Constants
        m.add("DEFAULT_TRIALS", DEFAULT_TRIALS)?;
        m.add("GAME_NOISE_STDDEV", GAME_NOISE_STDDEV)?;
        m.add("MIN_GAME_PROBABILITY", MIN_GAME_PROBABILITY)?;
        m.add("MAX_GAME_PROBABILITY", MAX_GAME_PROBABILITY)?;

        Ok(())
    }
}
