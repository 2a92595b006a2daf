//! Trial aggregation and the simulation entry points.
//!
//! Every trial gets its own ChaCha stream derived from the batch seed and the
//! trial index, so results do not depend on how rayon splits the work. Each
//! worker accumulates a local tally and tallies are summed at the end.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bracket::{simulate_bracket, PlayoffEntrant};
use crate::constants::DEFAULT_TRIALS;
use crate::error::{Result, SimulationError};
use crate::format::{FormatRegistry, LeagueConfig};
use crate::qualification::{is_mathematically_eliminated, resolve_field, ProjectedTeam};
use crate::season::{expected_remaining_wins, simulate_with_model};
use crate::standings::LeagueSnapshot;
use crate::team::{ProfileField, TeamProfile};
use crate::win_prob::{base_playoff_strength, GameModel};

/// Batch parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationOptions {
    pub trials: usize,

    /// Fixed seed for reproducible results; drawn from entropy when absent
    pub seed: Option<u64>,

    /// Worker count; the global rayon pool is used when absent
    pub threads: Option<usize>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        SimulationOptions {
            trials: DEFAULT_TRIALS,
            seed: None,
            threads: None,
        }
    }
}

impl SimulationOptions {
    pub fn new(trials: usize) -> Self {
        SimulationOptions {
            trials,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
}

/// Progress tracking and cooperative cancellation for a batch.
///
/// Clones share the same counters, so a caller can keep one handle and pass
/// another into the simulation.
#[derive(Debug, Clone, Default)]
pub struct SimulationProgress {
    completed: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
    cancelled: Arc<AtomicBool>,
}

impl SimulationProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trials finished so far
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Trials scheduled for the current batch
    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Request that remaining trials be abandoned
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn reset(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    fn increment(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Result of one trial. Never shared between trials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialOutcome {
    pub final_wins: u32,
    pub made_playoffs: bool,
    pub seed: Option<u32>,
    pub won_championship: bool,
    pub rounds_advanced: u32,
}

impl TrialOutcome {
    fn missed(final_wins: u32) -> Self {
        TrialOutcome {
            final_wins,
            made_playoffs: false,
            seed: None,
            won_championship: false,
            rounds_advanced: 0,
        }
    }
}

/// Per-worker counters, merged after all trials finish.
#[derive(Clone, Debug, Default)]
struct TrialTally {
    trials: u64,
    playoffs: u64,
    championships: u64,
    total_wins: u64,
    seeds: BTreeMap<u32, u64>,
    rounds: Vec<u64>,
}

impl TrialTally {
    fn record(&mut self, outcome: &TrialOutcome) {
        self.trials += 1;
        self.total_wins += outcome.final_wins as u64;
        if outcome.made_playoffs {
            self.playoffs += 1;
            if let Some(seed) = outcome.seed {
                *self.seeds.entry(seed).or_insert(0) += 1;
            }
        }
        if outcome.won_championship {
            self.championships += 1;
        }
        let cleared = outcome.rounds_advanced as usize;
        if self.rounds.len() < cleared {
            self.rounds.resize(cleared, 0);
        }
        for count in &mut self.rounds[..cleared] {
            *count += 1;
        }
    }

    fn merge(mut self, other: TrialTally) -> TrialTally {
        self.trials += other.trials;
        self.playoffs += other.playoffs;
        self.championships += other.championships;
        self.total_wins += other.total_wins;
        for (seed, count) in other.seeds {
            *self.seeds.entry(seed).or_insert(0) += count;
        }
        if self.rounds.len() < other.rounds.len() {
            self.rounds.resize(other.rounds.len(), 0);
        }
        for (mine, theirs) in self.rounds.iter_mut().zip(other.rounds) {
            *mine += theirs;
        }
        self
    }
}

/// Playoff and championship probabilities for one team.
#[cfg_attr(feature = "python", pyo3::pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub team_code: String,
    pub league: String,
    pub playoff_probability: f64,
    pub championship_probability: f64,

    /// Trials that ended at each playoff seed
    pub seed_distribution: BTreeMap<u32, u64>,

    pub sample_size: usize,
    pub mean_final_wins: f64,

    /// Trials that cleared each round, indexed like the format's rounds
    pub round_advancement: Vec<u64>,

    /// Profile fields that fell back to defaults; empty when all data was real
    pub defaulted_fields: Vec<String>,

    /// Seed the batch ran with
    pub rng_seed: u64,
}

impl AggregateResult {
    /// True when the team's profile was partly built from defaults.
    pub fn used_defaults(&self) -> bool {
        !self.defaulted_fields.is_empty()
    }

    /// Fraction of trials that cleared round `round`.
    pub fn round_probability(&self, round: usize) -> f64 {
        self.round_advancement
            .get(round)
            .map_or(0.0, |&count| count as f64 / self.sample_size as f64)
    }

    /// Championship probability given the team qualified.
    pub fn conditional_championship_probability(&self) -> f64 {
        if self.playoff_probability > 0.0 {
            self.championship_probability / self.playoff_probability
        } else {
            0.0
        }
    }
}

/// Derive the random stream for one team's trial.
///
/// The standings position picks the key and the trial index picks the
/// stream, so teams in one league batch never share draws while a team
/// simulated alone still sees the same streams as in the batch.
pub fn trial_rng(seed: u64, position: usize, trial: u64) -> ChaCha8Rng {
    let key = seed.wrapping_add((position as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    let mut rng = ChaCha8Rng::seed_from_u64(key);
    rng.set_stream(trial);
    rng
}

/// League inputs resolved once per batch and shared read-only by all trials.
pub struct PreparedLeague<'a> {
    config: &'a LeagueConfig,
    snapshot: &'a LeagueSnapshot,
    profiles: Vec<TeamProfile>,
    defaulted: Vec<Vec<ProfileField>>,
    models: Vec<GameModel>,
    strengths: Vec<f64>,
    baseline: Vec<ProjectedTeam<'a>>,
}

impl<'a> PreparedLeague<'a> {
    pub fn new(config: &'a LeagueConfig, snapshot: &'a LeagueSnapshot) -> Result<Self> {
        snapshot.standings.validate()?;
        let league = &config.format.league;
        if !snapshot.league().eq_ignore_ascii_case(league) {
            return Err(SimulationError::InvalidStandings {
                league: snapshot.league().to_string(),
                reason: format!("snapshot does not belong to {league}"),
            });
        }

        let entries = &snapshot.standings.entries;
        let mut profiles = Vec::with_capacity(entries.len());
        let mut defaulted = Vec::with_capacity(entries.len());
        for entry in entries {
            let (profile, fields) = TeamProfile::from_analytics(
                &entry.team_code,
                league,
                entry.division.as_deref(),
                snapshot.analytics.get(&entry.team_code),
                (entry.wins, entry.losses),
                config.home_advantage,
            );
            profiles.push(profile);
            defaulted.push(fields);
        }

        let models: Vec<GameModel> = profiles
            .iter()
            .map(|p| GameModel::new(p, &config.model))
            .collect();
        let strengths = profiles
            .iter()
            .map(|p| base_playoff_strength(p, &config.weights, &config.model))
            .collect();
        let baseline = entries
            .iter()
            .zip(&models)
            .enumerate()
            .map(|(position, (entry, model))| ProjectedTeam {
                team_code: &entry.team_code,
                division: entry.division.as_deref(),
                standings_position: position,
                projected_wins: entry.wins as f64
                    + expected_remaining_wins(model, entry.games_remaining),
            })
            .collect();

        Ok(PreparedLeague {
            config,
            snapshot,
            profiles,
            defaulted,
            models,
            strengths,
            baseline,
        })
    }

    fn position(&self, team_code: &str) -> Result<usize> {
        self.snapshot
            .standings
            .position(team_code)
            .ok_or_else(|| SimulationError::UnknownTeam {
                team: team_code.to_string(),
                league: self.config.format.league.clone(),
            })
    }

    /// Run one full trial: season, qualification, then bracket.
    ///
    /// A team flagged `eliminated` skips qualification and the bracket.
    pub fn run_trial<R: Rng + ?Sized>(
        &self,
        position: usize,
        eliminated: bool,
        rng: &mut R,
    ) -> TrialOutcome {
        let entry = &self.snapshot.standings.entries[position];
        let final_wins = entry
            .wins
            .saturating_add(simulate_with_model(&self.models[position], entry.games_remaining, rng));
        if eliminated {
            return TrialOutcome::missed(final_wins);
        }

        let mut projected = self.baseline.clone();
        projected[position].projected_wins = final_wins as f64;
        let field = resolve_field(&projected, &self.config.format);

        let Some(own) = field
            .iter()
            .find(|s| s.team.standings_position == position)
        else {
            return TrialOutcome::missed(final_wins);
        };

        let entrant = |index: usize, seed: u32| PlayoffEntrant {
            profile: &self.profiles[index],
            strength: self.strengths[index],
            seed,
        };
        let team = entrant(position, own.seed);
        let opponents: Vec<PlayoffEntrant<'_>> = field
            .iter()
            .filter(|s| s.team.standings_position != position)
            .map(|s| entrant(s.team.standings_position, s.seed))
            .collect();

        let outcome = simulate_bracket(
            &team,
            &opponents,
            &self.config.format,
            &self.config.model,
            rng,
        );

        TrialOutcome {
            final_wins,
            made_playoffs: true,
            seed: Some(own.seed),
            won_championship: outcome.champion,
            rounds_advanced: outcome.rounds_advanced,
        }
    }

    /// Run `trials` independent trials for one team and aggregate them.
    pub fn run_simulation(
        &self,
        team_code: &str,
        trials: usize,
        seed: u64,
        progress: Option<&SimulationProgress>,
    ) -> Result<AggregateResult> {
        check_trials(trials)?;
        let position = self.position(team_code)?;
        let entry = &self.snapshot.standings.entries[position];
        let format = &self.config.format;

        let defaulted: Vec<String> = self.defaulted[position]
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        if !defaulted.is_empty() {
            warn!(
                team = team_code,
                league = %format.league,
                fields = ?defaulted,
                "incomplete team profile, using defaults"
            );
        }

        let eliminated =
            is_mathematically_eliminated(team_code, entry.max_wins(), &self.baseline, format);
        if eliminated {
            debug!(team = team_code, "mathematically eliminated, skipping playoff steps");
        }

        let tally = (0..trials)
            .into_par_iter()
            .try_fold(TrialTally::default, |mut tally, trial| {
                if progress.is_some_and(SimulationProgress::is_cancelled) {
                    return Err(SimulationError::Cancelled);
                }
                let mut rng = trial_rng(seed, position, trial as u64);
                tally.record(&self.run_trial(position, eliminated, &mut rng));
                if let Some(p) = progress {
                    p.increment();
                }
                Ok(tally)
            })
            .try_reduce(TrialTally::default, |a, b| Ok(a.merge(b)))?;

        let mut round_advancement = tally.rounds;
        round_advancement.resize(format.rounds.len(), 0);
        let n = tally.trials as f64;

        let result = AggregateResult {
            team_code: team_code.to_string(),
            league: format.league.clone(),
            playoff_probability: tally.playoffs as f64 / n,
            championship_probability: tally.championships as f64 / n,
            seed_distribution: tally.seeds,
            sample_size: trials,
            mean_final_wins: tally.total_wins as f64 / n,
            round_advancement,
            defaulted_fields: defaulted,
            rng_seed: seed,
        };
        debug!(
            team = team_code,
            playoff = result.playoff_probability,
            championship = result.championship_probability,
            "team simulation complete"
        );
        Ok(result)
    }
}

fn check_trials(trials: usize) -> Result<()> {
    if trials == 0 {
        return Err(SimulationError::InvalidTrialCount(0));
    }
    Ok(())
}

/// Entry point for playoff simulations against a format registry.
#[derive(Clone, Debug)]
pub struct Simulator {
    registry: FormatRegistry,
}

impl Default for Simulator {
    fn default() -> Self {
        Simulator::new(FormatRegistry::builtin())
    }
}

impl Simulator {
    pub fn new(registry: FormatRegistry) -> Self {
        Simulator { registry }
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Simulate one team's season and playoffs.
    pub fn simulate_team(
        &self,
        snapshot: &LeagueSnapshot,
        team_code: &str,
        options: &SimulationOptions,
    ) -> Result<AggregateResult> {
        self.simulate_team_with_progress(snapshot, team_code, options, &SimulationProgress::new())
    }

    pub fn simulate_team_with_progress(
        &self,
        snapshot: &LeagueSnapshot,
        team_code: &str,
        options: &SimulationOptions,
        progress: &SimulationProgress,
    ) -> Result<AggregateResult> {
        check_trials(options.trials)?;
        let config = self.registry.get(snapshot.league())?;
        let prepared = PreparedLeague::new(config, snapshot)?;
        let seed = resolve_seed(options.seed);

        info!(
            league = %config.format.league,
            team = team_code,
            trials = options.trials,
            seed,
            "starting team simulation"
        );
        progress.reset(options.trials);
        install(options.threads, || {
            prepared.run_simulation(team_code, options.trials, seed, Some(progress))
        })
    }

    /// Run a batch with a seed drawn from the caller's random source.
    pub fn run_simulation<R: Rng + ?Sized>(
        &self,
        snapshot: &LeagueSnapshot,
        team_code: &str,
        trials: usize,
        rng: &mut R,
    ) -> Result<AggregateResult> {
        let options = SimulationOptions::new(trials).with_seed(rng.gen());
        self.simulate_team(snapshot, team_code, &options)
    }

    /// Simulate every team in a league.
    pub fn simulate_league(
        &self,
        snapshot: &LeagueSnapshot,
        options: &SimulationOptions,
    ) -> Result<BTreeMap<String, AggregateResult>> {
        self.simulate_league_with_progress(snapshot, options, &SimulationProgress::new())
    }

    pub fn simulate_league_with_progress(
        &self,
        snapshot: &LeagueSnapshot,
        options: &SimulationOptions,
        progress: &SimulationProgress,
    ) -> Result<BTreeMap<String, AggregateResult>> {
        check_trials(options.trials)?;
        let config = self.registry.get(snapshot.league())?;
        let prepared = PreparedLeague::new(config, snapshot)?;
        let seed = resolve_seed(options.seed);

        progress.reset(options.trials * snapshot.standings.len());
        run_league(&prepared, options, seed, progress)
    }

    /// Simulate every team of every given league.
    ///
    /// Results are keyed by league, then team. Every league is checked
    /// against the registry before any trial runs.
    pub fn simulate_leagues(
        &self,
        snapshots: &[LeagueSnapshot],
        options: &SimulationOptions,
    ) -> Result<BTreeMap<String, BTreeMap<String, AggregateResult>>> {
        self.simulate_leagues_with_progress(snapshots, options, &SimulationProgress::new())
    }

    /// Multi-league batch sharing one progress handle.
    ///
    /// Cancelling stops the whole batch; no league's results are returned.
    pub fn simulate_leagues_with_progress(
        &self,
        snapshots: &[LeagueSnapshot],
        options: &SimulationOptions,
        progress: &SimulationProgress,
    ) -> Result<BTreeMap<String, BTreeMap<String, AggregateResult>>> {
        check_trials(options.trials)?;
        let prepared = snapshots
            .iter()
            .map(|snapshot| {
                let config = self.registry.get(snapshot.league())?;
                PreparedLeague::new(config, snapshot)
            })
            .collect::<Result<Vec<_>>>()?;
        let seed = resolve_seed(options.seed);

        let teams: usize = snapshots.iter().map(|s| s.standings.len()).sum();
        progress.reset(options.trials * teams);

        prepared
            .iter()
            .map(|league| {
                let results = run_league(league, options, seed, progress)?;
                Ok((league.snapshot.league().to_string(), results))
            })
            .collect()
    }
}

/// Simulate every team of a prepared league without touching the progress totals.
fn run_league(
    prepared: &PreparedLeague<'_>,
    options: &SimulationOptions,
    seed: u64,
    progress: &SimulationProgress,
) -> Result<BTreeMap<String, AggregateResult>> {
    let league = &prepared.config.format.league;
    let teams = &prepared.snapshot.standings.entries;
    info!(
        league = %league,
        teams = teams.len(),
        trials = options.trials,
        seed,
        "starting league simulation"
    );

    let results = install(options.threads, || {
        teams
            .par_iter()
            .map(|entry| {
                prepared.run_simulation(&entry.team_code, options.trials, seed, Some(progress))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    info!(league = %league, "league simulation complete");
    Ok(results
        .into_iter()
        .map(|r| (r.team_code.clone(), r))
        .collect())
}

fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::thread_rng().gen())
}

/// Run `f` on a dedicated pool of `threads` workers, or on the global pool.
fn install<T, F>(threads: Option<usize>, f: F) -> Result<T>
where
    T: Send,
    F: FnOnce() -> Result<T> + Send,
{
    match threads {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()?
            .install(f),
        None => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::{LeagueStandings, StandingsEntry};
    use crate::team::TeamAnalytics;
    use proptest::prelude::*;
    use statrs::statistics::Statistics;

    const LEAGUE: &str = "TEST";

    fn simulator() -> Simulator {
        let registry = FormatRegistry::from_json(
            r#"[{
                "league": "TEST",
                "totalSpots": 12,
                "rounds": [
                    {"name": "Wild Card", "seriesLength": "best-of-3"},
                    {"name": "Semifinal", "seriesLength": "best-of-5"}
                ],
                "homeAdvantage": 1.04
            }]"#,
        )
        .unwrap();
        Simulator::new(registry)
    }

    fn scenario_analytics(injury_index: f64) -> TeamAnalytics {
        TeamAnalytics {
            base_win_rate: Some(0.60),
            strength_of_schedule: Some(0.50),
            injury_index: Some(injury_index),
            momentum: Some(0.55),
            chemistry: Some(0.85),
            clutch_factor: Some(1.0),
            home_advantage: Some(1.04),
        }
    }

    /// Nineteen opponents spread from 95 to 59 wins, plus "SIM" at 78-64,
    /// everyone with 20 games left. The 12th-best opponent projects to about
    /// 83.8 wins, so SIM sits on the bubble.
    fn league(sim: TeamAnalytics) -> LeagueSnapshot {
        let mut entries: Vec<StandingsEntry> = (0..19)
            .map(|i| {
                let wins = 95 - 2 * i;
                StandingsEntry::new(&format!("T{i:02}"), wins, 142 - wins, 20)
            })
            .collect();
        entries.insert(9, StandingsEntry::new("SIM", 78, 64, 20));
        LeagueSnapshot::new(LeagueStandings::new(LEAGUE, entries)).with_analytics("SIM", sim)
    }

    fn run(snapshot: &LeagueSnapshot, trials: usize, seed: u64) -> AggregateResult {
        simulator()
            .simulate_team(snapshot, "SIM", &SimulationOptions::new(trials).with_seed(seed))
            .unwrap()
    }

    #[test]
    fn test_scenario_reproducible() {
        let snapshot = league(scenario_analytics(0.95));
        let first = run(&snapshot, 10_000, 42);
        let second = run(&snapshot, 10_000, 42);

        assert_eq!(first, second);
        assert_eq!(first.sample_size, 10_000);
        assert!(first.playoff_probability > 0.9);
        assert!(first.championship_probability > 0.0);
        assert!(first.championship_probability <= first.playoff_probability);
        assert!(!first.used_defaults());
    }

    #[test]
    fn test_seed_distribution_matches_playoff_count() {
        let result = run(&league(scenario_analytics(0.5)), 2_000, 7);

        let seeded: u64 = result.seed_distribution.values().sum();
        let playoffs = (result.playoff_probability * result.sample_size as f64).round() as u64;
        assert_eq!(seeded, playoffs);
        assert!(result.seed_distribution.keys().all(|&s| (1..=12).contains(&s)));
    }

    #[test]
    fn test_round_advancement_consistent() {
        let result = run(&league(scenario_analytics(0.95)), 2_000, 11);

        assert_eq!(result.round_advancement.len(), 2);
        assert!(result.round_advancement[1] <= result.round_advancement[0]);
        let champions = (result.championship_probability * 2_000.0).round() as u64;
        assert_eq!(result.round_advancement[1], champions);
        assert!(result.round_probability(0) <= result.playoff_probability);
        assert_eq!(result.round_probability(5), 0.0);
        assert!(result.conditional_championship_probability() <= 1.0);
    }

    #[test]
    fn test_injury_lowers_playoff_probability() {
        let healthy = run(&league(scenario_analytics(0.95)), 10_000, 42);
        let injured = run(&league(scenario_analytics(0.50)), 10_000, 42);

        assert!(injured.playoff_probability < healthy.playoff_probability);
        assert!(injured.mean_final_wins < healthy.mean_final_wins);
    }

    #[test]
    fn test_monotone_in_base_win_rate() {
        let mut previous = 0.0;
        for win_rate in [0.30, 0.45, 0.60, 0.75] {
            let analytics = TeamAnalytics {
                base_win_rate: Some(win_rate),
                ..scenario_analytics(0.5)
            };
            let result = run(&league(analytics), 2_000, 3);
            assert!(result.playoff_probability >= previous);
            previous = result.playoff_probability;
        }
    }

    #[test]
    fn test_independent_of_worker_count() {
        let snapshot = league(scenario_analytics(0.5));
        let sim = simulator();
        let single = sim
            .simulate_team(&snapshot, "SIM", &SimulationOptions::new(3_000).with_seed(9).with_threads(1))
            .unwrap();
        let many = sim
            .simulate_team(&snapshot, "SIM", &SimulationOptions::new(3_000).with_seed(9).with_threads(4))
            .unwrap();
        assert_eq!(single, many);
    }

    #[test]
    fn test_league_batch_matches_single_team() {
        let snapshot = league(scenario_analytics(0.5));
        let options = SimulationOptions::new(500).with_seed(21);
        let all = simulator().simulate_league(&snapshot, &options).unwrap();

        assert_eq!(all.len(), 20);
        assert_eq!(all["SIM"], simulator().simulate_team(&snapshot, "SIM", &options).unwrap());
        for result in all.values() {
            assert!(result.championship_probability <= result.playoff_probability);
        }
        // Opponents had no analytics at all.
        assert!(all["T00"].used_defaults());
    }

    #[test]
    fn test_clinched_team_always_qualifies() {
        let entries = vec![
            StandingsEntry::new("TOP", 100, 42, 0),
            StandingsEntry::new("A", 80, 60, 2),
            StandingsEntry::new("B", 70, 70, 2),
        ];
        let snapshot = LeagueSnapshot::new(LeagueStandings::new(LEAGUE, entries));
        let result = simulator()
            .simulate_team(&snapshot, "TOP", &SimulationOptions::new(1_000).with_seed(1))
            .unwrap();

        assert_eq!(result.playoff_probability, 1.0);
        assert_eq!(result.seed_distribution.get(&1), Some(&1_000));
        assert_eq!(result.mean_final_wins, 100.0);
    }

    #[test]
    fn test_eliminated_team_never_qualifies() {
        let mut snapshot = league(scenario_analytics(0.95));
        snapshot.standings.entries.push(StandingsEntry::new("LOW", 40, 102, 20));
        let result = simulator()
            .simulate_team(&snapshot, "LOW", &SimulationOptions::new(1_000).with_seed(5))
            .unwrap();

        assert_eq!(result.playoff_probability, 0.0);
        assert_eq!(result.championship_probability, 0.0);
        assert!(result.seed_distribution.is_empty());
        assert!(result.mean_final_wins >= 40.0 && result.mean_final_wins <= 60.0);
    }

    #[test]
    fn test_variance_shrinks_with_trials() {
        let snapshot = league(scenario_analytics(0.5));
        let variance = |trials: usize| {
            let estimates: Vec<f64> = (0..10)
                .map(|seed| run(&snapshot, trials, 1_000 + seed).playoff_probability)
                .collect();
            estimates.iter().variance()
        };

        let small = variance(100);
        let medium = variance(1_000);
        let large = variance(10_000);
        assert!(small > medium, "{small} <= {medium}");
        assert!(medium > large, "{medium} <= {large}");
    }

    #[test]
    fn test_invalid_requests() {
        let snapshot = league(scenario_analytics(0.95));
        let sim = simulator();

        let err = sim
            .simulate_team(&snapshot, "SIM", &SimulationOptions::new(0))
            .unwrap_err();
        assert!(matches!(err, SimulationError::InvalidTrialCount(0)));

        let err = sim
            .simulate_team(&snapshot, "NOPE", &SimulationOptions::new(10))
            .unwrap_err();
        assert!(matches!(err, SimulationError::UnknownTeam { .. }));

        let mut other = snapshot.clone();
        other.standings.league = "XFL".to_string();
        let err = sim.simulate_league(&other, &SimulationOptions::new(10)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_cancelled_batch_returns_no_result() {
        let snapshot = league(scenario_analytics(0.95));
        let progress = SimulationProgress::new();
        progress.cancel();

        let err = simulator()
            .simulate_team_with_progress(&snapshot, "SIM", &SimulationOptions::new(1_000), &progress)
            .unwrap_err();
        assert!(matches!(err, SimulationError::Cancelled));
        assert_eq!(progress.completed(), 0);
    }

    #[test]
    fn test_cancel_from_another_thread_mid_batch() {
        let snapshot = league(scenario_analytics(0.95));
        let progress = SimulationProgress::new();
        let trials = 20_000_000;

        let result = std::thread::scope(|scope| {
            let watcher = progress.clone();
            let batch = scope.spawn(|| {
                simulator().simulate_team_with_progress(
                    &snapshot,
                    "SIM",
                    &SimulationOptions::new(trials).with_seed(8),
                    &progress,
                )
            });
            while watcher.completed() < 1_000 && !batch.is_finished() {
                std::thread::yield_now();
            }
            watcher.cancel();
            batch.join().unwrap()
        });

        assert!(matches!(result, Err(SimulationError::Cancelled)));
        assert!(progress.completed() >= 1_000);
        assert!(progress.completed() < trials);
    }

    #[test]
    fn test_multi_league_batch_shares_progress() {
        let snapshots = [league(scenario_analytics(0.95)), league(scenario_analytics(0.5))];
        let progress = SimulationProgress::new();
        simulator()
            .simulate_leagues_with_progress(&snapshots, &SimulationOptions::new(50).with_seed(6), &progress)
            .unwrap();
        assert_eq!(progress.total(), 2 * 20 * 50);
        assert_eq!(progress.completed(), 2 * 20 * 50);

        progress.cancel();
        let err = simulator()
            .simulate_leagues_with_progress(&snapshots, &SimulationOptions::new(50), &progress)
            .unwrap_err();
        assert!(matches!(err, SimulationError::Cancelled));
    }

    #[test]
    fn test_multi_league_batch_rejects_unknown_league_up_front() {
        let mut other = league(scenario_analytics(0.95));
        other.standings.league = "XFL".to_string();
        let progress = SimulationProgress::new();

        let err = simulator()
            .simulate_leagues_with_progress(
                &[league(scenario_analytics(0.95)), other],
                &SimulationOptions::new(50),
                &progress,
            )
            .unwrap_err();
        assert!(matches!(err, SimulationError::UnknownLeague(_)));
        assert_eq!(progress.completed(), 0);
    }

    #[test]
    fn test_trial_streams_differ_between_teams() {
        let first = trial_rng(5, 0, 3).gen::<u64>();
        let second = trial_rng(5, 1, 3).gen::<u64>();
        assert_ne!(first, second);
        assert_eq!(trial_rng(5, 1, 3).gen::<u64>(), second);
        assert_ne!(trial_rng(5, 1, 4).gen::<u64>(), second);
    }

    #[test]
    fn test_huge_standings_values_do_not_overflow() {
        let entries = vec![
            StandingsEntry::new("BIG", u32::MAX - 5, 0, 20),
            StandingsEntry::new("A", 10, 10, 20),
        ];
        let snapshot = LeagueSnapshot::new(LeagueStandings::new(LEAGUE, entries));
        let result = simulator()
            .simulate_team(&snapshot, "BIG", &SimulationOptions::new(100).with_seed(1))
            .unwrap();
        assert_eq!(result.playoff_probability, 1.0);
        assert!(result.mean_final_wins <= u32::MAX as f64);
    }

    #[test]
    fn test_progress_counts_trials() {
        let snapshot = league(scenario_analytics(0.95));
        let progress = SimulationProgress::new();
        simulator()
            .simulate_league_with_progress(&snapshot, &SimulationOptions::new(50).with_seed(2), &progress)
            .unwrap();
        assert_eq!(progress.total(), 50 * 20);
        assert_eq!(progress.completed(), 50 * 20);
    }

    #[test]
    fn test_seed_drawn_when_absent_is_reported() {
        let snapshot = league(scenario_analytics(0.95));
        let sim = simulator();
        let drawn = sim
            .simulate_team(&snapshot, "SIM", &SimulationOptions::new(200))
            .unwrap();
        let replay = sim
            .simulate_team(&snapshot, "SIM", &SimulationOptions::new(200).with_seed(drawn.rng_seed))
            .unwrap();
        assert_eq!(drawn, replay);
    }

    #[test]
    fn test_run_simulation_with_caller_rng() {
        let snapshot = league(scenario_analytics(0.95));
        let sim = simulator();
        let a = sim
            .run_simulation(&snapshot, "SIM", 300, &mut ChaCha8Rng::seed_from_u64(77))
            .unwrap();
        let b = sim
            .run_simulation(&snapshot, "SIM", 300, &mut ChaCha8Rng::seed_from_u64(77))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_simulate_leagues_keyed_by_league() {
        let sim = Simulator::default();
        let nba = LeagueSnapshot::new(LeagueStandings::new(
            "NBA",
            (0..20)
                .map(|i| StandingsEntry::new(&format!("N{i:02}"), 60 - 2 * i, 20 + 2 * i, 2))
                .collect(),
        ));
        let nfl = LeagueSnapshot::new(LeagueStandings::new(
            "NFL",
            (0..16)
                .map(|i| {
                    let division = ["North", "South", "East", "West"][(i % 4) as usize];
                    StandingsEntry::new(&format!("F{i:02}"), 13 - i / 2, 2 + i / 2, 2).in_division(division)
                })
                .collect(),
        ));

        let results = sim
            .simulate_leagues(&[nba, nfl], &SimulationOptions::new(100).with_seed(4))
            .unwrap();
        assert_eq!(results["NBA"].len(), 20);
        assert_eq!(results["NFL"].len(), 16);
        // Each division winner is guaranteed a spot in the NFL format.
        for code in ["F00", "F01", "F02", "F03"] {
            assert_eq!(results["NFL"][code].playoff_probability, 1.0);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_championship_never_exceeds_playoffs(
            win in 0.2f64..0.8,
            injury in 0.3f64..1.0,
            momentum in 0.0f64..1.0,
            seed in any::<u64>(),
        ) {
            let analytics = TeamAnalytics {
                base_win_rate: Some(win),
                injury_index: Some(injury),
                momentum: Some(momentum),
                ..scenario_analytics(0.9)
            };
            let result = run(&league(analytics), 100, seed);
            prop_assert!((0.0..=1.0).contains(&result.playoff_probability));
            prop_assert!(result.championship_probability <= result.playoff_probability);
        }
    }
}
