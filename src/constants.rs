/// Trials run per team when the caller does not ask for a specific count
pub const DEFAULT_TRIALS: usize = 10_000;

/// Bounds on any single-game win probability after composition
pub const MIN_GAME_PROBABILITY: f64 = 0.05;
pub const MAX_GAME_PROBABILITY: f64 = 0.95;

/// Standard deviation of the per-game Gaussian noise
pub const GAME_NOISE_STDDEV: f64 = 0.08;

/// Neutral profile values used when analytics are missing
pub const NEUTRAL_WIN_RATE: f64 = 0.50;
pub const NEUTRAL_STRENGTH_OF_SCHEDULE: f64 = 0.50;
pub const NEUTRAL_INJURY_INDEX: f64 = 0.90;
pub const NEUTRAL_MOMENTUM: f64 = 0.50;
pub const NEUTRAL_CHEMISTRY: f64 = 0.80;
pub const NEUTRAL_CLUTCH: f64 = 1.00;

/// Clutch factor range
pub const CLUTCH_RANGE: (f64, f64) = (0.85, 1.15);

/// Home advantage multiplier range
pub const HOME_ADVANTAGE_RANGE: (f64, f64) = (1.0, 1.5);

/// Playoff strength multiplier for seeds 1-2
pub const TOP_SEED_BONUS: f64 = 1.08;

/// Playoff strength multiplier for seeds 3-4
pub const HIGH_SEED_BONUS: f64 = 1.04;

/// Strength multiplier carried into the next round after a series win
pub const EXPERIENCE_BONUS: f64 = 1.02;

/// Relative win chance for a side trailing in a game that can eliminate it
pub const ELIMINATION_PRESSURE: f64 = 1.10;

/// Relative win chance for a side one win away from clinching
pub const CLINCH_PRESSURE: f64 = 0.95;

/// Relative win chance for the weaker side of a division rivalry
pub const RIVALRY_BOOST: f64 = 1.05;

/// Default composition weights for playoff strength.
///
/// Empirical; every one of these is overridable per league.
pub const DEFAULT_WEIGHTS: [f64; 5] = [0.40, 0.25, 0.15, 0.10, 0.05];

/// Clutch weight at which the clutch factor applies at face value
pub const REFERENCE_CLUTCH_WEIGHT: f64 = 0.25;
