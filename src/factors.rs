//! Factor models that adjust a team's per-game win probability.
//!
//! Each model is a pure function of profile state. The set is closed, so the
//! models are variants of one enum rather than trait objects.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CLINCH_PRESSURE, DEFAULT_WEIGHTS, ELIMINATION_PRESSURE, EXPERIENCE_BONUS, GAME_NOISE_STDDEV,
    HIGH_SEED_BONUS, MAX_GAME_PROBABILITY, MIN_GAME_PROBABILITY, RIVALRY_BOOST, TOP_SEED_BONUS,
};
use crate::team::TeamProfile;

/// Composition weights for playoff strength.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FactorWeights {
    pub base_strength: f64,
    pub clutch: f64,
    pub injury: f64,
    pub momentum: f64,
    pub chemistry: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        let [base_strength, clutch, injury, momentum, chemistry] = DEFAULT_WEIGHTS;
        FactorWeights {
            base_strength,
            clutch,
            injury,
            momentum,
            chemistry,
        }
    }
}

impl FactorWeights {
    /// Sum of the weights blended into base playoff strength (clutch excluded).
    pub fn blend_total(&self) -> f64 {
        self.base_strength + self.injury + self.momentum + self.chemistry
    }

    pub fn validate(&self) -> Result<(), String> {
        let all = [
            self.base_strength,
            self.clutch,
            self.injury,
            self.momentum,
            self.chemistry,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".to_string());
        }
        if self.blend_total() <= 0.0 {
            return Err("strength weights must not all be zero".to_string());
        }
        Ok(())
    }
}

/// Tunable constants of the factor composition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelParams {
    /// Slope of the schedule-strength multiplier around a neutral 0.5
    pub sos_sensitivity: f64,
    pub momentum_scale: f64,
    pub chemistry_floor: f64,
    pub chemistry_scale: f64,
    pub injury_exponent: f64,
    pub noise_std_dev: f64,
    pub min_game_probability: f64,
    pub max_game_probability: f64,
    pub rivalry_boost: f64,
    pub experience_bonus: f64,
    pub elimination_pressure: f64,
    pub clinch_pressure: f64,
    pub top_seed_bonus: f64,
    pub high_seed_bonus: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            sos_sensitivity: 0.4,
            momentum_scale: 0.2,
            chemistry_floor: 0.8,
            chemistry_scale: 0.4,
            injury_exponent: 1.5,
            noise_std_dev: GAME_NOISE_STDDEV,
            min_game_probability: MIN_GAME_PROBABILITY,
            max_game_probability: MAX_GAME_PROBABILITY,
            rivalry_boost: RIVALRY_BOOST,
            experience_bonus: EXPERIENCE_BONUS,
            elimination_pressure: ELIMINATION_PRESSURE,
            clinch_pressure: CLINCH_PRESSURE,
            top_seed_bonus: TOP_SEED_BONUS,
            high_seed_bonus: HIGH_SEED_BONUS,
        }
    }
}

impl ModelParams {
    pub fn validate(&self) -> Result<(), String> {
        let multipliers = [
            self.rivalry_boost,
            self.experience_bonus,
            self.elimination_pressure,
            self.clinch_pressure,
            self.top_seed_bonus,
            self.high_seed_bonus,
            self.chemistry_floor,
        ];
        if multipliers.iter().any(|m| !m.is_finite() || *m <= 0.0) {
            return Err("multipliers must be finite and positive".to_string());
        }
        if !self.noise_std_dev.is_finite() || self.noise_std_dev < 0.0 {
            return Err("noise standard deviation must be non-negative".to_string());
        }
        if !(0.0 < self.min_game_probability
            && self.min_game_probability <= self.max_game_probability
            && self.max_game_probability < 1.0)
        {
            return Err("game probability bounds must satisfy 0 < min <= max < 1".to_string());
        }
        let scales = [
            self.sos_sensitivity,
            self.momentum_scale,
            self.chemistry_scale,
            self.injury_exponent,
        ];
        if scales.iter().any(|s| !s.is_finite() || *s < 0.0) {
            return Err("factor scales must be finite and non-negative".to_string());
        }
        Ok(())
    }

    /// Clamp a probability to the configured single-game bounds.
    pub fn clamp_probability(&self, p: f64) -> f64 {
        p.clamp(self.min_game_probability, self.max_game_probability)
    }

    /// Playoff strength multiplier for a seed.
    pub fn seed_bonus(&self, seed: u32) -> f64 {
        match seed {
            1 | 2 => self.top_seed_bonus,
            3 | 4 => self.high_seed_bonus,
            _ => 1.0,
        }
    }
}

/// How an adjustment composes into the running win probability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adjustment {
    Multiplier(f64),
    /// Added to 1.0 and then applied as a multiplier
    Additive(f64),
}

impl Adjustment {
    pub fn apply(self, p: f64) -> f64 {
        match self {
            Adjustment::Multiplier(m) => p * m,
            Adjustment::Additive(a) => p * (1.0 + a),
        }
    }
}

/// The enhanced factor models.
#[derive(Clone, Copy, Debug)]
pub enum FactorModel<'a> {
    StrengthOfSchedule,
    Injury,
    Momentum,
    /// Head-to-head context against a specific opponent
    Rivalry { opponent: &'a TeamProfile },
}

impl FactorModel<'_> {
    pub fn adjust(&self, profile: &TeamProfile, params: &ModelParams) -> Adjustment {
        match self {
            FactorModel::StrengthOfSchedule => {
                Adjustment::Multiplier(strength_of_schedule(profile, params))
            }
            FactorModel::Injury => {
                Adjustment::Multiplier(injury_impact(profile.injury_index, params))
            }
            FactorModel::Momentum => {
                Adjustment::Additive(momentum_tracking(profile.momentum, params))
            }
            FactorModel::Rivalry { opponent } => {
                Adjustment::Multiplier(division_rivalry(profile, opponent, params))
            }
        }
    }
}

/// Tougher schedules (SOS above 0.5) dampen the effective win rate.
pub fn strength_of_schedule(profile: &TeamProfile, params: &ModelParams) -> f64 {
    (1.0 - params.sos_sensitivity * (profile.strength_of_schedule - 0.5)).max(0.0)
}

/// Non-linear health penalty, `injury_index ^ exponent`, in (0, 1].
pub fn injury_impact(injury_index: f64, params: &ModelParams) -> f64 {
    injury_index.clamp(0.0, 1.0).powf(params.injury_exponent)
}

/// Recent-form boost. The composed probability is clamped afterwards, so the
/// boost cannot push a single game outside the configured bounds.
pub fn momentum_tracking(momentum: f64, params: &ModelParams) -> f64 {
    momentum.clamp(0.0, 1.0) * params.momentum_scale
}

pub fn chemistry_factor(chemistry: f64, params: &ModelParams) -> f64 {
    params.chemistry_floor + chemistry.clamp(0.0, 1.0) * params.chemistry_scale
}

/// Lift for the weaker side of a same-division matchup; 1.0 otherwise.
pub fn division_rivalry(team: &TeamProfile, opponent: &TeamProfile, params: &ModelParams) -> f64 {
    let same_division = match (&team.division, &opponent.division) {
        (Some(a), Some(b)) => a == b && team.league == opponent.league,
        _ => false,
    };
    if same_division && team.base_win_rate < opponent.base_win_rate {
        params.rivalry_boost
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::TeamAnalytics;
    use proptest::prelude::*;

    fn profile(win: f64, sos: f64, division: Option<&str>) -> TeamProfile {
        let analytics = TeamAnalytics {
            base_win_rate: Some(win),
            strength_of_schedule: Some(sos),
            ..TeamAnalytics::default()
        };
        TeamProfile::from_analytics("T", "MLB", division, Some(&analytics), (0, 0), 1.04).0
    }

    #[test]
    fn test_sos_neutral_and_direction() {
        let params = ModelParams::default();
        assert!((strength_of_schedule(&profile(0.5, 0.5, None), &params) - 1.0).abs() < 1e-12);
        assert!(strength_of_schedule(&profile(0.5, 0.9, None), &params) < 1.0);
        assert!(strength_of_schedule(&profile(0.5, 0.1, None), &params) > 1.0);
    }

    #[test]
    fn test_injury_is_nonlinear() {
        let params = ModelParams::default();
        assert!((injury_impact(1.0, &params) - 1.0).abs() < 1e-12);
        assert!((injury_impact(0.25, &params) - 0.125).abs() < 1e-12);
        let near_full = 1.0 - injury_impact(0.95, &params);
        let mid = injury_impact(0.7, &params) - injury_impact(0.65, &params);
        assert!(mid > near_full / 2.0);
    }

    #[test]
    fn test_momentum_bounded() {
        let params = ModelParams::default();
        assert_eq!(momentum_tracking(0.0, &params), 0.0);
        assert!((momentum_tracking(1.0, &params) - 0.2).abs() < 1e-12);
        assert!((momentum_tracking(4.0, &params) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_rivalry_only_for_weaker_division_mate() {
        let params = ModelParams::default();
        let weak = profile(0.45, 0.5, Some("AL East"));
        let strong = profile(0.60, 0.5, Some("AL East"));
        let elsewhere = profile(0.60, 0.5, Some("AL West"));

        assert_eq!(division_rivalry(&weak, &strong, &params), params.rivalry_boost);
        assert_eq!(division_rivalry(&strong, &weak, &params), 1.0);
        assert_eq!(division_rivalry(&weak, &elsewhere, &params), 1.0);
        assert_eq!(division_rivalry(&weak, &profile(0.6, 0.5, None), &params), 1.0);
    }

    #[test]
    fn test_factor_model_dispatch() {
        let params = ModelParams::default();
        let team = profile(0.5, 0.5, None);

        assert_eq!(
            FactorModel::Momentum.adjust(&team, &params),
            Adjustment::Additive(0.1)
        );
        let opponent = profile(0.7, 0.5, None);
        assert_eq!(
            FactorModel::Rivalry { opponent: &opponent }.adjust(&team, &params),
            Adjustment::Multiplier(1.0)
        );
        assert!((Adjustment::Additive(0.1).apply(0.5) - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_default_weights_and_validation() {
        let weights = FactorWeights::default();
        assert_eq!(weights.base_strength, 0.40);
        assert_eq!(weights.clutch, 0.25);
        assert!(weights.validate().is_ok());

        let zeroed = FactorWeights {
            base_strength: 0.0,
            injury: 0.0,
            momentum: 0.0,
            chemistry: 0.0,
            clutch: 1.0,
        };
        assert!(zeroed.validate().is_err());
        assert!(ModelParams::default().validate().is_ok());

        let bad = ModelParams {
            min_game_probability: 0.9,
            max_game_probability: 0.1,
            ..ModelParams::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_seed_bonus() {
        let params = ModelParams::default();
        assert_eq!(params.seed_bonus(1), 1.08);
        assert_eq!(params.seed_bonus(2), 1.08);
        assert_eq!(params.seed_bonus(4), 1.04);
        assert_eq!(params.seed_bonus(5), 1.0);
    }

    proptest! {
        #[test]
        fn prop_injury_multiplier_in_unit_interval(index in 0.0f64..=1.0) {
            let m = injury_impact(index, &ModelParams::default());
            prop_assert!((0.0..=1.0).contains(&m));
            prop_assert!(m <= index + 1e-12);
        }
    }
}
