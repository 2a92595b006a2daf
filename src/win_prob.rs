use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Normal;

use crate::constants::REFERENCE_CLUTCH_WEIGHT;
use crate::factors::{chemistry_factor, injury_impact, FactorModel, FactorWeights, ModelParams};
use crate::team::TeamProfile;

/// Per-game win probability model for one team.
///
/// The factor composition is deterministic for a fixed profile, so it is
/// computed once; only the Gaussian noise is drawn per game.
#[derive(Clone, Debug)]
pub struct GameModel {
    composed: f64,
    noise: Option<Normal>,
    min: f64,
    max: f64,
}

impl GameModel {
    pub fn new(profile: &TeamProfile, params: &ModelParams) -> Self {
        let noise = if params.noise_std_dev > 0.0 {
            Normal::new(0.0, params.noise_std_dev).ok()
        } else {
            None
        };
        GameModel {
            composed: composed_probability(profile, params),
            noise,
            min: params.min_game_probability,
            max: params.max_game_probability,
        }
    }

    /// Noise-free probability, clamped. Used for expected-win projections.
    pub fn expected_probability(&self) -> f64 {
        self.composed.clamp(self.min, self.max)
    }

    /// Draw the effective win probability for one game.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let noise = match &self.noise {
            Some(normal) => normal.sample(rng),
            None => 0.0,
        };
        (self.composed + noise).clamp(self.min, self.max)
    }
}

/// Factor composition before noise.
///
/// Order: base win rate, schedule strength, momentum, injury, chemistry.
pub fn composed_probability(profile: &TeamProfile, params: &ModelParams) -> f64 {
    let adjusted = [
        FactorModel::StrengthOfSchedule,
        FactorModel::Momentum,
        FactorModel::Injury,
    ]
    .iter()
    .fold(profile.base_win_rate, |p, model| {
        model.adjust(profile, params).apply(p)
    });
    adjusted * chemistry_factor(profile.chemistry, params)
}

/// Effective per-game win probability with freshly drawn noise.
pub fn effective_win_probability<R: Rng + ?Sized>(
    profile: &TeamProfile,
    params: &ModelParams,
    rng: &mut R,
) -> f64 {
    GameModel::new(profile, params).sample(rng)
}

/// Playoff strength before seeding and experience bonuses.
///
/// A weighted mean of base win rate, injury impact, momentum and chemistry,
/// scaled by the clutch multiplier.
pub fn base_playoff_strength(
    profile: &TeamProfile,
    weights: &FactorWeights,
    params: &ModelParams,
) -> f64 {
    let blended = weights.base_strength * profile.base_win_rate
        + weights.injury * injury_impact(profile.injury_index, params)
        + weights.momentum * profile.momentum
        + weights.chemistry * profile.chemistry;
    let total = weights.blend_total();
    let mean = if total > 0.0 { blended / total } else { 0.0 };
    mean * clutch_multiplier(profile.clutch_factor, weights)
}

/// `clutch ^ (weight / 0.25)`: face value at the default weight, 1.0 at zero.
pub fn clutch_multiplier(clutch_factor: f64, weights: &FactorWeights) -> f64 {
    clutch_factor.powf(weights.clutch / REFERENCE_CLUTCH_WEIGHT)
}

/// Calculate the probability of side A winning a single playoff game.
///
/// Strengths are compared as a ratio; situational multipliers then scale
/// each side's relative chance.
///
/// # Arguments
/// * `strength_a` - Playoff strength of side A
/// * `strength_b` - Playoff strength of side B
/// * `relative_a` - Situational multiplier for side A (venue, pressure, rivalry)
/// * `relative_b` - Situational multiplier for side B
/// * `params` - Provides the single-game probability bounds
///
/// # Returns
/// Probability of side A winning, within the configured bounds
pub fn matchup_probability(
    strength_a: f64,
    strength_b: f64,
    relative_a: f64,
    relative_b: f64,
    params: &ModelParams,
) -> f64 {
    let total = strength_a + strength_b;
    let base = if total > 0.0 { strength_a / total } else { 0.5 };

    let a = base * relative_a;
    let b = (1.0 - base) * relative_b;
    let p = if a + b > 0.0 { a / (a + b) } else { 0.5 };
    params.clamp_probability(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::TeamAnalytics;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn profile(analytics: TeamAnalytics) -> TeamProfile {
        TeamProfile::from_analytics("A", "MLB", None, Some(&analytics), (0, 0), 1.04).0
    }

    fn scenario_profile() -> TeamProfile {
        profile(TeamAnalytics {
            base_win_rate: Some(0.60),
            strength_of_schedule: Some(0.50),
            injury_index: Some(0.95),
            momentum: Some(0.55),
            chemistry: Some(0.85),
            clutch_factor: Some(1.0),
            home_advantage: Some(1.04),
        })
    }

    #[test]
    fn test_composition_order() {
        let params = ModelParams::default();
        let p = scenario_profile();

        let expected = 0.60 * 1.0 * (1.0 + 0.55 * 0.2) * 0.95f64.powf(1.5) * (0.8 + 0.85 * 0.4);
        assert!((composed_probability(&p, &params) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_no_noise_is_deterministic() {
        let params = ModelParams {
            noise_std_dev: 0.0,
            ..ModelParams::default()
        };
        let model = GameModel::new(&scenario_profile(), &params);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(model.sample(&mut rng), model.expected_probability());
        }
    }

    #[test]
    fn test_noise_centered_on_composition() {
        let params = ModelParams::default();
        let model = GameModel::new(&scenario_profile(), &params);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let n = 20_000;
        let mean = (0..n).map(|_| model.sample(&mut rng)).sum::<f64>() / n as f64;
        assert!((mean - model.expected_probability()).abs() < 0.01);
    }

    #[test]
    fn test_equal_strength_50_50() {
        let params = ModelParams::default();
        let prob = matchup_probability(0.6, 0.6, 1.0, 1.0, &params);
        assert!((prob - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_matchup_symmetric() {
        let params = ModelParams::default();
        let p1 = matchup_probability(0.7, 0.5, 1.04, 1.1, &params);
        let p2 = matchup_probability(0.5, 0.7, 1.1, 1.04, &params);
        assert!((p1 + p2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_relative_multiplier_favors_side() {
        let params = ModelParams::default();
        let neutral = matchup_probability(0.6, 0.6, 1.0, 1.0, &params);
        let home = matchup_probability(0.6, 0.6, 1.06, 1.0, &params);
        assert!(home > neutral);
    }

    #[test]
    fn test_clutch_multiplier_weighting() {
        let weights = FactorWeights::default();
        assert!((clutch_multiplier(1.1, &weights) - 1.1).abs() < 1e-12);

        let no_clutch = FactorWeights {
            clutch: 0.0,
            ..FactorWeights::default()
        };
        assert_eq!(clutch_multiplier(1.1, &no_clutch), 1.0);
    }

    #[test]
    fn test_playoff_strength_rewards_health() {
        let weights = FactorWeights::default();
        let params = ModelParams::default();
        let healthy = scenario_profile();
        let hurt = healthy.with_injury_index(0.5);
        assert!(
            base_playoff_strength(&healthy, &weights, &params)
                > base_playoff_strength(&hurt, &weights, &params)
        );
    }

    proptest! {
        #[test]
        fn prop_game_probability_bounded(
            win in 0.0f64..=1.0,
            sos in 0.0f64..=1.0,
            injury in 0.0f64..=1.0,
            momentum in 0.0f64..=1.0,
            chemistry in 0.0f64..=1.0,
            seed in any::<u64>(),
        ) {
            let params = ModelParams::default();
            let p = profile(TeamAnalytics {
                base_win_rate: Some(win),
                strength_of_schedule: Some(sos),
                injury_index: Some(injury),
                momentum: Some(momentum),
                chemistry: Some(chemistry),
                ..TeamAnalytics::default()
            });
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let prob = effective_win_probability(&p, &params, &mut rng);
            prop_assert!((params.min_game_probability..=params.max_game_probability).contains(&prob));
        }

        #[test]
        fn prop_matchup_bounded(a in 0.0f64..2.0, b in 0.0f64..2.0, ra in 0.5f64..1.5, rb in 0.5f64..1.5) {
            let params = ModelParams::default();
            let p = matchup_probability(a, b, ra, rb, &params);
            prop_assert!((0.05..=0.95).contains(&p));
        }
    }
}
