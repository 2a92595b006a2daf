use rand::Rng;

use crate::factors::ModelParams;
use crate::team::TeamProfile;
use crate::win_prob::GameModel;

/// Simulate a team's remaining regular-season games.
///
/// Each game is one Bernoulli trial at the effective win probability, with
/// noise redrawn per game. Returns wins in `[0, remaining_games]`.
pub fn simulate_remaining_games<R: Rng + ?Sized>(
    profile: &TeamProfile,
    remaining_games: u32,
    params: &ModelParams,
    rng: &mut R,
) -> u32 {
    simulate_with_model(&GameModel::new(profile, params), remaining_games, rng)
}

/// Same as [`simulate_remaining_games`] with a prebuilt game model.
pub fn simulate_with_model<R: Rng + ?Sized>(
    model: &GameModel,
    remaining_games: u32,
    rng: &mut R,
) -> u32 {
    let mut wins = 0;
    for _ in 0..remaining_games {
        let p = model.sample(rng);
        if rng.gen::<f64>() < p {
            wins += 1;
        }
    }
    wins
}

/// Expected wins over the remaining games, ignoring noise.
pub fn expected_remaining_wins(model: &GameModel, remaining_games: u32) -> f64 {
    model.expected_probability() * remaining_games as f64
}
