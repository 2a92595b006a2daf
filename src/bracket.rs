//! Playoff bracket simulation for one qualified team.
//!
//! The team moves through the format's rounds as a small state machine:
//! it enters at its seed's entry round, each round is a single game or a
//! best-of-N series against an opponent drawn from the rest of the field,
//! and the run ends eliminated or champion.

use rand::Rng;

use crate::factors::{division_rivalry, ModelParams};
use crate::format::{PlayoffFormat, SeriesLength};
use crate::team::TeamProfile;
use crate::win_prob::matchup_probability;

/// A seeded team in the playoff field.
#[derive(Clone, Copy, Debug)]
pub struct PlayoffEntrant<'a> {
    pub profile: &'a TeamProfile,

    /// Playoff strength before seed and experience bonuses
    pub strength: f64,

    pub seed: u32,
}

impl PlayoffEntrant<'_> {
    /// Strength entering a round after `rounds_won` series wins.
    pub fn round_strength(&self, rounds_won: u32, params: &ModelParams) -> f64 {
        self.strength
            * params.seed_bonus(self.seed)
            * params.experience_bonus.powi(rounds_won as i32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BracketState {
    Advancing(usize),
    Eliminated { round: usize },
    Champion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BracketOutcome {
    /// Rounds cleared, byes included
    pub rounds_advanced: u32,
    pub champion: bool,
}

/// One side of a series, from the simulated team's point of view.
#[derive(Clone, Copy, Debug)]
struct Side {
    strength: f64,
    home_advantage: f64,
    rivalry: f64,
}

/// Whether the better seed hosts a given game (0-based) of a series.
///
/// Series of five or more games use a 2-2-1-1-1 pattern; shorter series are
/// played entirely at the better seed's venue.
pub fn better_seed_hosts(length: SeriesLength, game: u32) -> bool {
    if length.games() <= 3 {
        return true;
    }
    match game {
        0 | 1 => true,
        2 | 3 => false,
        n => (n - 4) % 2 == 0,
    }
}

/// Simulate one series. Returns true when the team wins it.
fn simulate_series<R: Rng + ?Sized>(
    team: Side,
    opponent: Side,
    team_is_better_seed: bool,
    neutral_site: bool,
    length: SeriesLength,
    params: &ModelParams,
    rng: &mut R,
) -> bool {
    let needed = length.wins_needed();
    let (mut team_wins, mut opp_wins) = (0, 0);
    let mut game = 0;

    while team_wins < needed && opp_wins < needed {
        let mut team_rel = team.rivalry;
        let mut opp_rel = opponent.rivalry;

        if !neutral_site {
            if better_seed_hosts(length, game) == team_is_better_seed {
                team_rel *= team.home_advantage;
            } else {
                opp_rel *= opponent.home_advantage;
            }
        }

        if !length.is_single_game() {
            if opp_wins == needed - 1 && team_wins < opp_wins {
                team_rel *= params.elimination_pressure;
                opp_rel *= params.clinch_pressure;
            } else if team_wins == needed - 1 && opp_wins < team_wins {
                team_rel *= params.clinch_pressure;
                opp_rel *= params.elimination_pressure;
            }
        }

        let p = matchup_probability(team.strength, opponent.strength, team_rel, opp_rel, params);
        if rng.gen::<f64>() < p {
            team_wins += 1;
        } else {
            opp_wins += 1;
        }
        game += 1;
    }

    team_wins == needed
}

/// Simulate a qualified team's playoff run.
///
/// # Arguments
/// * `team` - The simulated team, already seeded
/// * `field` - The other playoff teams; each round's opponent is drawn from
///   those that have entered the bracket by that round
/// * `format` - Round sequence and byes
/// * `params` - Seed, experience and pressure multipliers
/// * `rng` - Random source for this trial
pub fn simulate_bracket<R: Rng + ?Sized>(
    team: &PlayoffEntrant<'_>,
    field: &[PlayoffEntrant<'_>],
    format: &PlayoffFormat,
    params: &ModelParams,
    rng: &mut R,
) -> BracketOutcome {
    let entry_round = format.entry_round(team.seed);
    let mut pool: Vec<&PlayoffEntrant<'_>> = field.iter().collect();
    let mut rounds_won = 0;
    let mut state = BracketState::Advancing(entry_round);

    loop {
        state = match state {
            BracketState::Champion => {
                return BracketOutcome {
                    rounds_advanced: format.rounds.len() as u32,
                    champion: true,
                }
            }
            BracketState::Eliminated { round } => {
                return BracketOutcome {
                    rounds_advanced: round as u32,
                    champion: false,
                }
            }
            BracketState::Advancing(round_index) => match format.rounds.get(round_index) {
                None => BracketState::Champion,
                Some(round) => {
                    // Bye seeds are only drawn once they have entered the bracket.
                    let eligible: Vec<usize> = pool
                        .iter()
                        .enumerate()
                        .filter(|(_, o)| format.entry_round(o.seed) <= round_index)
                        .map(|(i, _)| i)
                        .collect();
                    let won = if eligible.is_empty() {
                        true
                    } else {
                        let pick = eligible[rng.gen_range(0..eligible.len())];
                        let opponent = pool.swap_remove(pick);
                        let opponent_rounds_won =
                            round_index.saturating_sub(format.entry_round(opponent.seed)) as u32;

                        let team_side = Side {
                            strength: team.round_strength(rounds_won, params),
                            home_advantage: team.profile.home_advantage_multiplier,
                            rivalry: division_rivalry(team.profile, opponent.profile, params),
                        };
                        let opponent_side = Side {
                            strength: opponent.round_strength(opponent_rounds_won, params),
                            home_advantage: opponent.profile.home_advantage_multiplier,
                            rivalry: division_rivalry(opponent.profile, team.profile, params),
                        };

                        simulate_series(
                            team_side,
                            opponent_side,
                            team.seed < opponent.seed,
                            round.neutral_site,
                            round.series_length,
                            params,
                            rng,
                        )
                    };

                    if won {
                        rounds_won += 1;
                        BracketState::Advancing(round_index + 1)
                    } else {
                        BracketState::Eliminated { round: round_index }
                    }
                }
            },
        };
    }
}
