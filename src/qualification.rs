//! Playoff qualification and seeding.
//!
//! Teams are ranked by projected final wins, with ties broken by their
//! position in the current standings. Division winners, when the format
//! reserves spots for them, are seeded ahead of the rest of the field.

use crate::format::PlayoffFormat;

/// One team's projected season total.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedTeam<'a> {
    pub team_code: &'a str,
    pub division: Option<&'a str>,

    /// Position in the current standings; lower ranks first on ties
    pub standings_position: usize,

    pub projected_wins: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeededTeam<'a> {
    pub team: ProjectedTeam<'a>,
    pub seed: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Qualification {
    pub qualified: bool,
    pub seed: Option<u32>,
}

impl Qualification {
    pub const ELIMINATED: Qualification = Qualification {
        qualified: false,
        seed: None,
    };

    fn seeded(seed: u32) -> Self {
        Qualification {
            qualified: true,
            seed: Some(seed),
        }
    }
}

/// Rank the league and return the playoff field in seed order.
pub fn resolve_field<'a>(
    projected: &[ProjectedTeam<'a>],
    format: &PlayoffFormat,
) -> Vec<SeededTeam<'a>> {
    let mut order: Vec<ProjectedTeam<'a>> = projected.to_vec();
    order.sort_by(|a, b| {
        b.projected_wins
            .total_cmp(&a.projected_wins)
            .then(a.standings_position.cmp(&b.standings_position))
    });

    let spots = (format.total_spots as usize).min(order.len());
    let mut field: Vec<ProjectedTeam<'a>> = Vec::with_capacity(spots);

    if format.division_winner_spots > 0 {
        let mut divisions: Vec<&str> = Vec::new();
        for team in &order {
            if field.len() == format.division_winner_spots as usize {
                break;
            }
            if let Some(division) = team.division {
                if !divisions.contains(&division) {
                    divisions.push(division);
                    field.push(*team);
                }
            }
        }
    }

    for team in &order {
        if field.len() >= spots {
            break;
        }
        if !field
            .iter()
            .any(|f| f.standings_position == team.standings_position)
        {
            field.push(*team);
        }
    }

    field
        .into_iter()
        .enumerate()
        .map(|(i, team)| SeededTeam {
            team,
            seed: i as u32 + 1,
        })
        .collect()
}

/// Decide whether a team makes the playoffs and at which seed.
pub fn resolve_qualification(
    team_code: &str,
    projected: &[ProjectedTeam<'_>],
    format: &PlayoffFormat,
) -> Qualification {
    resolve_field(projected, format)
        .iter()
        .find(|s| s.team.team_code == team_code)
        .map_or(Qualification::ELIMINATED, |s| Qualification::seeded(s.seed))
}

/// True when the team misses the field even after winning out.
///
/// `projected` holds the other teams' projections; the team's own entry is
/// evaluated at `max_wins`.
pub fn is_mathematically_eliminated(
    team_code: &str,
    max_wins: u32,
    projected: &[ProjectedTeam<'_>],
    format: &PlayoffFormat,
) -> bool {
    let best_case: Vec<ProjectedTeam<'_>> = projected
        .iter()
        .map(|t| {
            if t.team_code == team_code {
                ProjectedTeam {
                    projected_wins: max_wins as f64,
                    ..*t
                }
            } else {
                *t
            }
        })
        .collect();
    !resolve_qualification(team_code, &best_case, format).qualified
}
