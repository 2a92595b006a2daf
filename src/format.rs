//! Playoff format registry.
//!
//! Static per-league configuration: how many teams qualify, how many spots
//! are reserved for division winners, which seeds get byes, and the round
//! sequence with its series lengths. Loaded once and never mutated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, SimulationError};
use crate::factors::{FactorWeights, ModelParams};

/// Number of games in a playoff round. Always odd.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SeriesLengthRepr", into = "u32")]
pub struct SeriesLength(u32);

#[derive(Deserialize)]
#[serde(untagged)]
enum SeriesLengthRepr {
    Games(u32),
    Label(String),
}

impl TryFrom<SeriesLengthRepr> for SeriesLength {
    type Error = String;

    fn try_from(repr: SeriesLengthRepr) -> std::result::Result<Self, Self::Error> {
        let games = match repr {
            SeriesLengthRepr::Games(n) => n,
            SeriesLengthRepr::Label(label) => parse_series_label(&label)?,
        };
        SeriesLength::new(games)
    }
}

impl From<SeriesLength> for u32 {
    fn from(length: SeriesLength) -> u32 {
        length.0
    }
}

/// Accepts "best-of-7", "best of 7", "bo7", "7" and "single"/"single-game".
fn parse_series_label(label: &str) -> std::result::Result<u32, String> {
    let normalized = label.trim().to_ascii_lowercase();
    if normalized == "single" || normalized == "single-game" || normalized == "single game" {
        return Ok(1);
    }
    let digits = normalized
        .strip_prefix("best-of-")
        .or_else(|| normalized.strip_prefix("best of "))
        .or_else(|| normalized.strip_prefix("bo"))
        .unwrap_or(&normalized);
    digits
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("unrecognized series length: {label:?}"))
}

impl SeriesLength {
    pub const SINGLE_GAME: SeriesLength = SeriesLength(1);

    pub fn new(games: u32) -> std::result::Result<Self, String> {
        if games == 0 || games % 2 == 0 {
            return Err(format!("series length must be odd and positive, got {games}"));
        }
        Ok(SeriesLength(games))
    }

    pub fn games(self) -> u32 {
        self.0
    }

    /// Wins needed to take the series, `ceil(N / 2)`.
    pub fn wins_needed(self) -> u32 {
        self.0 / 2 + 1
    }

    pub fn is_single_game(self) -> bool {
        self.0 == 1
    }
}

impl fmt::Display for SeriesLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_game() {
            write!(f, "single game")
        } else {
            write!(f, "best-of-{}", self.0)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub name: String,
    pub series_length: SeriesLength,

    /// No home side; venue advantage is ignored
    #[serde(default)]
    pub neutral_site: bool,
}

impl Round {
    pub fn new(name: &str, games: u32) -> std::result::Result<Self, String> {
        Ok(Round {
            name: name.to_string(),
            series_length: SeriesLength::new(games)?,
            neutral_site: false,
        })
    }

    pub fn neutral(mut self) -> Self {
        self.neutral_site = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayoffFormat {
    pub league: String,
    pub total_spots: u32,
    #[serde(default)]
    pub division_winner_spots: u32,

    /// Top seeds that skip the first round
    #[serde(default)]
    pub byes: u32,

    pub rounds: Vec<Round>,
}

impl PlayoffFormat {
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| {
            Err(SimulationError::InvalidFormat {
                league: self.league.clone(),
                reason,
            })
        };

        if self.league.trim().is_empty() {
            return fail("league name is empty".to_string());
        }
        if self.total_spots < 2 {
            return fail(format!("total spots must be at least 2, got {}", self.total_spots));
        }
        if self.rounds.is_empty() {
            return fail("at least one round is required".to_string());
        }
        if self.division_winner_spots > self.total_spots {
            return fail(format!(
                "division winner spots ({}) exceed total spots ({})",
                self.division_winner_spots, self.total_spots
            ));
        }
        if self.byes >= self.total_spots {
            return fail(format!(
                "byes ({}) must be fewer than total spots ({})",
                self.byes, self.total_spots
            ));
        }
        if self.byes > 0 && self.rounds.len() < 2 {
            return fail("byes require at least two rounds".to_string());
        }
        Ok(())
    }

    /// Index of the first round a seed plays in.
    pub fn entry_round(&self, seed: u32) -> usize {
        if seed <= self.byes {
            1
        } else {
            0
        }
    }
}

fn default_home_advantage() -> f64 {
    1.04
}

/// Everything configured for one league.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueConfig {
    #[serde(flatten)]
    pub format: PlayoffFormat,

    #[serde(default = "default_home_advantage")]
    pub home_advantage: f64,

    #[serde(default)]
    pub weights: FactorWeights,

    #[serde(default)]
    pub model: ModelParams,
}

impl LeagueConfig {
    pub fn new(format: PlayoffFormat, home_advantage: f64) -> Self {
        LeagueConfig {
            format,
            home_advantage,
            weights: FactorWeights::default(),
            model: ModelParams::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.format.validate()?;
        let invalid = |reason: String| SimulationError::InvalidFormat {
            league: self.format.league.clone(),
            reason,
        };
        if !self.home_advantage.is_finite() || self.home_advantage < 1.0 {
            return Err(invalid(format!(
                "home advantage must be at least 1.0, got {}",
                self.home_advantage
            )));
        }
        self.weights.validate().map_err(invalid)?;
        self.model.validate().map_err(invalid)?;
        Ok(())
    }
}

/// Lookup of league configurations by league code (case-insensitive).
#[derive(Clone, Debug, Default)]
pub struct FormatRegistry {
    leagues: BTreeMap<String, LeagueConfig>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry validated from a set of league configs.
    pub fn from_configs(configs: impl IntoIterator<Item = LeagueConfig>) -> Result<Self> {
        let mut registry = FormatRegistry::new();
        for config in configs {
            registry.insert(config)?;
        }
        Ok(registry)
    }

    /// Parse a JSON array of league configs.
    pub fn from_json(json: &str) -> Result<Self> {
        let configs: Vec<LeagueConfig> = serde_json::from_str(json)?;
        Self::from_configs(configs)
    }

    pub fn insert(&mut self, config: LeagueConfig) -> Result<()> {
        config.validate()?;
        self.leagues.insert(league_key(&config.format.league), config);
        Ok(())
    }

    pub fn get(&self, league: &str) -> Result<&LeagueConfig> {
        self.leagues
            .get(&league_key(league))
            .ok_or_else(|| SimulationError::UnknownLeague(league.to_string()))
    }

    pub fn get_format(&self, league: &str) -> Result<&PlayoffFormat> {
        self.get(league).map(|config| &config.format)
    }

    pub fn leagues(&self) -> impl Iterator<Item = &str> {
        self.leagues.values().map(|c| c.format.league.as_str())
    }

    pub fn len(&self) -> usize {
        self.leagues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
    }

    /// Formats for MLB, NFL, NBA, NHL and the college football playoff.
    pub fn builtin() -> Self {
        let configs = [
            builtin_league(
                "MLB",
                12,
                6,
                4,
                &[
                    ("Wild Card Series", 3, false),
                    ("Division Series", 5, false),
                    ("League Championship Series", 7, false),
                    ("World Series", 7, false),
                ],
                1.04,
            ),
            builtin_league(
                "NFL",
                14,
                8,
                2,
                &[
                    ("Wild Card", 1, false),
                    ("Divisional", 1, false),
                    ("Conference Championship", 1, false),
                    ("Super Bowl", 1, true),
                ],
                1.06,
            ),
            builtin_league(
                "NBA",
                16,
                0,
                0,
                &[
                    ("First Round", 7, false),
                    ("Conference Semifinals", 7, false),
                    ("Conference Finals", 7, false),
                    ("NBA Finals", 7, false),
                ],
                1.06,
            ),
            builtin_league(
                "NHL",
                16,
                0,
                0,
                &[
                    ("First Round", 7, false),
                    ("Second Round", 7, false),
                    ("Conference Final", 7, false),
                    ("Stanley Cup Final", 7, false),
                ],
                1.05,
            ),
            builtin_league(
                "NCAAF",
                12,
                5,
                4,
                &[
                    ("First Round", 1, false),
                    ("Quarterfinal", 1, true),
                    ("Semifinal", 1, true),
                    ("National Championship", 1, true),
                ],
                1.08,
            ),
        ];

        let leagues = configs
            .into_iter()
            .map(|c| (league_key(&c.format.league), c))
            .collect();
        FormatRegistry { leagues }
    }
}

fn builtin_league(
    name: &str,
    total_spots: u32,
    division_winner_spots: u32,
    byes: u32,
    rounds: &[(&str, u32, bool)],
    home_advantage: f64,
) -> LeagueConfig {
    let rounds = rounds
        .iter()
        .map(|&(round, games, neutral_site)| Round {
            name: round.to_string(),
            series_length: SeriesLength(games),
            neutral_site,
        })
        .collect();
    LeagueConfig::new(
        PlayoffFormat {
            league: name.to_string(),
            total_spots,
            division_winner_spots,
            byes,
            rounds,
        },
        home_advantage,
    )
}

fn league_key(league: &str) -> String {
    league.trim().to_ascii_uppercase()
}
