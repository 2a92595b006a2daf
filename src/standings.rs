use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{Result, SimulationError};
use crate::team::TeamAnalytics;

/// One team's record at simulation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsEntry {
    pub team_code: String,
    #[serde(default)]
    pub division: Option<String>,
    pub wins: u32,
    pub losses: u32,
    pub games_remaining: u32,
}

impl StandingsEntry {
    pub fn new(team_code: &str, wins: u32, losses: u32, games_remaining: u32) -> Self {
        StandingsEntry {
            team_code: team_code.to_string(),
            division: None,
            wins,
            losses,
            games_remaining,
        }
    }

    pub fn in_division(mut self, division: &str) -> Self {
        self.division = Some(division.to_string());
        self
    }

    pub fn games_played(&self) -> u32 {
        self.wins.saturating_add(self.losses)
    }

    /// Most wins reachable by winning every remaining game.
    pub fn max_wins(&self) -> u32 {
        self.wins.saturating_add(self.games_remaining)
    }
}

/// Standings for one league.
///
/// Entry order is the standings order, used to break ties in projected wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueStandings {
    pub league: String,
    pub entries: Vec<StandingsEntry>,
}

impl LeagueStandings {
    pub fn new(league: &str, entries: Vec<StandingsEntry>) -> Self {
        LeagueStandings {
            league: league.to_string(),
            entries,
        }
    }

    pub fn get(&self, team_code: &str) -> Option<&StandingsEntry> {
        self.entries.iter().find(|e| e.team_code == team_code)
    }

    pub fn position(&self, team_code: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.team_code == team_code)
    }

    pub fn team_codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.team_code.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| SimulationError::InvalidStandings {
            league: self.league.clone(),
            reason,
        };
        if self.entries.is_empty() {
            return Err(invalid("no teams in standings".to_string()));
        }
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.team_code.as_str()) {
                return Err(invalid(format!("duplicate team code {}", entry.team_code)));
            }
        }
        Ok(())
    }
}

/// Everything the data provider hands over for one league and one batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueSnapshot {
    pub standings: LeagueStandings,

    /// Raw analytics keyed by team code; teams without an entry get defaults
    #[serde(default)]
    pub analytics: HashMap<String, TeamAnalytics>,
}

impl LeagueSnapshot {
    pub fn new(standings: LeagueStandings) -> Self {
        LeagueSnapshot {
            standings,
            analytics: HashMap::new(),
        }
    }

    pub fn with_analytics(mut self, team_code: &str, analytics: TeamAnalytics) -> Self {
        self.analytics.insert(team_code.to_string(), analytics);
        self
    }

    pub fn league(&self) -> &str {
        &self.standings.league
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
