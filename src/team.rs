use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    CLUTCH_RANGE, HOME_ADVANTAGE_RANGE, NEUTRAL_CHEMISTRY, NEUTRAL_CLUTCH, NEUTRAL_INJURY_INDEX,
    NEUTRAL_MOMENTUM, NEUTRAL_STRENGTH_OF_SCHEDULE, NEUTRAL_WIN_RATE,
};

/// Raw per-team analytics as supplied by the league data provider.
///
/// Every field is optional; anything missing or non-finite falls back to a
/// neutral default when the profile is built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamAnalytics {
    pub base_win_rate: Option<f64>,
    pub strength_of_schedule: Option<f64>,
    pub injury_index: Option<f64>,
    pub momentum: Option<f64>,
    pub chemistry: Option<f64>,
    pub clutch_factor: Option<f64>,
    pub home_advantage: Option<f64>,
}

/// Profile attribute that can fall back to a default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
    BaseWinRate,
    StrengthOfSchedule,
    InjuryIndex,
    Momentum,
    Chemistry,
    ClutchFactor,
    HomeAdvantage,
}

impl ProfileField {
    pub fn name(self) -> &'static str {
        match self {
            ProfileField::BaseWinRate => "baseWinRate",
            ProfileField::StrengthOfSchedule => "strengthOfSchedule",
            ProfileField::InjuryIndex => "injuryIndex",
            ProfileField::Momentum => "momentum",
            ProfileField::Chemistry => "chemistry",
            ProfileField::ClutchFactor => "clutchFactor",
            ProfileField::HomeAdvantage => "homeAdvantage",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Normalized team attributes consumed by the simulation.
///
/// All values are clamped to their documented ranges at construction, so the
/// simulation never has to re-check them. Read-only for the duration of a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProfile {
    pub team_code: String,
    pub league: String,
    pub division: Option<String>,

    /// Underlying win rate in [0, 1]
    pub base_win_rate: f64,

    /// Opponent quality in [0, 1]; higher is tougher
    pub strength_of_schedule: f64,

    /// Roster health in [0, 1]; 1.0 is fully healthy
    pub injury_index: f64,

    pub momentum: f64,
    pub chemistry: f64,

    /// Late-game performance multiplier in [0.85, 1.15]
    pub clutch_factor: f64,

    pub home_advantage_multiplier: f64,
}

impl TeamProfile {
    /// Build a profile from raw analytics, falling back to neutral defaults.
    ///
    /// A missing win rate is taken from the team's current record when any
    /// games have been played. Returns the profile together with the fields
    /// that had to be defaulted.
    pub fn from_analytics(
        team_code: &str,
        league: &str,
        division: Option<&str>,
        analytics: Option<&TeamAnalytics>,
        record: (u32, u32),
        league_home_advantage: f64,
    ) -> (Self, Vec<ProfileField>) {
        let empty = TeamAnalytics::default();
        let raw = analytics.unwrap_or(&empty);
        let mut defaulted = Vec::new();

        let mut pick = |value: Option<f64>, field: ProfileField, fallback: f64| match value {
            Some(v) if v.is_finite() => v,
            _ => {
                defaulted.push(field);
                fallback
            }
        };

        let (wins, losses) = (record.0 as f64, record.1 as f64);
        let base_win_rate = match raw.base_win_rate {
            Some(v) if v.is_finite() => v,
            _ if wins + losses > 0.0 => wins / (wins + losses),
            _ => pick(None, ProfileField::BaseWinRate, NEUTRAL_WIN_RATE),
        };

        let profile = TeamProfile {
            team_code: team_code.to_string(),
            league: league.to_string(),
            division: division.map(str::to_string),
            base_win_rate: unit(base_win_rate),
            strength_of_schedule: unit(pick(
                raw.strength_of_schedule,
                ProfileField::StrengthOfSchedule,
                NEUTRAL_STRENGTH_OF_SCHEDULE,
            )),
            injury_index: unit(pick(
                raw.injury_index,
                ProfileField::InjuryIndex,
                NEUTRAL_INJURY_INDEX,
            )),
            momentum: unit(pick(raw.momentum, ProfileField::Momentum, NEUTRAL_MOMENTUM)),
            chemistry: unit(pick(raw.chemistry, ProfileField::Chemistry, NEUTRAL_CHEMISTRY)),
            clutch_factor: pick(raw.clutch_factor, ProfileField::ClutchFactor, NEUTRAL_CLUTCH)
                .clamp(CLUTCH_RANGE.0, CLUTCH_RANGE.1),
            home_advantage_multiplier: pick(
                raw.home_advantage,
                ProfileField::HomeAdvantage,
                league_home_advantage,
            )
            .clamp(HOME_ADVANTAGE_RANGE.0, HOME_ADVANTAGE_RANGE.1),
        };

        (profile, defaulted)
    }

    /// Copy with a different injury index (clamped).
    pub fn with_injury_index(&self, injury_index: f64) -> Self {
        TeamProfile {
            injury_index: unit(injury_index),
            ..self.clone()
        }
    }
}

fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
