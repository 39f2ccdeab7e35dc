use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// A result row as it comes out of a source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMatchRow {
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub date: Option<NaiveDateTime>,
}

/// One played fixture. Built once per raw row and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub date: NaiveDateTime,
    pub league_key: String,
    pub season: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

pub fn classify_outcome(home_goals: u32, away_goals: u32) -> Outcome {
    if home_goals > away_goals {
        Outcome::Home
    } else if home_goals < away_goals {
        Outcome::Away
    } else {
        Outcome::Draw
    }
}

impl MatchRecord {
    /// Validates a raw row. `row` is the 0-based index within its batch and
    /// only feeds the error message.
    pub fn from_raw(
        raw: &RawMatchRow,
        league_key: &str,
        season: &str,
        row: usize,
    ) -> Result<Self, PipelineError> {
        let malformed = |reason: &str| PipelineError::MalformedRecord {
            league: league_key.to_string(),
            season: season.to_string(),
            row,
            reason: reason.to_string(),
        };

        let home_team = raw.home_team.trim();
        let away_team = raw.away_team.trim();
        if home_team.is_empty() || away_team.is_empty() {
            return Err(malformed("missing team name"));
        }
        if home_team == away_team {
            return Err(malformed("team plays itself"));
        }
        let (Some(home_goals), Some(away_goals)) = (raw.home_goals, raw.away_goals) else {
            return Err(malformed("missing goal counts"));
        };
        let Some(date) = raw.date else {
            return Err(malformed("missing date"));
        };

        Ok(Self {
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_goals,
            away_goals,
            date,
            league_key: league_key.to_string(),
            season: season.to_string(),
        })
    }

    pub fn outcome(&self) -> Outcome {
        classify_outcome(self.home_goals, self.away_goals)
    }

    /// 1.0 / 0.5 / 0.0 from the home side's point of view.
    pub fn actual_home_score(&self) -> f64 {
        match self.outcome() {
            Outcome::Home => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Away => 0.0,
        }
    }

    /// League points earned by (home, away).
    pub fn points(&self) -> (u32, u32) {
        match self.outcome() {
            Outcome::Home => (3, 0),
            Outcome::Draw => (1, 1),
            Outcome::Away => (0, 3),
        }
    }

    pub fn goal_margin(&self) -> u32 {
        self.home_goals.abs_diff(self.away_goals)
    }
}

/// Validates a whole batch, splitting it into usable records and the errors
/// for the rows that were dropped.
pub fn validate_batch(
    rows: &[RawMatchRow],
    league_key: &str,
    season: &str,
) -> (Vec<MatchRecord>, Vec<PipelineError>) {
    let mut records = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();
    for (idx, raw) in rows.iter().enumerate() {
        match MatchRecord::from_raw(raw, league_key, season, idx) {
            Ok(record) => records.push(record),
            Err(err) => errors.push(err),
        }
    }
    (records, errors)
}
