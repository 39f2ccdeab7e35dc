use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::match_record::MatchRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonStanding {
    pub team: String,
    pub rank: u32,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: i32,
}

impl SeasonStanding {
    /// Snapshot row carrying only a points total, for standings produced
    /// outside this crate.
    pub fn with_points(team: &str, points: i32) -> Self {
        Self {
            team: team.to_string(),
            points,
            ..Self::default()
        }
    }

    pub fn goal_difference(&self) -> i32 {
        self.goals_for as i32 - self.goals_against as i32
    }

    fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        match scored.cmp(&conceded) {
            std::cmp::Ordering::Greater => {
                self.wins += 1;
                self.points += 3;
            }
            std::cmp::Ordering::Equal => {
                self.draws += 1;
                self.points += 1;
            }
            std::cmp::Ordering::Less => self.losses += 1,
        }
    }
}

/// League table for one season: points, goal difference and goals scored
/// (all descending), then team name. Ranks are 1-based positions.
pub fn compute_standings(matches: &[MatchRecord]) -> Vec<SeasonStanding> {
    let mut table: HashMap<&str, SeasonStanding> = HashMap::new();
    for m in matches {
        table
            .entry(m.home_team.as_str())
            .or_insert_with(|| SeasonStanding::with_points(&m.home_team, 0))
            .record(m.home_goals, m.away_goals);
        table
            .entry(m.away_team.as_str())
            .or_insert_with(|| SeasonStanding::with_points(&m.away_team, 0))
            .record(m.away_goals, m.home_goals);
    }

    let mut rows: Vec<SeasonStanding> = table.into_values().collect();
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
            .then_with(|| b.goals_for.cmp(&a.goals_for))
            .then_with(|| a.team.cmp(&b.team))
    });
    for (row, rank) in rows.iter_mut().zip(1u32..) {
        row.rank = rank;
    }
    rows
}
