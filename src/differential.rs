use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::match_record::MatchRecord;
use crate::ranking::desc_then_name;
use crate::standings::SeasonStanding;

/// Year-over-year swing for one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifferentialResult {
    pub team: String,
    pub previous_rank_metric: i32,
    pub current_rank_metric: i32,
    pub cumulative: i32,
    pub season: String,
}

/// Built-in scoring functions for [`analyze`]. Anything else goes through
/// [`analyze_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Points,
    GoalDifference,
}

impl Metric {
    pub fn score(self, standing: &SeasonStanding) -> i32 {
        match self {
            Metric::Points => standing.points,
            Metric::GoalDifference => standing.goal_difference(),
        }
    }
}

/// How a league's two seasons are compared by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifferentialMode {
    /// Season totals, see [`analyze`].
    Standings(Metric),
    /// Fixture by fixture, see [`analyze_fixtures`].
    SameFixtures,
}

impl Default for DifferentialMode {
    fn default() -> Self {
        DifferentialMode::Standings(Metric::Points)
    }
}

impl DifferentialMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "points" => Some(DifferentialMode::Standings(Metric::Points)),
            "goal_difference" | "gd" => Some(DifferentialMode::Standings(Metric::GoalDifference)),
            "fixtures" | "same_fixtures" => Some(DifferentialMode::SameFixtures),
            _ => None,
        }
    }
}

pub fn analyze(
    current: &[SeasonStanding],
    previous: &[SeasonStanding],
    season: &str,
    metric: Metric,
) -> Vec<DifferentialResult> {
    analyze_with(current, previous, season, |s| metric.score(s))
}

/// Compares two snapshots of the same league. Only teams present in both
/// are returned; a promoted or relegated team has no second data point and is
/// left out rather than zero-filled. Snapshots are keyed by team name and a
/// repeated name keeps its last row. Output order is unspecified, see
/// [`latest_standings`].
pub fn analyze_with<F>(
    current: &[SeasonStanding],
    previous: &[SeasonStanding],
    season: &str,
    score: F,
) -> Vec<DifferentialResult>
where
    F: Fn(&SeasonStanding) -> i32,
{
    let previous: HashMap<&str, &SeasonStanding> =
        previous.iter().map(|s| (s.team.as_str(), s)).collect();
    let current: HashMap<&str, &SeasonStanding> =
        current.iter().map(|s| (s.team.as_str(), s)).collect();

    current
        .into_iter()
        .filter_map(|(team, cur)| {
            let prev = *previous.get(team)?;
            let previous_rank_metric = score(prev);
            let current_rank_metric = score(cur);
            Some(DifferentialResult {
                team: team.to_string(),
                previous_rank_metric,
                current_rank_metric,
                cumulative: current_rank_metric - previous_rank_metric,
                season: season.to_string(),
            })
        })
        .collect()
}

/// Same-fixture point swing: every current fixture whose (home, away) pairing
/// was also played last season moves both sides by `points_now - points_then`.
/// Teams without any comparable fixture are left out. The rank metrics hold
/// the points taken over the compared fixtures only.
pub fn analyze_fixtures(
    current: &[MatchRecord],
    previous: &[MatchRecord],
    season: &str,
) -> Vec<DifferentialResult> {
    let previous: HashMap<(&str, &str), &MatchRecord> = previous
        .iter()
        .map(|m| ((m.home_team.as_str(), m.away_team.as_str()), m))
        .collect();

    // team -> (points then, points now)
    let mut acc: HashMap<&str, (i32, i32)> = HashMap::new();
    for m in current {
        let Some(prev) = previous.get(&(m.home_team.as_str(), m.away_team.as_str())) else {
            continue;
        };
        let (now_home, now_away) = m.points();
        let (then_home, then_away) = prev.points();

        let home = acc.entry(m.home_team.as_str()).or_default();
        home.0 += then_home as i32;
        home.1 += now_home as i32;
        let away = acc.entry(m.away_team.as_str()).or_default();
        away.0 += then_away as i32;
        away.1 += now_away as i32;
    }

    acc.into_iter()
        .map(|(team, (then, now))| DifferentialResult {
            team: team.to_string(),
            previous_rank_metric: then,
            current_rank_metric: now,
            cumulative: now - then,
            season: season.to_string(),
        })
        .collect()
}

/// Ranks results by `cumulative` descending, ties by team name. The first row
/// is the most improved team, the last the biggest decline.
pub fn latest_standings(mut results: Vec<DifferentialResult>) -> Vec<DifferentialResult> {
    results.sort_by(|a, b| {
        desc_then_name((a.cumulative, a.team.as_str()), (b.cumulative, b.team.as_str()))
    });
    results
}
