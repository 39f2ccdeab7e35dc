use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::match_record::{MatchRecord, RawMatchRow, validate_batch};
use crate::ranking::desc_f64_then_name;

pub const BASELINE_RATING: f64 = 1500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloConfig {
    pub k: f64,
    pub home_adv_pts: f64,
    pub baseline: f64,
    // Matches a team must play before it leaves the provisional K.
    // 0 disables tapering.
    pub provisional_games: u32,
    pub provisional_k: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k: 20.0,
            home_adv_pts: 60.0,
            baseline: BASELINE_RATING,
            provisional_games: 0,
            provisional_k: 32.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    pub team: String,
    pub rating: f64,
    pub games_played: u32,
}

/// One processed match, as it looked before and after the update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingHistoryEntry {
    pub date: NaiveDateTime,
    pub league: String,
    pub season: String,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub home_rating_pre: f64,
    pub away_rating_pre: f64,
    pub home_rating_post: f64,
    pub away_rating_post: f64,
    pub expected_home_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRow {
    pub rank: u32,
    pub team: String,
    pub rating: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub ordering_violations: usize,
}

/// One league-season worth of raw rows, used by the strict replay mode.
#[derive(Debug, Clone)]
pub struct SeasonBatch {
    pub league_key: String,
    pub season: String,
    pub rows: Vec<RawMatchRow>,
}

/// Owned rating state for one pipeline run.
///
/// Batches are applied in the order they are fed. The tracker never re-sorts
/// across calls, so callers must feed each league's seasons oldest first.
/// Leagues of one season overlap in time, so in this mode ordering is only
/// checked within a league: a match dated before the latest one already
/// applied for the same league is still processed but counted as an ordering
/// violation. [`RatingTracker::replay_chronological`] applies a strict global
/// date order and checks against the latest match of any league.
#[derive(Debug, Clone, Default)]
pub struct RatingTracker {
    cfg: EloConfig,
    ratings: HashMap<String, TeamRating>,
    history: Vec<RatingHistoryEntry>,
    latest_date: Option<NaiveDateTime>,
    league_latest: HashMap<String, NaiveDateTime>,
    ordering_violations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrderScope {
    League,
    Global,
}

impl RatingTracker {
    pub fn new(cfg: EloConfig) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    pub fn config(&self) -> EloConfig {
        self.cfg
    }

    /// Applies one league-season in the given order. Rows with missing
    /// teams, goals or date are skipped and leave no history.
    pub fn process_season_batch(
        &mut self,
        rows: &[RawMatchRow],
        season: &str,
        league_key: &str,
    ) -> BatchSummary {
        let (records, errors) = validate_batch(rows, league_key, season);
        for err in &errors {
            warn!("skipping row: {err}");
        }

        let violations_before = self.ordering_violations;
        for record in &records {
            self.apply_in(record, OrderScope::League);
        }

        let summary = BatchSummary {
            processed: records.len(),
            skipped: errors.len(),
            ordering_violations: self.ordering_violations - violations_before,
        };
        debug!(
            league = league_key,
            season,
            processed = summary.processed,
            skipped = summary.skipped,
            "rating batch applied"
        );
        summary
    }

    /// Merges several league-seasons and applies them sorted by match date.
    /// The sort is stable, so same-day matches keep their feed order. Returns
    /// one summary per input batch.
    pub fn replay_chronological(&mut self, batches: &[SeasonBatch]) -> Vec<BatchSummary> {
        let mut summaries = vec![BatchSummary::default(); batches.len()];
        let mut tagged = Vec::new();
        for (idx, batch) in batches.iter().enumerate() {
            let (valid, errors) = validate_batch(&batch.rows, &batch.league_key, &batch.season);
            for err in &errors {
                warn!("skipping row: {err}");
            }
            summaries[idx].skipped = errors.len();
            tagged.extend(valid.into_iter().map(|record| (idx, record)));
        }
        tagged.sort_by(|a, b| a.1.date.cmp(&b.1.date));

        for (idx, record) in &tagged {
            let violations_before = self.ordering_violations;
            self.apply_in(record, OrderScope::Global);
            summaries[*idx].processed += 1;
            summaries[*idx].ordering_violations += self.ordering_violations - violations_before;
        }
        summaries
    }

    /// Applies a single validated match and returns its history entry.
    /// Ordering is checked against earlier matches of the same league.
    pub fn apply(&mut self, m: &MatchRecord) -> &RatingHistoryEntry {
        self.apply_in(m, OrderScope::League)
    }

    fn apply_in(&mut self, m: &MatchRecord, scope: OrderScope) -> &RatingHistoryEntry {
        self.check_order(m, scope);

        let (home_pre, home_games) = {
            let t = self.team_entry(&m.home_team);
            (t.rating, t.games_played)
        };
        let (away_pre, away_games) = {
            let t = self.team_entry(&m.away_team);
            (t.rating, t.games_played)
        };

        let expected_home = expected_score(home_pre + self.cfg.home_adv_pts, away_pre);
        let k = self.match_k(home_games, away_games);
        let multiplier = goal_diff_multiplier(m.goal_margin());
        let delta = k * multiplier * (m.actual_home_score() - expected_home);
        let home_post = home_pre + delta;
        let away_post = away_pre - delta;

        self.history.push(RatingHistoryEntry {
            date: m.date,
            league: m.league_key.clone(),
            season: m.season.clone(),
            home_team: m.home_team.clone(),
            away_team: m.away_team.clone(),
            home_goals: m.home_goals,
            away_goals: m.away_goals,
            home_rating_pre: home_pre,
            away_rating_pre: away_pre,
            home_rating_post: home_post,
            away_rating_post: away_post,
            expected_home_score: expected_home,
        });

        self.commit(&m.home_team, home_post);
        self.commit(&m.away_team, away_post);

        &self.history[self.history.len() - 1]
    }

    /// All teams, rating descending with ties by name, ranked 1..n.
    pub fn current_ratings(&self) -> Vec<RatingRow> {
        rank_ratings(self.ratings.values())
    }

    /// The rating table restricted to `teams` and re-ranked from 1.
    pub fn ratings_for_teams(&self, teams: &HashSet<String>) -> Vec<RatingRow> {
        rank_ratings(self.ratings.values().filter(|t| teams.contains(&t.team)))
    }

    pub fn history(&self) -> &[RatingHistoryEntry] {
        &self.history
    }

    pub fn rating(&self, team: &str) -> Option<f64> {
        self.ratings.get(team).map(|t| t.rating)
    }

    pub fn team(&self, team: &str) -> Option<&TeamRating> {
        self.ratings.get(team)
    }

    pub fn team_count(&self) -> usize {
        self.ratings.len()
    }

    pub fn ordering_violations(&self) -> usize {
        self.ordering_violations
    }

    fn check_order(&mut self, m: &MatchRecord, scope: OrderScope) {
        let latest = match scope {
            OrderScope::League => self.league_latest.get(&m.league_key).copied(),
            OrderScope::Global => self.latest_date,
        };
        if let Some(latest) = latest
            && m.date < latest
        {
            self.ordering_violations += 1;
            warn!(
                league = %m.league_key,
                home = %m.home_team,
                away = %m.away_team,
                date = %m.date,
                latest = %latest,
                "match is older than one already applied"
            );
        }

        self.latest_date = self.latest_date.max(Some(m.date));
        let league_latest = self
            .league_latest
            .entry(m.league_key.clone())
            .or_insert(m.date);
        if m.date > *league_latest {
            *league_latest = m.date;
        }
    }

    fn team_entry(&mut self, team: &str) -> &mut TeamRating {
        let baseline = self.cfg.baseline;
        self.ratings
            .entry(team.to_string())
            .or_insert_with(|| TeamRating {
                team: team.to_string(),
                rating: baseline,
                games_played: 0,
            })
    }

    fn commit(&mut self, team: &str, rating: f64) {
        let entry = self.team_entry(team);
        entry.rating = rating;
        entry.games_played = entry.games_played.saturating_add(1);
    }

    // One K for both sides keeps the exchange zero-sum.
    fn match_k(&self, home_games: u32, away_games: u32) -> f64 {
        let n = self.cfg.provisional_games;
        if n > 0 && (home_games < n || away_games < n) {
            self.cfg.provisional_k
        } else {
            self.cfg.k
        }
    }
}

fn rank_ratings<'a>(teams: impl Iterator<Item = &'a TeamRating>) -> Vec<RatingRow> {
    let mut rows: Vec<&TeamRating> = teams.collect();
    rows.sort_by(|a, b| {
        desc_f64_then_name((a.rating, a.team.as_str()), (b.rating, b.team.as_str()))
    });
    rows.into_iter()
        .zip(1u32..)
        .map(|(t, rank)| RatingRow {
            rank,
            team: t.team.clone(),
            rating: t.rating,
        })
        .collect()
}

pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf(-(r_a - r_b) / 400.0))
}

/// Scales the swing for wider margins: 1.0 up to one goal, 1.5 for two,
/// (11 + margin) / 8 from three.
pub fn goal_diff_multiplier(margin: u32) -> f64 {
    match margin {
        0 | 1 => 1.0,
        2 => 1.5,
        m => (11.0 + m as f64) / 8.0,
    }
}
