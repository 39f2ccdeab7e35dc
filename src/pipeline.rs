use std::collections::HashSet;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{LeagueInfo, PipelineConfig};
use crate::differential::{
    DifferentialMode, DifferentialResult, analyze, analyze_fixtures, latest_standings,
};
use crate::elo::{BatchSummary, RatingRow, RatingTracker, SeasonBatch};
use crate::error::PipelineError;
use crate::match_record::{MatchRecord, RawMatchRow, validate_batch};
use crate::ranking::top_and_bottom;
use crate::season_file::SeasonSource;
use crate::standings::compute_standings;

/// Result of one (league, season) unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum UnitOutcome<T> {
    Done(T),
    Skipped(String),
    Failed(String),
}

impl<T> UnitOutcome<T> {
    pub fn from_error(err: &PipelineError) -> Self {
        if err.is_skip() {
            UnitOutcome::Skipped(err.to_string())
        } else {
            UnitOutcome::Failed(err.to_string())
        }
    }

    pub fn done(&self) -> Option<&T> {
        match self {
            UnitOutcome::Done(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitReport<T> {
    pub league: String,
    pub season: String,
    pub outcome: UnitOutcome<T>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub rating_units_done: usize,
    pub rating_units_skipped: usize,
    pub rating_units_failed: usize,
    pub matches_processed: usize,
    pub rows_skipped: usize,
    pub ordering_violations: usize,
    pub differential_units_done: usize,
    pub differential_units_skipped: usize,
    pub differential_units_failed: usize,
}

impl RunReport {
    pub fn from_reports(
        ratings: &[UnitReport<BatchSummary>],
        differentials: &[UnitReport<Vec<DifferentialResult>>],
    ) -> Self {
        let mut out = RunReport::default();
        for unit in ratings {
            match &unit.outcome {
                UnitOutcome::Done(summary) => {
                    out.rating_units_done += 1;
                    out.matches_processed += summary.processed;
                    out.rows_skipped += summary.skipped;
                    out.ordering_violations += summary.ordering_violations;
                }
                UnitOutcome::Skipped(_) => out.rating_units_skipped += 1,
                UnitOutcome::Failed(_) => out.rating_units_failed += 1,
            }
        }
        for unit in differentials {
            match &unit.outcome {
                UnitOutcome::Done(_) => out.differential_units_done += 1,
                UnitOutcome::Skipped(_) => out.differential_units_skipped += 1,
                UnitOutcome::Failed(_) => out.differential_units_failed += 1,
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize run report")
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub tracker: RatingTracker,
    pub ratings: Vec<UnitReport<BatchSummary>>,
    pub league_tables: Vec<UnitReport<Vec<RatingRow>>>,
    pub differentials: Vec<UnitReport<Vec<DifferentialResult>>>,
    pub report: RunReport,
}

/// Rating replay, per-league rating tables and year-over-year differentials.
/// The two analyses are independent: a unit failing in one does not stop
/// the other.
pub fn run(source: &dyn SeasonSource, config: &PipelineConfig) -> PipelineRun {
    let mut tracker = RatingTracker::new(config.elo);
    let ratings = run_ratings(source, config, &mut tracker);
    let league_tables = league_rating_tables(source, config, &tracker);
    let differentials = run_differentials(source, config);
    let report = RunReport::from_reports(&ratings, &differentials);
    info!(
        matches = report.matches_processed,
        teams = tracker.team_count(),
        skipped_units = report.rating_units_skipped + report.differential_units_skipped,
        failed_units = report.rating_units_failed + report.differential_units_failed,
        "pipeline complete"
    );
    PipelineRun {
        tracker,
        ratings,
        league_tables,
        differentials,
        report,
    }
}

/// Feeds every configured league-season into `tracker`, oldest season first
/// and all leagues of a season before the next one. Same-season leagues
/// overlap in time; season blocks are the ordering guarantee unless
/// `strict_chronological` is set.
pub fn run_ratings(
    source: &dyn SeasonSource,
    config: &PipelineConfig,
    tracker: &mut RatingTracker,
) -> Vec<UnitReport<BatchSummary>> {
    if config.strict_chronological {
        return run_ratings_strict(source, config, tracker);
    }

    let mut reports = Vec::new();
    for season in &config.seasons {
        for league in &config.leagues {
            let outcome = match load_unit(source, league, season) {
                Ok(rows) => {
                    UnitOutcome::Done(tracker.process_season_batch(&rows, season, &league.key))
                }
                Err(err) => UnitOutcome::from_error(&err),
            };
            reports.push(UnitReport {
                league: league.key.clone(),
                season: season.clone(),
                outcome,
            });
        }
    }
    reports
}

fn run_ratings_strict(
    source: &dyn SeasonSource,
    config: &PipelineConfig,
    tracker: &mut RatingTracker,
) -> Vec<UnitReport<BatchSummary>> {
    let mut reports = Vec::new();
    let mut batches = Vec::new();
    // report index for each loaded batch
    let mut slots = Vec::new();
    for season in &config.seasons {
        for league in &config.leagues {
            let outcome = match load_unit(source, league, season) {
                Ok(rows) => {
                    slots.push(reports.len());
                    batches.push(SeasonBatch {
                        league_key: league.key.clone(),
                        season: season.clone(),
                        rows,
                    });
                    UnitOutcome::Done(BatchSummary::default())
                }
                Err(err) => UnitOutcome::from_error(&err),
            };
            reports.push(UnitReport {
                league: league.key.clone(),
                season: season.clone(),
                outcome,
            });
        }
    }

    let summaries = tracker.replay_chronological(&batches);
    for (slot, summary) in slots.into_iter().zip(summaries) {
        reports[slot].outcome = UnitOutcome::Done(summary);
    }
    reports
}

/// Rating table per league, restricted to the teams of the latest configured
/// season and re-ranked within the league.
pub fn league_rating_tables(
    source: &dyn SeasonSource,
    config: &PipelineConfig,
    tracker: &RatingTracker,
) -> Vec<UnitReport<Vec<RatingRow>>> {
    let Some(season) = config.latest_season() else {
        return Vec::new();
    };
    config
        .leagues
        .iter()
        .map(|league| {
            let outcome = match load_unit(source, league, season) {
                Ok(rows) => {
                    let teams = teams_in(&rows);
                    let table = tracker.ratings_for_teams(&teams);
                    info!(league = %league.display_name, teams = table.len(), "rating table ready");
                    UnitOutcome::Done(table)
                }
                Err(err) => UnitOutcome::from_error(&err),
            };
            UnitReport {
                league: league.key.clone(),
                season: season.to_string(),
                outcome,
            }
        })
        .collect()
}

/// Year-over-year differential for every adjacent season pair and league.
/// Units are independent and computed in parallel; reports come back in
/// configuration order (season pair, then league).
pub fn run_differentials(
    source: &dyn SeasonSource,
    config: &PipelineConfig,
) -> Vec<UnitReport<Vec<DifferentialResult>>> {
    let units: Vec<(&str, &str, &LeagueInfo)> = config
        .season_pairs()
        .into_iter()
        .flat_map(|(prev, cur)| config.leagues.iter().map(move |league| (prev, cur, league)))
        .collect();

    units
        .par_iter()
        .map(|(prev, cur, league)| {
            let outcome = match differential_unit(source, league, prev, cur, config.differential) {
                Ok(ranked) => UnitOutcome::Done(ranked),
                Err(err) => UnitOutcome::from_error(&err),
            };
            UnitReport {
                league: league.key.clone(),
                season: cur.to_string(),
                outcome,
            }
        })
        .collect()
}

fn differential_unit(
    source: &dyn SeasonSource,
    league: &LeagueInfo,
    previous_season: &str,
    current_season: &str,
    mode: DifferentialMode,
) -> Result<Vec<DifferentialResult>, PipelineError> {
    let previous = load_records(source, league, previous_season)?;
    let current = load_records(source, league, current_season)?;

    let results = match mode {
        DifferentialMode::Standings(metric) => analyze(
            &compute_standings(&current),
            &compute_standings(&previous),
            current_season,
            metric,
        ),
        DifferentialMode::SameFixtures => analyze_fixtures(&current, &previous, current_season),
    };
    let ranked = latest_standings(results);

    if let Some((top, bottom)) = top_and_bottom(&ranked) {
        info!(
            "{} {previous_season} -> {current_season}: top {} ({:+}), bottom {} ({:+})",
            league.display_name, top.team, top.cumulative, bottom.team, bottom.cumulative
        );
    }
    Ok(ranked)
}

fn load_unit(
    source: &dyn SeasonSource,
    league: &LeagueInfo,
    season: &str,
) -> Result<Vec<RawMatchRow>, PipelineError> {
    source.load(league, season).inspect_err(|err| {
        if err.is_skip() {
            info!("skipped: {err}");
        } else {
            warn!("unit failed: {err}");
        }
    })
}

fn load_records(
    source: &dyn SeasonSource,
    league: &LeagueInfo,
    season: &str,
) -> Result<Vec<MatchRecord>, PipelineError> {
    let rows = load_unit(source, league, season)?;
    let (records, errors) = validate_batch(&rows, &league.key, season);
    for err in &errors {
        warn!("skipping row: {err}");
    }
    Ok(records)
}

fn teams_in(rows: &[RawMatchRow]) -> HashSet<String> {
    rows.iter()
        .flat_map(|r| [r.home_team.trim(), r.away_team.trim()])
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
