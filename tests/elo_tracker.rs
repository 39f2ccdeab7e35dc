use std::collections::HashSet;

use chrono::NaiveDate;

use football_ratings::elo::{
    BASELINE_RATING, EloConfig, RatingTracker, SeasonBatch, expected_score,
};
use football_ratings::match_record::RawMatchRow;

fn row(date: &str, home: &str, away: &str, hg: u32, ag: u32) -> RawMatchRow {
    RawMatchRow {
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_goals: Some(hg),
        away_goals: Some(ag),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(15, 0, 0)),
    }
}

fn no_home_adv() -> EloConfig {
    EloConfig {
        home_adv_pts: 0.0,
        ..EloConfig::default()
    }
}

fn sample_season() -> Vec<RawMatchRow> {
    vec![
        row("2024-08-17", "Inter", "Genoa", 2, 2),
        row("2024-08-17", "Milan", "Torino", 2, 2),
        row("2024-08-24", "Genoa", "Milan", 0, 1),
        row("2024-08-24", "Torino", "Inter", 0, 3),
        row("2024-08-31", "Inter", "Milan", 1, 2),
        row("2024-08-31", "Genoa", "Torino", 1, 0),
        row("2024-09-14", "Milan", "Genoa", 5, 0),
        row("2024-09-14", "Inter", "Torino", 1, 1),
    ]
}

#[test]
fn new_teams_start_at_baseline() {
    let mut tracker = RatingTracker::default();
    tracker.process_season_batch(&sample_season(), "2425", "serie_a");

    let mut seen = HashSet::new();
    for entry in tracker.history() {
        if seen.insert(entry.home_team.clone()) {
            assert_eq!(entry.home_rating_pre, BASELINE_RATING);
        }
        if seen.insert(entry.away_team.clone()) {
            assert_eq!(entry.away_rating_pre, BASELINE_RATING);
        }
    }
    assert_eq!(seen.len(), 4);

    // A team first seen in a later batch also starts from the baseline.
    tracker.process_season_batch(&[row("2025-08-23", "Como", "Inter", 1, 0)], "2526", "serie_a");
    let last = tracker.history().last().expect("history entry");
    assert_eq!(last.home_rating_pre, BASELINE_RATING);
    assert_ne!(last.away_rating_pre, BASELINE_RATING);
}

#[test]
fn every_update_is_zero_sum() {
    let mut tracker = RatingTracker::default();
    tracker.process_season_batch(&sample_season(), "2425", "serie_a");

    for entry in tracker.history() {
        let home_delta = entry.home_rating_post - entry.home_rating_pre;
        let away_delta = entry.away_rating_post - entry.away_rating_pre;
        assert!((home_delta + away_delta).abs() < 1e-9);
    }
    let total: f64 = tracker.current_ratings().iter().map(|r| r.rating).sum();
    assert!((total - 4.0 * BASELINE_RATING).abs() < 1e-6);
}

#[test]
fn stronger_home_side_is_expected_to_win() {
    let mut tracker = RatingTracker::new(no_home_adv());
    tracker.process_season_batch(
        &[
            row("2024-08-17", "Napoli", "Lecce", 3, 0),
            row("2024-08-24", "Napoli", "Lecce", 0, 0),
        ],
        "2425",
        "serie_a",
    );
    let second = &tracker.history()[1];
    assert!(second.home_rating_pre > second.away_rating_pre);
    assert!(second.expected_home_score > 0.5);

    let first = &tracker.history()[0];
    assert_eq!(first.expected_home_score, 0.5);
    assert!(expected_score(1500.0, 1600.0) < 0.5);
}

#[test]
fn home_advantage_shifts_expectation() {
    let mut tracker = RatingTracker::default();
    tracker.process_season_batch(&[row("2024-08-17", "A", "B", 1, 1)], "2425", "x");
    let entry = &tracker.history()[0];
    assert!(entry.expected_home_score > 0.5);
    // A draw at home is below expectation for the home side.
    assert!(entry.home_rating_post < entry.home_rating_pre);
}

#[test]
fn replay_is_deterministic() {
    let run = || {
        let mut tracker = RatingTracker::default();
        tracker.process_season_batch(&sample_season(), "2425", "serie_a");
        tracker.process_season_batch(
            &[row("2025-08-23", "Inter", "Genoa", 4, 1)],
            "2526",
            "serie_a",
        );
        tracker
    };
    let a = run();
    let b = run();
    assert_eq!(a.current_ratings(), b.current_ratings());
    assert_eq!(a.history(), b.history());
}

#[test]
fn current_ratings_are_sorted_with_name_tie_break() {
    let mut tracker = RatingTracker::default();
    tracker.process_season_batch(&sample_season(), "2425", "serie_a");
    // Two untouched-by-each-other draws leave Zeta and Alpha level.
    tracker.process_season_batch(
        &[
            row("2025-01-01", "Zeta", "Omega", 0, 0),
            row("2025-01-01", "Alpha", "Beta", 0, 0),
        ],
        "2425",
        "other",
    );

    let table = tracker.current_ratings();
    assert_eq!(table.len(), 8);
    for pair in table.windows(2) {
        assert!(
            pair[0].rating > pair[1].rating
                || (pair[0].rating == pair[1].rating && pair[0].team < pair[1].team)
        );
    }
    let ranks: Vec<u32> = table.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, (1..=8).collect::<Vec<u32>>());

    let alpha = table.iter().position(|r| r.team == "Alpha").unwrap();
    let zeta = table.iter().position(|r| r.team == "Zeta").unwrap();
    assert_eq!(table[alpha].rating, table[zeta].rating);
    assert!(alpha < zeta);
}

#[test]
fn wider_margin_moves_rating_further() {
    let gain = |hg: u32| {
        let mut tracker = RatingTracker::default();
        tracker.process_season_batch(&[row("2024-08-17", "Home", "Away", hg, 0)], "2425", "x");
        let entry = &tracker.history()[0];
        entry.home_rating_post - entry.home_rating_pre
    };
    let one_nil = gain(1);
    let three_nil = gain(3);
    assert!(one_nil > 0.0);
    assert!(three_nil > one_nil);
}

#[test]
fn malformed_rows_are_skipped_without_history() {
    let mut rows = sample_season();
    rows.insert(
        1,
        RawMatchRow {
            home_goals: None,
            ..row("2024-08-17", "Lazio", "Roma", 0, 0)
        },
    );
    rows.push(RawMatchRow {
        date: None,
        ..row("2024-09-14", "Lazio", "Roma", 1, 0)
    });

    let mut tracker = RatingTracker::default();
    let summary = tracker.process_season_batch(&rows, "2425", "serie_a");
    assert_eq!(summary.processed, 8);
    assert_eq!(summary.skipped, 2);
    assert_eq!(tracker.history().len(), 8);
    assert!(tracker.rating("Lazio").is_none());
    assert!(tracker.team("Roma").is_none());
}

#[test]
fn games_played_counts_each_appearance() {
    let mut tracker = RatingTracker::default();
    tracker.process_season_batch(&sample_season(), "2425", "serie_a");
    for team in ["Inter", "Genoa", "Milan", "Torino"] {
        assert_eq!(tracker.team(team).map(|t| t.games_played), Some(4));
    }
}

#[test]
fn out_of_order_batches_are_counted_not_rejected() {
    let mut tracker = RatingTracker::default();
    tracker.process_season_batch(&[row("2025-08-23", "A", "B", 1, 0)], "2526", "x");
    let summary =
        tracker.process_season_batch(&[row("2024-08-17", "B", "A", 1, 0)], "2425", "x");
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.ordering_violations, 1);
    assert_eq!(tracker.ordering_violations(), 1);
    assert_eq!(tracker.history().len(), 2);
}

#[test]
fn overlapping_leagues_of_one_season_are_in_order() {
    let mut tracker = RatingTracker::default();
    let serie_a = tracker.process_season_batch(&sample_season(), "2425", "serie_a");
    let epl_rows: Vec<RawMatchRow> = (0..10)
        .map(|i| row("2024-09-01", &format!("Home {i}"), &format!("Away {i}"), 1, 0))
        .collect();
    let epl = tracker.process_season_batch(&epl_rows, "2425", "premier_league");

    assert_eq!(serie_a.ordering_violations, 0);
    assert_eq!(epl.processed, 10);
    assert_eq!(epl.ordering_violations, 0);
    assert_eq!(tracker.ordering_violations(), 0);

    // Going back in time within a league is still flagged.
    let late = tracker.process_season_batch(
        &[row("2024-08-20", "Inter", "Milan", 0, 0)],
        "2425",
        "serie_a",
    );
    assert_eq!(late.ordering_violations, 1);
}

#[test]
fn strict_replay_checks_against_every_league() {
    let mut tracker = RatingTracker::default();
    tracker.replay_chronological(&[SeasonBatch {
        league_key: "serie_a".to_string(),
        season: "2425".to_string(),
        rows: vec![row("2024-12-01", "Inter", "Genoa", 1, 0)],
    }]);
    let summaries = tracker.replay_chronological(&[SeasonBatch {
        league_key: "premier_league".to_string(),
        season: "2425".to_string(),
        rows: vec![row("2024-09-01", "Arsenal", "Chelsea", 1, 0)],
    }]);
    assert_eq!(summaries[0].ordering_violations, 1);
    assert_eq!(tracker.ordering_violations(), 1);
}

#[test]
fn strict_replay_interleaves_batches_by_date() {
    let serie_a = SeasonBatch {
        league_key: "serie_a".to_string(),
        season: "2425".to_string(),
        rows: vec![
            row("2024-08-17", "Inter", "Genoa", 2, 2),
            row("2024-08-31", "Genoa", "Inter", 0, 1),
        ],
    };
    let epl = SeasonBatch {
        league_key: "premier_league".to_string(),
        season: "2425".to_string(),
        rows: vec![
            row("2024-08-24", "Arsenal", "Chelsea", 1, 0),
            RawMatchRow {
                away_goals: None,
                ..row("2024-08-25", "Chelsea", "Arsenal", 0, 0)
            },
        ],
    };

    let mut tracker = RatingTracker::default();
    let summaries = tracker.replay_chronological(&[serie_a, epl]);
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].processed, 2);
    assert_eq!(summaries[1].processed, 1);
    assert_eq!(summaries[1].skipped, 1);
    assert_eq!(tracker.ordering_violations(), 0);

    let leagues: Vec<&str> = tracker.history().iter().map(|e| e.league.as_str()).collect();
    assert_eq!(leagues, vec!["serie_a", "premier_league", "serie_a"]);
}

#[test]
fn league_table_is_reranked_locally() {
    let mut tracker = RatingTracker::default();
    tracker.process_season_batch(&sample_season(), "2425", "serie_a");
    tracker.process_season_batch(&[row("2024-09-15", "Arsenal", "Chelsea", 4, 0)], "2425", "epl");

    let epl: HashSet<String> = ["Arsenal", "Chelsea"].iter().map(|s| s.to_string()).collect();
    let table = tracker.ratings_for_teams(&epl);
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].team, "Arsenal");
    assert_eq!(table[0].rank, 1);
    assert_eq!(table[1].rank, 2);
}

#[test]
fn provisional_k_applies_to_both_sides() {
    let cfg = EloConfig {
        k: 20.0,
        home_adv_pts: 0.0,
        provisional_games: 2,
        provisional_k: 40.0,
        ..EloConfig::default()
    };
    let mut tracker = RatingTracker::new(cfg);
    tracker.process_season_batch(&[row("2024-08-17", "A", "B", 1, 0)], "2425", "x");
    assert_eq!(tracker.rating("A"), Some(1520.0));
    assert_eq!(tracker.rating("B"), Some(1480.0));
}
