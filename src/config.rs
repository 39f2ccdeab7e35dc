use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::differential::DifferentialMode;
use crate::elo::EloConfig;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_SEASONS: &[&str] = &["2425", "2526"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueInfo {
    pub key: String,
    pub display_name: String,
    pub folder: String,
}

impl LeagueInfo {
    pub fn new(key: &str, display_name: &str, folder: &str) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            folder: folder.to_string(),
        }
    }
}

pub fn default_leagues() -> Vec<LeagueInfo> {
    vec![
        LeagueInfo::new("serie_a", "Serie A", "SerieA"),
        LeagueInfo::new("premier_league", "Premier League", "PremierLeague"),
        LeagueInfo::new("ligue_1", "Ligue 1", "Ligue1"),
        LeagueInfo::new("bundesliga", "Bundesliga", "Bundesliga"),
        LeagueInfo::new("la_liga", "La Liga", "LaLiga"),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    /// Oldest first. Ratings are replayed in this order.
    pub seasons: Vec<String>,
    pub leagues: Vec<LeagueInfo>,
    pub elo: EloConfig,
    /// Replay every match sorted by date instead of season by season.
    pub strict_chronological: bool,
    pub differential: DifferentialMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            seasons: DEFAULT_SEASONS.iter().map(|s| s.to_string()).collect(),
            leagues: default_leagues(),
            elo: EloConfig::default(),
            strict_chronological: false,
            differential: DifferentialMode::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads `.env.local` and `.env` if present, then reads the process
    /// environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset, empty or unparseable
    /// values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(dir) = lookup("APP_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            cfg.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(raw) = lookup("APP_SEASONS") {
            let seasons = split_list(&raw);
            if !seasons.is_empty() {
                cfg.seasons = seasons;
            }
        }
        if let Some(raw) = lookup("APP_LEAGUES") {
            let wanted: HashSet<String> = split_list(&raw).into_iter().collect();
            let leagues: Vec<LeagueInfo> = cfg
                .leagues
                .iter()
                .filter(|l| wanted.contains(&l.key))
                .cloned()
                .collect();
            if !leagues.is_empty() {
                cfg.leagues = leagues;
            }
        }

        if let Some(k) = lookup("ELO_K").and_then(|v| parse_positive(&v)) {
            cfg.elo.k = k;
        }
        if let Some(adv) = lookup("ELO_HOME_ADV").and_then(|v| v.trim().parse::<f64>().ok())
            && adv.is_finite()
        {
            cfg.elo.home_adv_pts = adv;
        }
        if let Some(base) = lookup("ELO_BASELINE").and_then(|v| parse_positive(&v)) {
            cfg.elo.baseline = base;
        }
        if let Some(n) = lookup("ELO_PROVISIONAL_GAMES").and_then(|v| v.trim().parse::<u32>().ok())
        {
            cfg.elo.provisional_games = n;
        }
        if let Some(k) = lookup("ELO_PROVISIONAL_K").and_then(|v| parse_positive(&v)) {
            cfg.elo.provisional_k = k;
        }
        if let Some(raw) = lookup("APP_STRICT_ORDER") {
            cfg.strict_chronological = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(mode) = lookup("APP_DIFFERENTIAL").and_then(|v| DifferentialMode::parse(&v)) {
            cfg.differential = mode;
        }

        cfg
    }

    /// (previous, current) for every adjacent pair of configured seasons.
    pub fn season_pairs(&self) -> Vec<(&str, &str)> {
        self.seasons
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
            .collect()
    }

    pub fn latest_season(&self) -> Option<&str> {
        self.seasons.last().map(String::as_str)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split([',', ';', ' '])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter(|part| seen.insert(part.to_string()))
        .map(str::to_string)
        .collect()
}

fn parse_positive(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        let cfg = PipelineConfig::from_lookup(|_| None);
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.leagues.len(), 5);
        assert_eq!(cfg.season_pairs(), vec![("2425", "2526")]);
    }

    #[test]
    fn overrides_are_applied_and_bad_values_ignored() {
        let cfg = PipelineConfig::from_lookup(lookup_from(&[
            ("APP_DATA_DIR", " /tmp/football "),
            ("APP_SEASONS", "2324, 2425;2526 2526"),
            ("APP_LEAGUES", "la_liga,unknown"),
            ("ELO_K", "32"),
            ("ELO_HOME_ADV", "nan"),
            ("ELO_BASELINE", "-4"),
            ("APP_STRICT_ORDER", "TRUE"),
            ("APP_DIFFERENTIAL", "fixtures"),
        ]));
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/football"));
        assert_eq!(cfg.seasons, vec!["2324", "2425", "2526"]);
        assert_eq!(cfg.leagues.len(), 1);
        assert_eq!(cfg.leagues[0].folder, "LaLiga");
        assert_eq!(cfg.elo.k, 32.0);
        assert_eq!(cfg.elo.home_adv_pts, 60.0);
        assert_eq!(cfg.elo.baseline, 1500.0);
        assert!(cfg.strict_chronological);
        assert_eq!(cfg.differential, DifferentialMode::SameFixtures);
        assert_eq!(cfg.season_pairs().len(), 2);
    }
}
