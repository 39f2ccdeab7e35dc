use std::fs;
use std::mem::take;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveTime};

use crate::config::LeagueInfo;
use crate::error::PipelineError;
use crate::match_record::RawMatchRow;

/// Anything that can hand over the raw rows of one league-season.
pub trait SeasonSource: Sync {
    fn load(&self, league: &LeagueInfo, season: &str) -> Result<Vec<RawMatchRow>, PipelineError>;
}

/// football-data.co.uk layout: `<data_dir>/<league folder>/<season>.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    pub data_dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn season_path(&self, league: &LeagueInfo, season: &str) -> PathBuf {
        self.data_dir
            .join(&league.folder)
            .join(format!("{season}.csv"))
    }
}

impl SeasonSource for CsvDirSource {
    fn load(&self, league: &LeagueInfo, season: &str) -> Result<Vec<RawMatchRow>, PipelineError> {
        let path = self.season_path(league, season);
        if !path.is_file() {
            return Err(PipelineError::MissingData {
                league: league.key.clone(),
                season: season.to_string(),
                path,
            });
        }
        read_season_file(&path).map_err(|err| PipelineError::InvalidSource {
            league: league.key.clone(),
            season: season.to_string(),
            reason: format!("{err:#}"),
        })
    }
}

pub fn read_season_file(path: &Path) -> Result<Vec<RawMatchRow>> {
    let bytes = fs::read(path).with_context(|| format!("read season file {}", path.display()))?;
    // Older football-data exports are latin-1; keep going on bad bytes.
    let text = String::from_utf8_lossy(&bytes);
    parse_season_csv(&text).with_context(|| format!("parse season file {}", path.display()))
}

/// Parses a football-data.co.uk results export. Columns are located by
/// header name; cells that are empty or unparseable become `None` so the
/// row is skipped later instead of failing the whole file.
pub fn parse_season_csv(text: &str) -> Result<Vec<RawMatchRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = parse_rows(text, ',').into_iter();
    let header = rows.next().ok_or_else(|| anyhow!("empty file"))?;

    let col = |name: &str| header.iter().position(|h| h.trim() == name);
    let home_col = col("HomeTeam")
        .or_else(|| col("Home"))
        .ok_or_else(|| anyhow!("missing HomeTeam column"))?;
    let away_col = col("AwayTeam")
        .or_else(|| col("Away"))
        .ok_or_else(|| anyhow!("missing AwayTeam column"))?;
    let hg_col = col("FTHG")
        .or_else(|| col("HG"))
        .ok_or_else(|| anyhow!("missing FTHG column"))?;
    let ag_col = col("FTAG")
        .or_else(|| col("AG"))
        .ok_or_else(|| anyhow!("missing FTAG column"))?;
    let date_col = col("Date");
    let time_col = col("Time");

    let cell = |row: &[String], idx: usize| row.get(idx).map(|c| c.trim().to_string());

    let mut out = Vec::new();
    for row in rows {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let date = date_col
            .and_then(|idx| cell(&row, idx))
            .and_then(|raw| parse_match_date(&raw));
        let time = time_col
            .and_then(|idx| cell(&row, idx))
            .and_then(|raw| NaiveTime::parse_from_str(&raw, "%H:%M").ok());
        let kickoff = match (date, time) {
            (Some(d), Some(t)) => Some(d.and_time(t)),
            (Some(d), None) => d.and_hms_opt(0, 0, 0),
            (None, _) => None,
        };

        out.push(RawMatchRow {
            home_team: cell(&row, home_col).unwrap_or_default(),
            away_team: cell(&row, away_col).unwrap_or_default(),
            home_goals: cell(&row, hg_col).and_then(|v| parse_goals(&v)),
            away_goals: cell(&row, ag_col).and_then(|v| parse_goals(&v)),
            date: kickoff,
        });
    }
    Ok(out)
}

/// `dd/mm/yyyy`, `dd/mm/yy` or ISO `yyyy-mm-dd`. Two-digit years follow
/// chrono's `%y` pivot: 70-99 are 19xx, 00-69 are 20xx.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.contains('/') {
        let format = match raw.rsplit('/').next().map(str::len) {
            Some(4) => "%d/%m/%Y",
            Some(2) => "%d/%m/%y",
            _ => return None,
        };
        return NaiveDate::parse_from_str(raw, format).ok();
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

// Some exports write goals as "2.0".
fn parse_goals(raw: &str) -> Option<u32> {
    if let Ok(v) = raw.parse::<u32>() {
        return Some(v);
    }
    let f = raw.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

/// Quote-aware CSV splitter; tolerates CRLF and a missing final newline.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && matches!(chars.peek(), Some('"')) {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
            }
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
