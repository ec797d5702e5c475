use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::info;

use crate::analysis::{GameAnalysis, PlayerProjection, TeamProjection};

const TEAM_HEADERS: [&str; 14] = [
    "game",
    "team",
    "side",
    "score",
    "std_dev",
    "ci68_low",
    "ci68_high",
    "ci95_low",
    "ci95_high",
    "possessions",
    "efficiency",
    "pace",
    "pace_confidence",
    "win_probability",
];

const PLAYER_HEADERS: [&str; 17] = [
    "game",
    "team",
    "player",
    "tier",
    "status",
    "minutes",
    "points",
    "std_dev",
    "ci68_low",
    "ci68_high",
    "ci95_low",
    "ci95_high",
    "rebounds",
    "assists",
    "three_pointers",
    "uncertainty",
    "reasons",
];

/// Rows collected across a slate. The caller decides when and where to flush.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportAccumulator {
    team_rows: Vec<Vec<String>>,
    player_rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub teams: usize,
    pub players: usize,
    pub paths: Vec<PathBuf>,
}

impl ExportAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, game: &GameAnalysis) {
        let win = game.summary.home_win_probability;
        self.team_rows.push(team_row(game, &game.home, "home", win));
        self.team_rows.push(team_row(game, &game.away, "away", 1.0 - win));
        for player in &game.players {
            self.player_rows.push(player_row(game, player));
        }
    }

    pub fn team_count(&self) -> usize {
        self.team_rows.len()
    }

    pub fn player_count(&self) -> usize {
        self.player_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.team_rows.is_empty() && self.player_rows.is_empty()
    }

    /// Writes `teams.csv` and `players.csv` into `dir`, creating it if needed.
    pub fn write_csv(&self, dir: &Path) -> Result<ExportReport> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed creating export dir {}", dir.display()))?;
        let teams = dir.join("teams.csv");
        let players = dir.join("players.csv");
        write_csv_file(&teams, &TEAM_HEADERS, &self.team_rows)?;
        write_csv_file(&players, &PLAYER_HEADERS, &self.player_rows)?;
        info!(
            dir = %dir.display(),
            teams = self.team_rows.len(),
            players = self.player_rows.len(),
            "csv export written"
        );
        Ok(ExportReport {
            teams: self.team_rows.len(),
            players: self.player_rows.len(),
            paths: vec![teams, players],
        })
    }

    pub fn write_xlsx(&self, path: &Path) -> Result<ExportReport> {
        let mut workbook = Workbook::new();
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Teams")?;
            write_rows(sheet, &TEAM_HEADERS, &self.team_rows)?;
        }
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Players")?;
            write_rows(sheet, &PLAYER_HEADERS, &self.player_rows)?;
        }
        workbook
            .save(path)
            .with_context(|| format!("failed writing workbook to {}", path.display()))?;
        info!(path = %path.display(), "xlsx export written");
        Ok(ExportReport {
            teams: self.team_rows.len(),
            players: self.player_rows.len(),
            paths: vec![path.to_path_buf()],
        })
    }
}

fn fmt1(v: f64) -> String {
    format!("{v:.1}")
}

fn team_row(game: &GameAnalysis, team: &TeamProjection, side: &str, win: f64) -> Vec<String> {
    let p = &team.projection;
    vec![
        game.label.clone(),
        team.team.clone(),
        side.to_string(),
        team.score.to_string(),
        fmt1(p.std_dev),
        fmt1(p.ci68.0),
        fmt1(p.ci68.1),
        fmt1(p.ci95.0),
        fmt1(p.ci95.1),
        fmt1(team.possessions),
        format!("{:.3}", team.efficiency),
        fmt1(game.summary.pace),
        format!("{:?}", game.summary.pace_confidence),
        format!("{win:.3}"),
    ]
}

fn player_row(game: &GameAnalysis, player: &PlayerProjection) -> Vec<String> {
    let p = &player.points;
    vec![
        game.label.clone(),
        player.team.clone(),
        player.name.clone(),
        player.tier.label().to_string(),
        player.status.map(|s| s.to_string()).unwrap_or_default(),
        fmt1(player.minutes),
        fmt1(p.mean),
        fmt1(p.std_dev),
        fmt1(p.ci68.0),
        fmt1(p.ci68.1),
        fmt1(p.ci95.0),
        fmt1(p.ci95.1),
        fmt1(player.rebounds),
        fmt1(player.assists),
        fmt1(player.three_pointers),
        format!("{:.2}", player.uncertainty),
        p.reasons.join("; "),
    ]
}

fn write_csv_file(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed opening {}", path.display()))?;
    writer
        .write_record(headers)
        .with_context(|| format!("failed writing header to {}", path.display()))?;
    for row in rows {
        writer
            .write_record(row)
            .with_context(|| format!("failed writing row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed flushing {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    for (col_idx, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, *header)
            .with_context(|| format!("write header ({col_idx})"))?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let row_num = row_idx as u32 + 1;
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_num, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_num},{col_idx})"))?;
        }
    }
    Ok(())
}
