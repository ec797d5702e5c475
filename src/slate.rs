use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::{GameAnalysis, GameInput, analyze_game};
use crate::config::EngineConfig;
use crate::export::ExportAccumulator;
use crate::injury_report::{ParsedReport, parse_report};

/// A day's games plus an optional report shared by all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Slate {
    pub games: Vec<GameInput>,
    pub report_text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SlateFile {
    Full(Slate),
    Games(Vec<GameInput>),
}

#[derive(Debug, Clone)]
pub struct SlateOutcome {
    /// In the same order as the slate's games.
    pub games: Vec<GameAnalysis>,
    pub export: ExportAccumulator,
}

pub fn parse_slate(raw: &str) -> Result<Slate> {
    let file: SlateFile = serde_json::from_str(raw).context("invalid slate json")?;
    Ok(match file {
        SlateFile::Full(slate) => slate,
        SlateFile::Games(games) => Slate {
            games,
            report_text: None,
        },
    })
}

pub fn load_slate(path: &Path) -> Result<Slate> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading slate {}", path.display()))?;
    parse_slate(&raw).with_context(|| format!("failed parsing slate {}", path.display()))
}

/// Games are independent, so they run in parallel; results keep slate order.
/// `report` wins over the slate's own `report_text`.
pub fn analyze_slate(
    slate: &Slate,
    report: Option<&ParsedReport>,
    config: &EngineConfig,
) -> SlateOutcome {
    let own = match report {
        Some(_) => None,
        None => slate.report_text.as_deref().map(parse_report),
    };
    let report = report.or(own.as_ref());

    let games: Vec<GameAnalysis> = slate
        .games
        .par_iter()
        .map(|game| analyze_game(game, report, config))
        .collect();

    let mut export = ExportAccumulator::new();
    for game in &games {
        export.push(game);
    }
    info!(games = games.len(), "slate analyzed");
    SlateOutcome { games, export }
}
