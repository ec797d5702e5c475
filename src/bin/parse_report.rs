use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use hoops_projector::config::EngineConfig;
use hoops_projector::injury_report::parse_report;
use hoops_projector::logging;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    logging::init(EngineConfig::from_env().log_format);

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/injury_report.txt"));

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed reading report {}", path.display()))?;
    let report = parse_report(&raw);

    let json = serde_json::to_string_pretty(&report).context("failed encoding report")?;
    println!("{json}");

    if !report.success {
        eprintln!("no injury records extracted from {}", path.display());
    }
    Ok(())
}
