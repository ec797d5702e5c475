use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use tracing::warn;

use hoops_projector::analysis::GameAnalysis;
use hoops_projector::config::EngineConfig;
use hoops_projector::injury_report::{ParsedReport, parse_report};
use hoops_projector::report_fetch::{HttpReportSource, fetch_latest};
use hoops_projector::{logging, slate};

const USAGE: &str = "usage: hoops_projector <slate.json> [--report <file>] [--fetch-report] [--export <dir>] [--xlsx <file>]";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = EngineConfig::from_env();
    logging::init(config.log_format);

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let slate_path = args
        .iter()
        .enumerate()
        .find(|(idx, arg)| !arg.starts_with("--") && !is_flag_value(&args, *idx))
        .map(|(_, arg)| PathBuf::from(arg))
        .ok_or_else(|| anyhow!(USAGE))?;

    let slate = slate::load_slate(&slate_path)?;
    let report = resolve_report(&args, &config)?;
    let outcome = slate::analyze_slate(&slate, report.as_ref(), &config);

    for game in &outcome.games {
        print_game(game);
    }

    let export_dir = path_arg(&args, "--export").or_else(|| config.export_dir.clone());
    if let Some(dir) = export_dir {
        let report = outcome.export.write_csv(&dir)?;
        println!(
            "Exported {} team rows and {} player rows to {}",
            report.teams,
            report.players,
            dir.display()
        );
    }
    if let Some(path) = path_arg(&args, "--xlsx") {
        outcome.export.write_xlsx(&path)?;
        println!("Workbook: {}", path.display());
    }

    Ok(())
}

fn resolve_report(args: &[String], config: &EngineConfig) -> Result<Option<ParsedReport>> {
    if let Some(path) = path_arg(args, "--report") {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading report {}", path.display()))?;
        return Ok(Some(parse_report(&raw)));
    }
    if !args.iter().any(|a| a == "--fetch-report") {
        return Ok(None);
    }
    let source = HttpReportSource::from_config(config)?;
    match fetch_latest(&source, Local::now().naive_local(), config.report_lookback_slots) {
        Ok(fetched) => {
            println!("Injury report: {}", fetched.slot.format("%Y-%m-%d %I:%M %p"));
            Ok(Some(parse_report(&fetched.text)))
        }
        Err(err) => {
            // Projections still run; they just assume nobody is injured.
            warn!(%err, "continuing without an injury report");
            Ok(None)
        }
    }
}

fn print_game(game: &GameAnalysis) {
    let s = &game.summary;
    println!();
    println!("{}", game.label);
    println!(
        "  {} {} - {} {}  (total {}, spread {:+}, home win {:.1}%)",
        game.away.team,
        game.away.score,
        game.home.score,
        game.home.team,
        s.total,
        s.spread,
        s.home_win_probability * 100.0
    );
    println!("  Pace: {:.1} ({:?})", s.pace, s.pace_confidence);
    for team in [&game.home, &game.away] {
        let p = &team.projection;
        println!(
            "  {}: {} [{:.0}-{:.0}] poss {:.1} eff {:.3}",
            team.team, team.score, p.ci68.0, p.ci68.1, team.possessions, team.efficiency
        );
        for name in &team.unavailable {
            println!("    out: {name}");
        }
    }
    for insight in &game.script.insights {
        println!("  * {insight}");
    }
    for player in &game.players {
        let p = &player.points;
        let status = player
            .status
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();
        println!(
            "    {:<24} {:<9} {:>5.1} pts ({:.0}-{:.0})  {:>4.1} reb  {:>4.1} ast  {:>3.1} 3pm{status}",
            player.name,
            player.tier.label(),
            p.mean,
            p.ci68.0,
            p.ci68.1,
            player.rebounds,
            player.assists,
            player.three_pointers,
        );
    }
}

fn is_flag_value(args: &[String], idx: usize) -> bool {
    idx > 0
        && matches!(
            args[idx - 1].as_str(),
            "--report" | "--export" | "--xlsx"
        )
}

fn path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}
