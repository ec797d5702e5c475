use std::fs;
use std::path::PathBuf;

use hoops_projector::config::EngineConfig;
use hoops_projector::injury::InjuryStatus;
use hoops_projector::injury_report::parse_report;
use hoops_projector::model::{BattleConfidence, BattleKind};
use hoops_projector::scoring::PaceConfidence;
use hoops_projector::slate::{analyze_slate, parse_slate};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn slate_fixture_without_report() {
    let slate = parse_slate(&read_fixture("game_slate.json")).expect("fixture should parse");
    let outcome = analyze_slate(&slate, None, &EngineConfig::default());
    assert_eq!(outcome.games.len(), 2);

    let game = &outcome.games[0];
    assert_eq!(game.label, "Utah Jazz @ Denver Nuggets");
    assert!(game.home.score > game.away.score);
    assert!(game.summary.home_win_probability > 0.5);
    assert_eq!(game.summary.pace_confidence, PaceConfidence::VeryHigh);

    let interior = game.script.battle(BattleKind::Interior).expect("interior battle");
    assert_eq!(interior.advantage_team, "Denver Nuggets");
    assert_eq!(interior.confidence, BattleConfidence::Medium);
    // 31/45.6 assisted vs Utah's 0.61, net of 12.9 and 13.2 forced turnovers.
    let ball = game.script.battle(BattleKind::BallMovement).expect("ball movement battle");
    assert_eq!(ball.advantage_team, "Denver Nuggets");
    assert_eq!(ball.confidence, BattleConfidence::High);

    // Supplied "game-time decision" reads as questionable.
    let kessler = game
        .players
        .iter()
        .find(|p| p.name == "Walker Kessler")
        .expect("kessler tracked");
    assert_eq!(kessler.status, Some(InjuryStatus::Questionable));

    let utah_reasons = &game.away.projection.reasons;
    assert!(utah_reasons.iter().any(|r| r.starts_with("back-to-back")));
    assert!(utah_reasons.iter().any(|r| r == "variance: back-to-back x1.2"));

    let defaults = &outcome.games[1];
    assert_eq!(defaults.label, "Miami Heat @ Boston Celtics");
    assert_eq!(defaults.home.score, 113);
    assert_eq!(defaults.away.score, 111);
    assert_eq!(defaults.summary.pace_confidence, PaceConfidence::Low);
}

#[test]
fn slate_fixture_with_report() {
    let slate = parse_slate(&read_fixture("game_slate.json")).expect("fixture should parse");
    let report = parse_report(&read_fixture("injury_report.txt"));
    let baseline = analyze_slate(&slate, None, &EngineConfig::default());
    let outcome = analyze_slate(&slate, Some(&report), &EngineConfig::default());

    let game = &outcome.games[0];
    let names: Vec<_> = game
        .players
        .iter()
        .filter(|p| p.team == "Denver Nuggets")
        .map(|p| p.name.as_str())
        .collect();
    assert!(!names.contains(&"Michael Porter Jr."));
    assert_eq!(names.len(), 4);
    assert_eq!(game.home.unavailable.len(), 1);

    let jokic = game.players.iter().find(|p| p.name == "Nikola Jokic").unwrap();
    assert_eq!(jokic.status, Some(InjuryStatus::Questionable));
    let murray = game.players.iter().find(|p| p.name == "Jamal Murray").unwrap();
    assert_eq!(murray.conditional_on.as_deref(), Some("Nikola Jokic"));

    assert!(game.home.score < baseline.games[0].home.score);
    assert!(game.home.injury_points_lost > 0.0);
}

#[test]
fn every_projection_is_bounded() {
    let slate = parse_slate(&read_fixture("game_slate.json")).expect("fixture should parse");
    let report = parse_report(&read_fixture("injury_report.txt"));
    let outcome = analyze_slate(&slate, Some(&report), &EngineConfig::default());
    for game in &outcome.games {
        for team in [&game.home, &game.away] {
            assert!((85.0..=115.0).contains(&team.possessions));
        }
        for player in &game.players {
            let p = &player.points;
            assert!(p.ci95.0 >= 0.0);
            assert!(p.ci95.0 <= p.ci68.0 && p.ci68.0 <= p.mean);
            assert!(p.mean <= p.ci68.1 && p.ci68.1 <= p.ci95.1);
        }
    }
    assert_eq!(outcome.export.team_count(), 4);
    assert_eq!(outcome.export.player_count(), outcome.games[0].players.len());
}
