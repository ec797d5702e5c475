use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use hoops_projector::analysis::analyze_game;
use hoops_projector::config::EngineConfig;
use hoops_projector::enhance::{self, PlayerContext};
use hoops_projector::game_script;
use hoops_projector::impact::classify;
use hoops_projector::injury_report::parse_report;
use hoops_projector::slate::{Slate, analyze_slate, parse_slate};

fn sample_slate() -> Slate {
    parse_slate(SLATE_JSON).expect("valid fixture json")
}

fn bench_report_parse(c: &mut Criterion) {
    c.bench_function("injury_report_parse", |b| {
        b.iter(|| {
            let report = parse_report(black_box(REPORT_TEXT));
            black_box(report.records.len());
        })
    });
}

fn bench_enhance_player(c: &mut Criterion) {
    let slate = sample_slate();
    let game = &slate.games[0];
    let (home, away) = (&game.home.profile, &game.away.profile);
    let script = game_script::analyze(home, away);
    let player = classify(&game.home.players[0]);
    c.bench_function("enhance_player", |b| {
        b.iter(|| {
            let ctx = PlayerContext {
                player: black_box(&player),
                team: home,
                opponent: away,
                is_home: true,
                rotation_rank: Some(0),
                battles: &script.battles,
            };
            let line = enhance::enhance(&ctx);
            black_box(line.capped.points);
        })
    });
}

fn bench_analyze_game(c: &mut Criterion) {
    let slate = sample_slate();
    let report = parse_report(REPORT_TEXT);
    let config = EngineConfig::default();
    c.bench_function("analyze_game", |b| {
        b.iter(|| {
            let analysis = analyze_game(black_box(&slate.games[0]), Some(&report), &config);
            black_box(analysis.summary.total);
        })
    });
}

fn bench_analyze_slate(c: &mut Criterion) {
    let mut slate = sample_slate();
    let template = slate.games.clone();
    for _ in 0..7 {
        slate.games.extend(template.iter().cloned());
    }
    let config = EngineConfig::default();
    c.bench_function("analyze_slate_16_games", |b| {
        b.iter(|| {
            let outcome = analyze_slate(black_box(&slate), None, &config);
            black_box(outcome.export.team_count());
        })
    });
}

criterion_group!(
    perf,
    bench_report_parse,
    bench_enhance_player,
    bench_analyze_game,
    bench_analyze_slate
);
criterion_main!(perf);

static SLATE_JSON: &str = include_str!("../tests/fixtures/game_slate.json");
static REPORT_TEXT: &str = include_str!("../tests/fixtures/injury_report.txt");
