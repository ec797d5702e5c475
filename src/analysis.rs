//! One game, end to end: injuries and scenarios, tiers, game script,
//! enhancement, team scoring and variance.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::enhance::{self, PlayerContext};
use crate::game_script::{self, GameScript};
use crate::impact::{Tier, classify, normalize_name};
use crate::injury::{InjuryStatus, apply_injury};
use crate::injury_report::{ParsedReport, parse_report};
use crate::model::{InjuryRecord, PlayerStatLine, Projection, TeamSchedule, TeamStatProfile};
use crate::scoring::{self, PaceConfidence, PaceEstimate, SideContext, TeamScore};
use crate::teammates::{ConditionalProjection, project_teammate, select_driver};
use crate::variance::{self, TeamVolatility, VolatilityFlags};

const MIN_MINUTES_SAMPLE: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamInput {
    pub profile: TeamStatProfile,
    pub players: Vec<PlayerStatLine>,
    pub injuries: Vec<InjuryRecord>,
    pub schedule: Option<TeamSchedule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameInput {
    pub home: TeamInput,
    pub away: TeamInput,
    /// Raw injury report text for this game; overrides any slate-wide report.
    pub report_text: Option<String>,
}

impl GameInput {
    pub fn label(&self) -> String {
        format!("{} @ {}", self.away.profile.name, self.home.profile.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProjection {
    pub name: String,
    pub team: String,
    pub tier: Tier,
    pub status: Option<InjuryStatus>,
    pub minutes: f64,
    pub points: Projection,
    pub rebounds: f64,
    pub assists: f64,
    pub three_pointers: f64,
    pub uncertainty: f64,
    pub injury_note: Option<String>,
    pub conditional_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamProjection {
    pub team: String,
    pub score: u32,
    pub projection: Projection,
    pub possessions: f64,
    pub efficiency: f64,
    pub injury_points_lost: f64,
    pub unavailable: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameSummary {
    pub total: u32,
    /// Home score minus away score.
    pub spread: i64,
    pub home_win_probability: f64,
    pub pace: f64,
    pub pace_confidence: PaceConfidence,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameAnalysis {
    pub label: String,
    pub home: TeamProjection,
    pub away: TeamProjection,
    pub players: Vec<PlayerProjection>,
    pub script: GameScript,
    pub pace: PaceEstimate,
    pub summary: GameSummary,
}

struct PreparedPlayer {
    adjusted: PlayerStatLine,
    status: Option<InjuryStatus>,
    injury_uncertainty: f64,
    injury_note: Option<String>,
    conditional: Option<ConditionalProjection>,
}

struct PreparedSide {
    players: Vec<PreparedPlayer>,
    injury_points_lost: f64,
    major_injuries: usize,
    unavailable: Vec<String>,
}

/// Supplied records first; report records fill in players not already listed.
fn team_injuries(team: &TeamInput, report: Option<&ParsedReport>) -> Vec<InjuryRecord> {
    let mut out = team.injuries.clone();
    let Some(report) = report else {
        return out;
    };
    for record in report.records_for_team(&team.profile.name) {
        let key = normalize_name(&record.player_name);
        if !out.iter().any(|r| normalize_name(&r.player_name) == key) {
            out.push(record.clone());
        }
    }
    out
}

fn prepare_side(team: &TeamInput, report: Option<&ParsedReport>) -> PreparedSide {
    let injuries = team_injuries(team, report);
    let base: Vec<PlayerStatLine> = team
        .players
        .iter()
        .map(|p| {
            let mut line = classify(p);
            if line.team.is_empty() {
                line.team = team.profile.name.clone();
            }
            line
        })
        .collect();
    let driver = select_driver(&base, &injuries);
    if let Some(d) = driver.as_ref() {
        debug!(team = %team.profile.name, driver = %d.name, status = %d.status, "scenario driver");
    }

    let mut side = PreparedSide {
        players: Vec::with_capacity(base.len()),
        injury_points_lost: 0.0,
        major_injuries: 0,
        unavailable: Vec::new(),
    };

    for line in &base {
        let key = normalize_name(&line.name);
        let record = injuries
            .iter()
            .find(|r| normalize_name(&r.player_name) == key);
        let prepared = match record {
            Some(record) => {
                let adj = apply_injury(line, record);
                side.injury_points_lost += (line.points - adj.line.points).max(0.0);
                if line.impact.tier.is_star()
                    && matches!(record.status, InjuryStatus::Out | InjuryStatus::Doubtful)
                {
                    side.major_injuries += 1;
                }
                if record.status == InjuryStatus::Out {
                    side.unavailable.push(format!("{} ({})", line.name, adj.note));
                }
                // Listed teammates who still play share in the driver's scenarios;
                // the driver itself gets a no-op.
                let cond = (record.status != InjuryStatus::Out)
                    .then(|| project_teammate(&adj.line, driver.as_ref()))
                    .filter(|c| c.is_active());
                let adjusted = match &cond {
                    Some(c) => c.apply_to(&adj.line),
                    None => adj.line,
                };
                PreparedPlayer {
                    adjusted: classify(&adjusted),
                    status: Some(record.status),
                    injury_uncertainty: adj.uncertainty,
                    injury_note: Some(adj.note),
                    conditional: cond,
                }
            }
            None => {
                let cond = project_teammate(line, driver.as_ref());
                PreparedPlayer {
                    adjusted: classify(&cond.apply_to(line)),
                    status: None,
                    injury_uncertainty: 0.0,
                    injury_note: None,
                    conditional: cond.is_active().then_some(cond),
                }
            }
        };
        side.players.push(prepared);
    }
    side
}

/// Indices of the `limit` heaviest-minute players still expected to play.
fn tracked(side: &PreparedSide, limit: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..side.players.len())
        .filter(|&i| side.players[i].adjusted.minutes > 0.0)
        .collect();
    idx.sort_by(|&a, &b| {
        let (pa, pb) = (&side.players[a].adjusted, &side.players[b].adjusted);
        pb.minutes
            .partial_cmp(&pa.minutes)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| pa.name.cmp(&pb.name))
    });
    idx.truncate(limit);
    idx
}

fn minutes_volatility(line: &PlayerStatLine) -> f64 {
    if line.recent_minutes.len() < MIN_MINUTES_SAMPLE {
        return 0.0;
    }
    variance::sample_std_dev(&line.recent_minutes).unwrap_or(0.0)
}

#[allow(clippy::too_many_arguments)]
fn project_side_players(
    side: &PreparedSide,
    team: &TeamStatProfile,
    opponent: &TeamStatProfile,
    is_home: bool,
    script: &GameScript,
    pace_volatility: f64,
    limit: usize,
    out: &mut Vec<PlayerProjection>,
) {
    let adjusted: Vec<PlayerStatLine> = side.players.iter().map(|p| p.adjusted.clone()).collect();
    let ranks = enhance::rotation_ranks(&adjusted);

    for i in tracked(side, limit) {
        let prepared = &side.players[i];
        let line = &prepared.adjusted;
        let ctx = PlayerContext {
            player: line,
            team,
            opponent,
            is_home,
            rotation_rank: ranks.get(&normalize_name(&line.name)).copied(),
            battles: &script.battles,
        };
        let enhanced = enhance::enhance(&ctx);

        let mut reasons = Vec::new();
        if let Some(note) = &prepared.injury_note {
            reasons.push(format!("injury: {note}"));
        }
        if let Some(reason) = prepared.conditional.as_ref().and_then(|c| c.reason()) {
            reasons.push(reason);
        }
        reasons.extend(enhanced.reasons.iter().cloned());

        let matchup_uncertainty = prepared
            .conditional
            .as_ref()
            .map(|c| c.uncertainty)
            .unwrap_or(0.0);
        let flags = VolatilityFlags {
            injury_uncertainty: prepared.injury_uncertainty,
            pace_volatility,
            minutes_volatility: minutes_volatility(line),
            matchup_uncertainty,
        };
        let points = variance::player_projection(
            enhanced.line.points,
            line.impact.tier,
            &line.recent_points,
            &flags,
            reasons,
        );

        out.push(PlayerProjection {
            name: line.name.clone(),
            team: team.name.clone(),
            tier: line.impact.tier,
            status: prepared.status,
            minutes: line.minutes,
            points,
            rebounds: enhanced.line.rebounds,
            assists: enhanced.line.assists,
            three_pointers: enhanced.line.three_pointers_made,
            uncertainty: prepared.injury_uncertainty.max(matchup_uncertainty),
            injury_note: prepared.injury_note.clone(),
            conditional_on: prepared.conditional.as_ref().and_then(|c| c.driver.clone()),
        });
    }
}

fn team_projection(
    score: TeamScore,
    side: &PreparedSide,
    schedule: Option<&TeamSchedule>,
    pace_volatility: f64,
) -> TeamProjection {
    let vol = TeamVolatility {
        pace_volatility,
        major_injuries: side.major_injuries,
        back_to_back: schedule.is_some_and(|s| s.back_to_back),
    };
    let projection = variance::team_projection(score.score as f64, &vol, score.reasons);
    TeamProjection {
        team: score.team,
        score: score.score,
        projection,
        possessions: score.possessions,
        efficiency: score.efficiency,
        injury_points_lost: side.injury_points_lost,
        unavailable: side.unavailable.clone(),
    }
}

/// Analyzes one game. `shared_report` is a slate-wide parsed report; a game's own
/// `report_text` takes its place when present.
pub fn analyze_game(
    game: &GameInput,
    shared_report: Option<&ParsedReport>,
    config: &EngineConfig,
) -> GameAnalysis {
    let own_report = game.report_text.as_deref().map(parse_report);
    let report = own_report.as_ref().or(shared_report);

    let (home, away) = (&game.home.profile, &game.away.profile);

    let home_side = prepare_side(&game.home, report);
    let away_side = prepare_side(&game.away, report);

    let script = game_script::analyze(home, away);
    let pace_volatility = (home.advanced.pace_or_league() - away.advanced.pace_or_league()).abs();

    let mut players = Vec::new();
    project_side_players(
        &home_side,
        home,
        away,
        true,
        &script,
        pace_volatility,
        config.tracked_players,
        &mut players,
    );
    project_side_players(
        &away_side,
        away,
        home,
        false,
        &script,
        pace_volatility,
        config.tracked_players,
        &mut players,
    );

    let scored = scoring::score_game(
        home,
        away,
        &SideContext {
            schedule: game.home.schedule,
            injury_points_lost: home_side.injury_points_lost,
        },
        &SideContext {
            schedule: game.away.schedule,
            injury_points_lost: away_side.injury_points_lost,
        },
        &script,
    );

    let home_proj = team_projection(
        scored.home,
        &home_side,
        game.home.schedule.as_ref(),
        pace_volatility,
    );
    let away_proj = team_projection(
        scored.away,
        &away_side,
        game.away.schedule.as_ref(),
        pace_volatility,
    );

    let summary = GameSummary {
        total: home_proj.score + away_proj.score,
        spread: home_proj.score as i64 - away_proj.score as i64,
        home_win_probability: scoring::win_probability(
            home_proj.projection.mean,
            away_proj.projection.mean,
            home_proj.projection.std_dev,
            away_proj.projection.std_dev,
        ),
        pace: scored.pace.pace,
        pace_confidence: scored.pace.confidence,
    };

    let label = game.label();
    info!(
        game = %label,
        home = home_proj.score,
        away = away_proj.score,
        win_prob = summary.home_win_probability,
        "game analyzed"
    );

    GameAnalysis {
        label,
        home: home_proj,
        away: away_proj,
        players,
        script,
        pace: scored.pace,
        summary,
    }
}
