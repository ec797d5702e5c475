use serde::Serialize;
use tracing::debug;

use crate::model::{BattleConfidence, BattleKind, GameScriptBattle, TeamStatProfile};

/// The analyzer only grades individual battles; the aggregate read is always conservative.
pub const AGGREGATE_CONFIDENCE: &str = "Conservative";

const PAINT_THRESHOLD: f64 = 5.0;
const PAINT_HIGH: f64 = 8.0;
const PACE_THRESHOLD: f64 = 4.0;
const PACE_HIGH: f64 = 6.0;
const THREE_PCT_THRESHOLD: f64 = 0.04;
const THREE_PCT_HIGH: f64 = 0.06;
const BALL_MOVEMENT_THRESHOLD: f64 = 0.04;
const BALL_MOVEMENT_HIGH: f64 = 0.06;

const HIGH_THREE_RATE: f64 = 0.40;
const WEAK_THREE_DEFENSE: f64 = 0.365;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameScript {
    pub battles: Vec<GameScriptBattle>,
    pub insights: Vec<String>,
    pub confidence: &'static str,
}

impl GameScript {
    pub fn battles_for<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a GameScriptBattle> {
        self.battles.iter().filter(move |b| b.favors(team))
    }

    pub fn battle(&self, kind: BattleKind) -> Option<&GameScriptBattle> {
        self.battles.iter().find(|b| b.kind == kind)
    }
}

struct Axis {
    kind: BattleKind,
    threshold: f64,
    high: f64,
}

const AXES: [Axis; 4] = [
    Axis {
        kind: BattleKind::Interior,
        threshold: PAINT_THRESHOLD,
        high: PAINT_HIGH,
    },
    Axis {
        kind: BattleKind::Tempo,
        threshold: PACE_THRESHOLD,
        high: PACE_HIGH,
    },
    Axis {
        kind: BattleKind::Perimeter,
        threshold: THREE_PCT_THRESHOLD,
        high: THREE_PCT_HIGH,
    },
    Axis {
        kind: BattleKind::BallMovement,
        threshold: BALL_MOVEMENT_THRESHOLD,
        high: BALL_MOVEMENT_HIGH,
    },
];

/// Expected paint points for `team` against `opp`: the midpoint of what one scores and the
/// other allows.
fn paint_projection(team: &TeamStatProfile, opp: &TeamStatProfile) -> f64 {
    (team.general.paint_pts + opp.paint_allowed()) / 2.0
}

fn three_pct_projection(team: &TeamStatProfile, opp: &TeamStatProfile) -> f64 {
    (team.general.three_point_pct + opp.three_pct_allowed()) / 2.0
}

fn pace_of(team: &TeamStatProfile) -> f64 {
    team.advanced
        .pace
        .or_else(|| team.offensive_style().and_then(|o| o.pace))
        .unwrap_or(crate::model::LEAGUE_PACE)
}

/// Share of made field goals that are assisted, preferring the style feed.
fn assist_rate(team: &TeamStatProfile) -> f64 {
    if let Some(style) = team.offensive_style() {
        return style.ball_movement.assist_rate;
    }
    if team.general.field_goals_made > 0.0 {
        team.general.assists / team.general.field_goals_made
    } else {
        0.0
    }
}

/// Turnovers a defense forces per possession.
fn forced_turnover_rate(team: &TeamStatProfile) -> f64 {
    team.general.opponent_turnovers / pace_of(team).max(1.0)
}

/// Assist rate net of the pressure the opposing defense applies.
fn ball_movement_index(team: &TeamStatProfile, opp: &TeamStatProfile) -> f64 {
    assist_rate(team) - forced_turnover_rate(opp)
}

/// Signed differential for an axis, positive when `home` holds the edge.
fn axis_differential(kind: BattleKind, home: &TeamStatProfile, away: &TeamStatProfile) -> f64 {
    match kind {
        BattleKind::Interior => paint_projection(home, away) - paint_projection(away, home),
        BattleKind::Tempo => pace_of(home) - pace_of(away),
        BattleKind::Perimeter => three_pct_projection(home, away) - three_pct_projection(away, home),
        BattleKind::BallMovement => ball_movement_index(home, away) - ball_movement_index(away, home),
    }
}

fn insight(kind: BattleKind, battle: &GameScriptBattle, other: &str) -> String {
    let team = &battle.advantage_team;
    let diff = battle.differential.abs();
    match kind {
        BattleKind::Interior => format!(
            "{team} should attack the paint: +{diff:.1} projected paint points against {other}"
        ),
        BattleKind::Tempo => format!(
            "{team} wants to push the pace: {diff:.1} more possessions per 48 than {other}"
        ),
        BattleKind::Perimeter => format!(
            "{team} holds the perimeter edge: +{:.1}% projected three-point accuracy vs {other}",
            diff * 100.0
        ),
        BattleKind::BallMovement => format!(
            "{team} moves the ball well enough to beat {other}'s pressure (+{:.1}% net assist rate)",
            diff * 100.0
        ),
    }
}

fn style_insights(home: &TeamStatProfile, away: &TeamStatProfile) -> Vec<String> {
    let (Some(home_style), Some(away_style)) = (home.style.as_ref(), away.style.as_ref()) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (shooter, shooter_style, defender, defender_style) in [
        (home, home_style, away, away_style),
        (away, away_style, home, home_style),
    ] {
        let rate = shooter_style.offensive_style.shot_selection.three_point_rate;
        let allowed = defender_style.defensive_style.opponent_three_point_pct;
        if rate > HIGH_THREE_RATE && allowed > WEAK_THREE_DEFENSE {
            out.push(format!(
                "{} takes {:.0}% of shots from three and {} allows {:.1}% from deep",
                shooter.name,
                rate * 100.0,
                defender.name,
                allowed * 100.0
            ));
        }
    }
    out
}

pub fn analyze(home: &TeamStatProfile, away: &TeamStatProfile) -> GameScript {
    let mut battles = Vec::new();
    let mut insights = Vec::new();

    for axis in &AXES {
        let diff = axis_differential(axis.kind, home, away);
        if diff.abs() <= axis.threshold {
            continue;
        }
        let (winner, loser) = if diff > 0.0 { (home, away) } else { (away, home) };
        let confidence = if diff.abs() > axis.high {
            BattleConfidence::High
        } else {
            BattleConfidence::Medium
        };
        let battle = GameScriptBattle {
            kind: axis.kind,
            advantage_team: winner.name.clone(),
            differential: diff.abs(),
            confidence,
        };
        debug!(kind = ?axis.kind, team = %winner.name, diff, "game script battle");
        insights.push(insight(axis.kind, &battle, &loser.name));
        battles.push(battle);
    }

    insights.extend(style_insights(home, away));

    GameScript {
        battles,
        insights,
        confidence: AGGREGATE_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BallMovement, DefensiveStyle, OffensiveStyle, ShotSelection, StyleProfile};

    fn team(name: &str) -> TeamStatProfile {
        TeamStatProfile::named(name)
    }

    #[test]
    fn even_teams_produce_no_battles() {
        let script = analyze(&team("A"), &team("B"));
        assert!(script.battles.is_empty());
        assert!(script.insights.is_empty());
        assert_eq!(script.confidence, "Conservative");
    }

    #[test]
    fn paint_edge_grades_confidence() {
        let mut home = team("Home");
        home.general.paint_pts = 60.0;
        let away = team("Away");
        // (60 + 48)/2 - (48 + 48)/2 = 6
        let script = analyze(&home, &away);
        let b = script.battle(BattleKind::Interior).unwrap();
        assert_eq!(b.advantage_team, "Home");
        assert_eq!(b.confidence, BattleConfidence::Medium);
        assert!((b.differential - 6.0).abs() < 1e-9);

        home.general.paint_pts = 66.0;
        let script = analyze(&home, &away);
        assert_eq!(
            script.battle(BattleKind::Interior).unwrap().confidence,
            BattleConfidence::High
        );
    }

    #[test]
    fn tempo_battle_goes_to_faster_team() {
        let mut home = team("Home");
        let mut away = team("Away");
        home.advanced.pace = Some(97.0);
        away.advanced.pace = Some(104.5);
        let script = analyze(&home, &away);
        let b = script.battle(BattleKind::Tempo).unwrap();
        assert_eq!(b.advantage_team, "Away");
        assert_eq!(b.confidence, BattleConfidence::High);
        assert_eq!(script.battles_for("Away").count(), 1);
        assert_eq!(script.battles_for("Home").count(), 0);
    }

    #[test]
    fn equal_assist_rates_produce_no_ball_movement_battle() {
        let mut home = team("Home");
        let mut away = team("Away");
        home.general.assists = 31.0;
        home.general.field_goals_made = 46.5;
        away.general.assists = 26.0;
        away.general.field_goals_made = 39.0;
        let script = analyze(&home, &away);
        assert!(script.battle(BattleKind::BallMovement).is_none());
        assert!(script.insights.is_empty());
    }

    #[test]
    fn ball_movement_grades_assist_rate_against_pressure() {
        let mut home = team("Home");
        let mut away = team("Away");
        // 30/40 = 0.75 vs 25/41 = 0.61, equal pressure.
        home.general.assists = 30.0;
        home.general.field_goals_made = 40.0;
        let script = analyze(&home, &away);
        let b = script.battle(BattleKind::BallMovement).unwrap();
        assert_eq!(b.advantage_team, "Home");
        assert_eq!(b.confidence, BattleConfidence::High);

        // Away forcing 23 turnovers per 100 possessions eats into the home edge.
        away.general.opponent_turnovers = 23.0;
        let script = analyze(&home, &away);
        let b = script.battle(BattleKind::BallMovement).unwrap();
        assert_eq!(b.confidence, BattleConfidence::Medium);
        assert!((b.differential - ((0.75 - 0.23) - (25.0 / 41.0 - 0.14))).abs() < 1e-9);

        away.style = Some(StyleProfile {
            offensive_style: OffensiveStyle {
                ball_movement: BallMovement { assist_rate: 0.66 },
                ..Default::default()
            },
            ..Default::default()
        });
        let script = analyze(&home, &away);
        assert!(script.battle(BattleKind::BallMovement).is_none());
    }

    #[test]
    fn exact_threshold_does_not_fire() {
        let mut home = team("Home");
        home.advanced.pace = Some(104.0);
        let script = analyze(&home, &team("Away"));
        assert!(script.battle(BattleKind::Tempo).is_none());
    }

    #[test]
    fn style_profiles_add_three_point_insight() {
        let mut home = team("Home");
        let mut away = team("Away");
        home.style = Some(StyleProfile {
            offensive_style: OffensiveStyle {
                shot_selection: ShotSelection {
                    three_point_rate: 0.45,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        });
        away.style = Some(StyleProfile {
            defensive_style: DefensiveStyle {
                opponent_three_point_pct: 0.38,
                ..Default::default()
            },
            ..Default::default()
        });
        let script = analyze(&home, &away);
        assert_eq!(script.insights.len(), 1);
        assert!(script.insights[0].starts_with("Home takes 45%"));
    }
}
