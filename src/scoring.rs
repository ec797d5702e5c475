use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::warn;

use crate::game_script::GameScript;
use crate::model::{
    BattleConfidence, BattleKind, LEAGUE_PACE, LEAGUE_RATING, TeamSchedule, TeamStatProfile,
};

pub const PACE_MIN: f64 = 85.0;
pub const PACE_MAX: f64 = 115.0;

const HOME_PACE_WEIGHT: f64 = 0.55;
const AWAY_PACE_WEIGHT: f64 = 0.45;
const HOME_CONTROL_PER_POSSESSION: f64 = 0.3;
const HOME_CONTROL_CAP: f64 = 1.5;
const STYLE_PACE_WEIGHT: f64 = 0.30;
const LINEUP_CLASH: f64 = 3.0;
const LINEUP_PULL: f64 = 0.20;
const PACE_BACK_TO_BACK: f64 = -2.0;
const PACE_REST_PER_DAY: f64 = 0.5;
const MAX_REST_DAYS: u32 = 3;

const TOV_WEIGHT: f64 = 0.4;
const OREB_WEIGHT: f64 = 0.35;
const DREB_SHARE: f64 = 0.25;
const POSS_BACK_TO_BACK: f64 = -1.5;
const POSS_REST_PER_DAY: f64 = 0.3;

const EFFICIENCY_BASE: f64 = 1.10;
const DEFENSE_EXPONENT: f64 = 0.7;
const EFF_BACK_TO_BACK: f64 = 0.97;
const EFF_REST_PER_DAY: f64 = 0.005;
const EFF_REST_CAP: f64 = 0.02;
const HOME_COURT: f64 = 1.015;
const STRENGTH_SLOPE: f64 = 0.04;
const STRENGTH_CAP: f64 = 0.02;
const INJURY_DRAG_SHARE: f64 = 0.5;
const INJURY_DRAG_CAP: f64 = 0.08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PaceConfidence {
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl PaceConfidence {
    pub fn from_layers(layers: u8) -> Self {
        match layers {
            0 => PaceConfidence::Low,
            1 => PaceConfidence::Medium,
            2 => PaceConfidence::High,
            _ => PaceConfidence::VeryHigh,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScheduleContext {
    pub home: TeamSchedule,
    pub away: TeamSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaceEstimate {
    pub pace: f64,
    pub unclamped: f64,
    pub layers: u8,
    pub confidence: PaceConfidence,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamScore {
    pub team: String,
    pub score: u32,
    pub possessions: f64,
    pub efficiency: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredGame {
    pub pace: PaceEstimate,
    pub home: TeamScore,
    pub away: TeamScore,
}

/// Everything the scorer needs about one side beyond the two profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideContext {
    pub schedule: Option<TeamSchedule>,
    /// Expected points removed from the rotation by injury designations.
    pub injury_points_lost: f64,
}

fn rest_days(s: &TeamSchedule) -> f64 {
    s.rest_days.min(MAX_REST_DAYS) as f64
}

pub fn resolve_pace(
    home: &TeamStatProfile,
    away: &TeamStatProfile,
    schedule: Option<&ScheduleContext>,
) -> PaceEstimate {
    let mut layers = 0u8;
    let mut notes = Vec::new();
    let mut pace = LEAGUE_PACE;

    if let (Some(h), Some(a)) = (home.advanced.pace, away.advanced.pace) {
        let weighted = h * HOME_PACE_WEIGHT + a * AWAY_PACE_WEIGHT;
        let control = ((h - a) * HOME_CONTROL_PER_POSSESSION)
            .clamp(-HOME_CONTROL_CAP, HOME_CONTROL_CAP);
        pace = weighted + control;
        layers += 1;
        notes.push(format!("team pace {weighted:.1} with home control {control:+.1}"));
    }

    let style_h = home.offensive_style().and_then(|o| o.pace);
    let style_a = away.offensive_style().and_then(|o| o.pace);
    let style = match (style_h, style_a) {
        (Some(h), Some(a)) => Some(h * HOME_PACE_WEIGHT + a * AWAY_PACE_WEIGHT),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    };
    if let Some(style) = style {
        pace = if layers == 0 {
            style
        } else {
            pace * (1.0 - STYLE_PACE_WEIGHT) + style * STYLE_PACE_WEIGHT
        };
        layers += 1;
        notes.push(format!("style pace {style:.1} blended"));
    }

    let lineup_pace = |t: &TeamStatProfile| {
        t.rotation()
            .and_then(|r| r.starting_lineup.as_ref())
            .and_then(|u| u.pace)
    };
    if let (Some(h), Some(a)) = (lineup_pace(home), lineup_pace(away)) {
        layers += 1;
        let clash = (h - a).abs();
        if clash > LINEUP_CLASH {
            let mid = (h + a) / 2.0;
            pace = pace * (1.0 - LINEUP_PULL) + mid * LINEUP_PULL;
            notes.push(format!("lineup pace clash {clash:.1} pulls toward {mid:.1}"));
        }
    }

    if let Some(ctx) = schedule {
        layers += 1;
        for side in [&ctx.home, &ctx.away] {
            if side.back_to_back {
                pace += PACE_BACK_TO_BACK;
                notes.push("back-to-back slows pace".to_string());
            }
        }
        let rest_gap = (rest_days(&ctx.home) - rest_days(&ctx.away)).abs();
        if rest_gap > 0.0 {
            pace += PACE_REST_PER_DAY * rest_gap;
            notes.push(format!("rest advantage {rest_gap:.0} day(s)"));
        }
    }

    let unclamped = pace;
    if !(PACE_MIN..=PACE_MAX).contains(&unclamped) {
        warn!(
            pace = unclamped,
            home = %home.name,
            away = %away.name,
            "pace outside plausible range, clamping"
        );
    }

    PaceEstimate {
        pace: unclamped.clamp(PACE_MIN, PACE_MAX),
        unclamped,
        layers,
        confidence: PaceConfidence::from_layers(layers),
        notes,
    }
}

pub fn project_possessions(
    pace: f64,
    team: &TeamStatProfile,
    opp: &TeamStatProfile,
    schedule: Option<&TeamSchedule>,
    script: &GameScript,
    reasons: &mut Vec<String>,
) -> f64 {
    let tov_adj = (opp.general.turnovers - team.general.turnovers) * TOV_WEIGHT;
    let oreb_adj = (team.general.offensive_rebounds - DREB_SHARE * opp.general.defensive_rebounds)
        .max(0.0)
        * OREB_WEIGHT;
    let mut poss = (pace + tov_adj + oreb_adj).clamp(PACE_MIN, PACE_MAX);

    if let Some(s) = schedule {
        if s.back_to_back {
            poss += POSS_BACK_TO_BACK;
            reasons.push("back-to-back: -1.5 possessions".to_string());
        }
        let days = rest_days(s);
        if days > 0.0 {
            poss += POSS_REST_PER_DAY * days;
        }
    }

    for battle in script.battles_for(&team.name) {
        if battle.kind == BattleKind::Tempo {
            let extra = match battle.confidence {
                BattleConfidence::High => 2.0,
                BattleConfidence::Medium => 1.0,
            };
            poss += extra;
            reasons.push(format!("tempo battle: +{extra:.0} possessions"));
        }
    }

    poss.clamp(PACE_MIN, PACE_MAX)
}

/// Points per possession. The defensive term is damped by a fixed 0.7 exponent.
pub fn base_efficiency(team: &TeamStatProfile, opp: &TeamStatProfile) -> f64 {
    let off = team.advanced.offensive_rating.max(1.0);
    let def = opp.advanced.defensive_rating.max(1.0);
    (off / LEAGUE_RATING) * (LEAGUE_RATING / def).powf(DEFENSE_EXPONENT) * EFFICIENCY_BASE
}

fn battle_bump(kind: BattleKind, confidence: BattleConfidence) -> f64 {
    let high = confidence == BattleConfidence::High;
    match (kind, high) {
        (BattleKind::Interior, true) => 0.03,
        (BattleKind::Interior, false) => 0.015,
        (BattleKind::Perimeter, true) => 0.025,
        (BattleKind::Perimeter, false) => 0.012,
        (BattleKind::Tempo, true) => 0.01,
        (BattleKind::Tempo, false) => 0.005,
        (BattleKind::BallMovement, _) => 0.0,
    }
}

pub fn project_efficiency(
    team: &TeamStatProfile,
    opp: &TeamStatProfile,
    is_home: bool,
    side: &SideContext,
    script: &GameScript,
    reasons: &mut Vec<String>,
) -> f64 {
    let mut eff = base_efficiency(team, opp);

    if let Some(s) = side.schedule.as_ref() {
        if s.back_to_back {
            eff *= EFF_BACK_TO_BACK;
            reasons.push("back-to-back: efficiency x0.97".to_string());
        }
        // Capped by the bonus itself, not by the three-day window used for pace.
        let rest = (EFF_REST_PER_DAY * f64::from(s.rest_days)).min(EFF_REST_CAP);
        if rest > 0.0 {
            eff *= 1.0 + rest;
            reasons.push(format!("rest: efficiency +{:.1}%", rest * 100.0));
        }
    }

    if is_home {
        eff *= HOME_COURT;
        reasons.push("home court: efficiency +1.5%".to_string());
    }

    let strength = (STRENGTH_SLOPE * (team.general.win_pct() - opp.general.win_pct()))
        .clamp(-STRENGTH_CAP, STRENGTH_CAP);
    if strength != 0.0 {
        eff *= 1.0 + strength;
        reasons.push(format!("team strength: {:+.1}%", strength * 100.0));
    }

    for battle in script.battles_for(&team.name) {
        let bump = battle_bump(battle.kind, battle.confidence);
        if bump > 0.0 {
            eff *= 1.0 + bump;
            reasons.push(format!("{:?} battle: efficiency +{:.1}%", battle.kind, bump * 100.0));
        }
    }

    if side.injury_points_lost > 0.0 && team.general.points > 0.0 {
        let drag = (INJURY_DRAG_SHARE * side.injury_points_lost / team.general.points)
            .min(INJURY_DRAG_CAP);
        eff *= 1.0 - drag;
        reasons.push(format!("injuries: efficiency -{:.1}%", drag * 100.0));
    }

    eff
}

pub fn score_team(
    pace: f64,
    team: &TeamStatProfile,
    opp: &TeamStatProfile,
    is_home: bool,
    side: &SideContext,
    script: &GameScript,
) -> TeamScore {
    let mut reasons = Vec::new();
    let possessions =
        project_possessions(pace, team, opp, side.schedule.as_ref(), script, &mut reasons);
    let efficiency = project_efficiency(team, opp, is_home, side, script, &mut reasons);
    TeamScore {
        team: team.name.clone(),
        score: (possessions * efficiency).round().max(0.0) as u32,
        possessions,
        efficiency,
        reasons,
    }
}

pub fn score_game(
    home: &TeamStatProfile,
    away: &TeamStatProfile,
    home_side: &SideContext,
    away_side: &SideContext,
    script: &GameScript,
) -> ScoredGame {
    let schedule = match (home_side.schedule, away_side.schedule) {
        (None, None) => None,
        (h, a) => Some(ScheduleContext {
            home: h.unwrap_or_default(),
            away: a.unwrap_or_default(),
        }),
    };
    let pace = resolve_pace(home, away, schedule.as_ref());
    let home_score = score_team(pace.pace, home, away, true, home_side, script);
    let away_score = score_team(pace.pace, away, home, false, away_side, script);
    ScoredGame {
        pace,
        home: home_score,
        away: away_score,
    }
}

/// Home win probability from a normal approximation of the score margin.
pub fn win_probability(home_mean: f64, away_mean: f64, home_sd: f64, away_sd: f64) -> f64 {
    let spread_sd = (home_sd.powi(2) + away_sd.powi(2)).sqrt();
    if spread_sd <= f64::EPSILON {
        return match home_mean.partial_cmp(&away_mean) {
            Some(std::cmp::Ordering::Greater) => 1.0,
            Some(std::cmp::Ordering::Less) => 0.0,
            _ => 0.5,
        };
    }
    Normal::new(0.0, 1.0)
        .map(|n| n.cdf((home_mean - away_mean) / spread_sd))
        .unwrap_or(0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_script::{self, AGGREGATE_CONFIDENCE};
    use crate::model::{GameScriptBattle, LineupProfile, LineupUnit, RotationIntelligence};

    fn team(name: &str, pace: Option<f64>) -> TeamStatProfile {
        let mut t = TeamStatProfile::named(name);
        t.advanced.pace = pace;
        t
    }

    fn empty_script() -> GameScript {
        GameScript {
            battles: Vec::new(),
            insights: Vec::new(),
            confidence: AGGREGATE_CONFIDENCE,
        }
    }

    #[test]
    fn home_weighted_pace_with_control_bonus() {
        let home = team("Home", Some(98.0));
        let away = team("Away", Some(104.0));
        let est = resolve_pace(&home, &away, None);
        assert!((est.pace - 99.2).abs() < 1e-9);
        assert_eq!(est.layers, 1);
        assert_eq!(est.confidence, PaceConfidence::Medium);
    }

    #[test]
    fn missing_pace_falls_back_to_league_average() {
        let est = resolve_pace(&team("H", None), &team("A", None), None);
        assert_eq!(est.pace, 100.0);
        assert_eq!(est.layers, 0);
        assert_eq!(est.confidence, PaceConfidence::Low);
    }

    #[test]
    fn confidence_counts_layers() {
        let lineup = |pace: f64| LineupProfile {
            rotation_intelligence: RotationIntelligence {
                starting_lineup: Some(LineupUnit {
                    pace: Some(pace),
                    ..Default::default()
                }),
                ..Default::default()
            },
        };
        let mut home = team("H", Some(100.0));
        let mut away = team("A", Some(100.0));
        home.lineups = Some(lineup(106.0));
        away.lineups = Some(lineup(98.0));
        let est = resolve_pace(&home, &away, None);
        assert_eq!(est.layers, 2);
        assert_eq!(est.confidence, PaceConfidence::High);
        // 100 * 0.8 + 102 * 0.2
        assert!((est.pace - 100.4).abs() < 1e-9);

        let sched = ScheduleContext {
            home: TeamSchedule {
                back_to_back: true,
                rest_days: 0,
            },
            away: TeamSchedule {
                back_to_back: false,
                rest_days: 2,
            },
        };
        let est = resolve_pace(&home, &away, Some(&sched));
        assert_eq!(est.layers, 3);
        assert_eq!(est.confidence, PaceConfidence::VeryHigh);
        assert!((est.pace - (100.4 - 2.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn extreme_pace_is_clamped() {
        let est = resolve_pace(&team("H", Some(140.0)), &team("A", Some(138.0)), None);
        assert_eq!(est.pace, PACE_MAX);
        assert!(est.unclamped > PACE_MAX);
    }

    #[test]
    fn league_average_teams_score_near_110() {
        let home = team("Home", Some(100.0));
        let away = team("Away", Some(100.0));
        let game = score_game(
            &home,
            &away,
            &SideContext::default(),
            &SideContext::default(),
            &game_script::analyze(&home, &away),
        );
        // 100 pace + 0.7875 OREB adjustment, 1.10 PPP, home x1.015.
        assert_eq!(game.away.score, 111);
        assert_eq!(game.home.score, 113);
    }

    #[test]
    fn efficiency_damps_defense() {
        let mut team_a = team("A", None);
        let mut opp = team("B", None);
        team_a.advanced.offensive_rating = 121.0;
        opp.advanced.defensive_rating = 100.0;
        let expected = 1.1 * (110.0_f64 / 100.0).powf(0.7) * 1.10;
        assert!((base_efficiency(&team_a, &opp) - expected).abs() < 1e-12);
    }

    #[test]
    fn tempo_battle_adds_possessions_within_bounds() {
        let home = team("Home", None);
        let away = team("Away", None);
        let script = GameScript {
            battles: vec![GameScriptBattle {
                kind: BattleKind::Tempo,
                advantage_team: "Home".into(),
                differential: 7.0,
                confidence: BattleConfidence::High,
            }],
            insights: Vec::new(),
            confidence: AGGREGATE_CONFIDENCE,
        };
        let mut reasons = Vec::new();
        let with = project_possessions(100.0, &home, &away, None, &script, &mut reasons);
        let without =
            project_possessions(100.0, &home, &away, None, &empty_script(), &mut Vec::new());
        assert!((with - without - 2.0).abs() < 1e-9);
        let capped = project_possessions(114.5, &home, &away, None, &script, &mut Vec::new());
        assert_eq!(capped, PACE_MAX);
    }

    #[test]
    fn injury_drag_is_capped() {
        let home = team("Home", None);
        let away = team("Away", None);
        let side = SideContext {
            schedule: None,
            injury_points_lost: 80.0,
        };
        let eff =
            project_efficiency(&home, &away, false, &side, &empty_script(), &mut Vec::new());
        assert!((eff - 1.10 * 0.92).abs() < 1e-12);
    }

    fn efficiency_with(
        team: &TeamStatProfile,
        opp: &TeamStatProfile,
        schedule: Option<TeamSchedule>,
        script: &GameScript,
    ) -> f64 {
        let side = SideContext {
            schedule,
            injury_points_lost: 0.0,
        };
        project_efficiency(team, opp, false, &side, script, &mut Vec::new())
    }

    #[test]
    fn battle_bumps_scale_efficiency() {
        let home = team("Home", None);
        let away = team("Away", None);
        let base = efficiency_with(&home, &away, None, &empty_script());
        for (kind, confidence, bump) in [
            (BattleKind::Interior, BattleConfidence::Medium, 0.015),
            (BattleKind::Interior, BattleConfidence::High, 0.03),
            (BattleKind::Perimeter, BattleConfidence::Medium, 0.012),
            (BattleKind::Perimeter, BattleConfidence::High, 0.025),
            (BattleKind::Tempo, BattleConfidence::Medium, 0.005),
            (BattleKind::Tempo, BattleConfidence::High, 0.01),
            (BattleKind::BallMovement, BattleConfidence::High, 0.0),
        ] {
            let script = GameScript {
                battles: vec![GameScriptBattle {
                    kind,
                    advantage_team: "Home".into(),
                    differential: 10.0,
                    confidence,
                }],
                ..empty_script()
            };
            let eff = efficiency_with(&home, &away, None, &script);
            assert!(
                (eff - base * (1.0 + bump)).abs() < 1e-12,
                "{kind:?} {confidence:?}"
            );
            // The other side gets nothing from a battle it lost.
            let lost = efficiency_with(&away, &home, None, &script);
            assert!((lost - base).abs() < 1e-12);
        }
    }

    #[test]
    fn schedule_scales_efficiency() {
        let home = team("Home", None);
        let away = team("Away", None);
        let script = empty_script();
        let sched = |back_to_back, rest_days| {
            Some(TeamSchedule {
                back_to_back,
                rest_days,
            })
        };
        assert!((efficiency_with(&home, &away, sched(true, 0), &script) - 1.10 * 0.97).abs() < 1e-12);
        assert!((efficiency_with(&home, &away, sched(false, 2), &script) - 1.10 * 1.01).abs() < 1e-12);
        assert!((efficiency_with(&home, &away, sched(false, 4), &script) - 1.10 * 1.02).abs() < 1e-12);
        assert!((efficiency_with(&home, &away, sched(false, 9), &script) - 1.10 * 1.02).abs() < 1e-12);
    }

    #[test]
    fn team_strength_is_clamped() {
        let mut strong = team("Strong", None);
        let mut weak = team("Weak", None);
        strong.general.wins = 30;
        strong.general.losses = 20;
        weak.general.wins = 20;
        weak.general.losses = 30;
        let script = empty_script();
        // 0.04 * (0.6 - 0.4)
        assert!((efficiency_with(&strong, &weak, None, &script) - 1.10 * 1.008).abs() < 1e-12);
        assert!((efficiency_with(&weak, &strong, None, &script) - 1.10 * 0.992).abs() < 1e-12);

        strong.general.wins = 45;
        strong.general.losses = 5;
        weak.general.wins = 5;
        weak.general.losses = 45;
        assert!((efficiency_with(&strong, &weak, None, &script) - 1.10 * 1.02).abs() < 1e-12);
        assert!((efficiency_with(&weak, &strong, None, &script) - 1.10 * 0.98).abs() < 1e-12);
    }

    #[test]
    fn win_probability_is_symmetric() {
        assert!((win_probability(110.0, 110.0, 9.0, 9.0) - 0.5).abs() < 1e-9);
        let p = win_probability(115.0, 105.0, 9.0, 9.0);
        assert!(p > 0.75 && p < 0.85);
        assert_eq!(win_probability(101.0, 100.0, 0.0, 0.0), 1.0);
    }
}
