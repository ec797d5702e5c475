//! Player-level stat enhancements.
//!
//! Rules fire in the order declared by [`RULE_ORDER`]. Each rule sees the compound
//! multiplier accumulated so far, which only matters to the star amplification
//! rule at the end of the list. The compound is capped per stat at
//! [`MULTIPLIER_CAP`]; opponent defensive-scheme adjustments run afterwards and
//! are not part of the cap.

use std::collections::HashMap;

use serde::Serialize;

use crate::impact::{Tier, normalize_name};
use crate::model::{
    BattleConfidence, BattleKind, EnhancementMultiplier, GameScriptBattle, PlayerStatLine,
    StatFactors, TeamStatProfile,
};

pub const MULTIPLIER_CAP: f64 = 1.20;

const PACE_EDGE: f64 = 3.0;
const HIGH_THREE_RATE: f64 = 0.40;
const HIGH_THREES_MADE: f64 = 13.0;
const WEAK_THREE_DEFENSE: f64 = 0.365;
const WEAK_PAINT_COMPOSER: f64 = 50.0;
const DOMINANT_NET_RATING: f64 = 5.0;
const DOMINANT_MINUTES: f64 = 100.0;
const STABLE_CONFIDENCE: f64 = 0.7;

const RIM_PROTECTION_BELOW: f64 = 44.0;
const WEAK_PAINT_ABOVE: f64 = 52.0;
const ZONE_FREQUENCY_ABOVE: f64 = 0.15;
const SWITCH_RATE_ABOVE: f64 = 0.40;
const DRIVER_FTA: f64 = 4.0;
const ISOLATION_USAGE: f64 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleId {
    PaceAdvantage,
    PerimeterVolume,
    PaintMismatch,
    DominantLineup,
    StableRotation,
    GameScript,
    HomeCourt,
    StarMultiplier,
}

/// Evaluation order of the composer rules.
pub const RULE_ORDER: [RuleId; 8] = [
    RuleId::PaceAdvantage,
    RuleId::PerimeterVolume,
    RuleId::PaintMismatch,
    RuleId::DominantLineup,
    RuleId::StableRotation,
    RuleId::GameScript,
    RuleId::HomeCourt,
    RuleId::StarMultiplier,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DefenseRule {
    RimProtection,
    ZoneDefense,
    SwitchDefense,
    WeakPaint,
}

pub const DEFENSE_ORDER: [DefenseRule; 4] = [
    DefenseRule::RimProtection,
    DefenseRule::ZoneDefense,
    DefenseRule::SwitchDefense,
    DefenseRule::WeakPaint,
];

pub struct PlayerContext<'a> {
    pub player: &'a PlayerStatLine,
    pub team: &'a TeamStatProfile,
    pub opponent: &'a TeamStatProfile,
    pub is_home: bool,
    /// Zero-based rank by minutes within the team's rotation.
    pub rotation_rank: Option<usize>,
    pub battles: &'a [GameScriptBattle],
}

impl PlayerContext<'_> {
    fn rank_below(&self, n: usize) -> bool {
        self.rotation_rank.is_some_and(|r| r < n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Compound {
    pub points: f64,
    pub assists: f64,
    pub rebounds: f64,
    pub three_pointers: f64,
}

impl Default for Compound {
    fn default() -> Self {
        Self {
            points: 1.0,
            assists: 1.0,
            rebounds: 1.0,
            three_pointers: 1.0,
        }
    }
}

impl Compound {
    pub fn absorb(&mut self, f: &StatFactors) {
        self.points *= f.points.unwrap_or(1.0);
        self.assists *= f.assists.unwrap_or(1.0);
        self.rebounds *= f.rebounds.unwrap_or(1.0);
        self.three_pointers *= f.three_pointers.unwrap_or(1.0);
    }

    pub fn capped(self) -> Self {
        let cap = |v: f64| v.clamp(1.0, MULTIPLIER_CAP);
        Self {
            points: cap(self.points),
            assists: cap(self.assists),
            rebounds: cap(self.rebounds),
            three_pointers: cap(self.three_pointers),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefenseAdjustment {
    pub rule: DefenseRule,
    pub points: f64,
    pub three_pointers: f64,
    pub free_throw_attempts: f64,
    pub three_point_attempts: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancedLine {
    pub line: PlayerStatLine,
    pub multipliers: Vec<EnhancementMultiplier>,
    pub raw: Compound,
    pub capped: Compound,
    pub defense: Vec<DefenseAdjustment>,
    pub reasons: Vec<String>,
}

/// Zero-based minutes rank per normalized player name. Ties break on name.
pub fn rotation_ranks(players: &[PlayerStatLine]) -> HashMap<String, usize> {
    let mut order: Vec<&PlayerStatLine> = players.iter().filter(|p| p.minutes > 0.0).collect();
    order.sort_by(|a, b| {
        b.minutes
            .partial_cmp(&a.minutes)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    order
        .into_iter()
        .enumerate()
        .map(|(rank, p)| (normalize_name(&p.name), rank))
        .collect()
}

fn multiplier(rule: RuleId, factors: StatFactors, reason: String) -> EnhancementMultiplier {
    EnhancementMultiplier {
        rule: format!("{rule:?}"),
        factors,
        reason,
    }
}

fn pace_advantage(ctx: &PlayerContext) -> Option<EnhancementMultiplier> {
    let (Some(team_pace), Some(opp_pace)) = (ctx.team.advanced.pace, ctx.opponent.advanced.pace)
    else {
        return None;
    };
    let edge = team_pace - opp_pace;
    if edge <= PACE_EDGE || !ctx.rank_below(3) {
        return None;
    }
    Some(multiplier(
        RuleId::PaceAdvantage,
        StatFactors {
            points: Some(1.03),
            assists: Some(1.05),
            ..Default::default()
        },
        format!("pace advantage +{edge:.1} for top-3 rotation player"),
    ))
}

fn perimeter_volume(ctx: &PlayerContext) -> Option<EnhancementMultiplier> {
    let general = &ctx.team.general;
    let high_volume = match ctx.team.offensive_style() {
        Some(style) => style.shot_selection.three_point_rate > HIGH_THREE_RATE,
        None => match general.three_point_rate() {
            Some(rate) => rate > HIGH_THREE_RATE,
            None => general.three_pointers_made >= HIGH_THREES_MADE,
        },
    };
    let allowed = ctx.opponent.three_pct_allowed();
    if !high_volume || allowed <= WEAK_THREE_DEFENSE || !ctx.player.is_shooter() {
        return None;
    }
    Some(multiplier(
        RuleId::PerimeterVolume,
        StatFactors {
            points: Some(1.03),
            three_pointers: Some(1.08),
            ..Default::default()
        },
        format!(
            "high three-point volume vs {:.1}% allowed",
            allowed * 100.0
        ),
    ))
}

fn paint_mismatch(ctx: &PlayerContext) -> Option<EnhancementMultiplier> {
    let allowed = ctx.opponent.paint_allowed();
    if allowed <= WEAK_PAINT_COMPOSER || !ctx.player.is_big() {
        return None;
    }
    Some(multiplier(
        RuleId::PaintMismatch,
        StatFactors {
            points: Some(1.05),
            rebounds: Some(1.04),
            ..Default::default()
        },
        format!("opponent concedes {allowed:.1} paint points"),
    ))
}

fn dominant_lineup(ctx: &PlayerContext) -> Option<EnhancementMultiplier> {
    let starting = ctx.team.rotation()?.starting_lineup.as_ref()?;
    if starting.net_rating <= DOMINANT_NET_RATING || starting.minutes_together < DOMINANT_MINUTES {
        return None;
    }
    let member = if starting.players.is_empty() {
        ctx.rank_below(5)
    } else {
        starting.contains(&normalize_name(&ctx.player.name))
    };
    if !member {
        return None;
    }
    Some(multiplier(
        RuleId::DominantLineup,
        StatFactors {
            points: Some(1.03),
            assists: Some(1.02),
            rebounds: Some(1.02),
            ..Default::default()
        },
        format!(
            "starting unit +{:.1} net over {:.0} minutes",
            starting.net_rating, starting.minutes_together
        ),
    ))
}

fn stable_rotation(ctx: &PlayerContext) -> Option<EnhancementMultiplier> {
    let rotation = ctx.team.rotation()?;
    if rotation.confidence < STABLE_CONFIDENCE {
        return None;
    }
    let factor = if ctx.rank_below(5) {
        1.02
    } else if ctx.rank_below(8) {
        1.01
    } else {
        return None;
    };
    Some(multiplier(
        RuleId::StableRotation,
        StatFactors {
            points: Some(factor),
            ..Default::default()
        },
        format!("stable rotation role (rank {})", ctx.rotation_rank.unwrap_or(0) + 1),
    ))
}

fn game_script(ctx: &PlayerContext) -> Option<EnhancementMultiplier> {
    let mut factors = StatFactors::default();
    let mut labels = Vec::new();
    let bump = |slot: &mut Option<f64>, f: f64| *slot = Some(slot.unwrap_or(1.0) * f);

    for battle in ctx.battles.iter().filter(|b| b.favors(&ctx.team.name)) {
        let high = battle.confidence == BattleConfidence::High;
        match battle.kind {
            BattleKind::Interior if ctx.player.is_big() => {
                bump(&mut factors.points, if high { 1.06 } else { 1.04 });
                bump(&mut factors.rebounds, if high { 1.04 } else { 1.03 });
                labels.push("interior");
            }
            BattleKind::Perimeter if ctx.player.is_shooter() => {
                bump(&mut factors.three_pointers, if high { 1.08 } else { 1.05 });
                labels.push("perimeter");
            }
            BattleKind::Tempo if ctx.player.is_guard() => {
                bump(&mut factors.points, 1.02);
                bump(&mut factors.assists, 1.03);
                labels.push("tempo");
            }
            BattleKind::BallMovement if ctx.player.is_guard() => {
                bump(&mut factors.assists, 1.04);
                labels.push("ball movement");
            }
            _ => {}
        }
    }

    if labels.is_empty() {
        return None;
    }
    Some(multiplier(
        RuleId::GameScript,
        factors,
        format!("game script edge: {}", labels.join(", ")),
    ))
}

fn home_court(ctx: &PlayerContext) -> Option<EnhancementMultiplier> {
    if !ctx.is_home || ctx.rotation_rank.is_none_or(|r| r < 3) {
        return None;
    }
    Some(multiplier(
        RuleId::HomeCourt,
        StatFactors {
            points: Some(1.02),
            ..Default::default()
        },
        "home-court lift for supporting player".to_string(),
    ))
}

fn star_multiplier(ctx: &PlayerContext, acc: &Compound) -> Option<EnhancementMultiplier> {
    let k = match ctx.player.impact.tier {
        Tier::Superstar => 1.2,
        Tier::Star => 1.3,
        Tier::KeyRole | Tier::Bench => return None,
    };
    let amplify = |v: f64| (v > 1.0).then(|| (1.0 + (v - 1.0) * k) / v);
    let factors = StatFactors {
        points: amplify(acc.points),
        assists: amplify(acc.assists),
        rebounds: amplify(acc.rebounds),
        three_pointers: amplify(acc.three_pointers),
    };
    if factors == StatFactors::default() {
        return None;
    }
    Some(multiplier(
        RuleId::StarMultiplier,
        factors,
        format!("{} amplification x{k}", ctx.player.impact.tier.label()),
    ))
}

fn evaluate(rule: RuleId, ctx: &PlayerContext, acc: &Compound) -> Option<EnhancementMultiplier> {
    match rule {
        RuleId::PaceAdvantage => pace_advantage(ctx),
        RuleId::PerimeterVolume => perimeter_volume(ctx),
        RuleId::PaintMismatch => paint_mismatch(ctx),
        RuleId::DominantLineup => dominant_lineup(ctx),
        RuleId::StableRotation => stable_rotation(ctx),
        RuleId::GameScript => game_script(ctx),
        RuleId::HomeCourt => home_court(ctx),
        RuleId::StarMultiplier => star_multiplier(ctx, acc),
    }
}

/// Runs the composer rules and returns the emitted multipliers with the raw and capped compound.
pub fn compose(ctx: &PlayerContext) -> (Vec<EnhancementMultiplier>, Compound, Compound) {
    let mut acc = Compound::default();
    let mut emitted = Vec::new();
    for rule in RULE_ORDER {
        if let Some(m) = evaluate(rule, ctx, &acc) {
            acc.absorb(&m.factors);
            emitted.push(m);
        }
    }
    (emitted, acc, acc.capped())
}

pub fn defense_adjustments(ctx: &PlayerContext) -> Vec<DefenseAdjustment> {
    let Some(defense) = ctx.opponent.defensive_style() else {
        return Vec::new();
    };
    let player = ctx.player;
    let opp = &ctx.opponent.name;
    let mut out = Vec::new();

    for rule in DEFENSE_ORDER {
        let adj = match rule {
            DefenseRule::RimProtection
                if defense.points_in_paint_against < RIM_PROTECTION_BELOW
                    && !player.is_big()
                    && player.free_throw_attempts >= DRIVER_FTA =>
            {
                Some((0.96, 1.0, 0.92, 1.0, format!("{opp} rim protection limits drives")))
            }
            DefenseRule::ZoneDefense
                if defense.zone_frequency > ZONE_FREQUENCY_ABOVE && player.is_shooter() =>
            {
                Some((1.0, 1.06, 1.0, 1.08, format!("{opp} zone looks open up catch-and-shoot")))
            }
            DefenseRule::SwitchDefense
                if defense.switch_rate > SWITCH_RATE_ABOVE && player.usage_pct >= ISOLATION_USAGE =>
            {
                Some((0.97, 1.0, 1.0, 1.0, format!("{opp} switching stalls isolation")))
            }
            DefenseRule::WeakPaint
                if defense.points_in_paint_against > WEAK_PAINT_ABOVE && player.is_big() =>
            {
                Some((1.04, 1.0, 1.06, 1.0, format!("{opp} soft interior for post play")))
            }
            _ => None,
        };
        if let Some((points, threes, fta, tpa, reason)) = adj {
            out.push(DefenseAdjustment {
                rule,
                points,
                three_pointers: threes,
                free_throw_attempts: fta,
                three_point_attempts: tpa,
                reason,
            });
        }
    }
    out
}

pub fn enhance(ctx: &PlayerContext) -> EnhancedLine {
    let (multipliers, raw, capped) = compose(ctx);
    let mut reasons: Vec<String> = multipliers.iter().map(|m| m.reason.clone()).collect();
    for (label, before, after) in [
        ("points", raw.points, capped.points),
        ("assists", raw.assists, capped.assists),
        ("rebounds", raw.rebounds, capped.rebounds),
        ("threes", raw.three_pointers, capped.three_pointers),
    ] {
        if before > after {
            reasons.push(format!("{label} boost capped {before:.3} -> {after:.2}"));
        }
    }

    let mut line = ctx.player.scaled(
        capped.points,
        capped.rebounds,
        capped.assists,
        capped.three_pointers,
    );

    let defense = defense_adjustments(ctx);
    for adj in &defense {
        line.points *= adj.points;
        line.three_pointers_made *= adj.three_pointers;
        line.free_throw_attempts *= adj.free_throw_attempts;
        line.three_point_attempts *= adj.three_point_attempts;
        reasons.push(adj.reason.clone());
    }

    EnhancedLine {
        line,
        multipliers,
        raw,
        capped,
        defense,
        reasons,
    }
}
