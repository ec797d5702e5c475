use serde::Serialize;

use crate::impact::Tier;
use crate::model::Projection;

const MIN_RECENT_GAMES: usize = 3;
const STAR_SPREAD: f64 = 0.25;
const ROLE_SPREAD: f64 = 0.35;

const INJURY_UNCERTAINTY_ABOVE: f64 = 0.3;
const PACE_VOLATILITY_ABOVE: f64 = 5.0;
const MINUTES_VOLATILITY_ABOVE: f64 = 5.0;
const MATCHUP_UNCERTAINTY_ABOVE: f64 = 0.25;

const INJURY_MULT: f64 = 1.5;
const PACE_MULT: f64 = 1.2;
const MINUTES_MULT: f64 = 1.3;
const MATCHUP_MULT: f64 = 1.15;

const TEAM_SPREAD: f64 = 0.08;
const TEAM_PACE_MULT: f64 = 1.3;
const TEAM_INJURY_MULT: f64 = 1.4;
const TEAM_B2B_MULT: f64 = 1.2;
const MAJOR_INJURIES: usize = 2;

/// Context signals that widen a player's range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VolatilityFlags {
    /// 1 - play probability of the player's own status.
    pub injury_uncertainty: f64,
    /// Absolute pace gap between the two teams.
    pub pace_volatility: f64,
    /// Standard deviation of recent minutes.
    pub minutes_volatility: f64,
    /// Scenario spread from the conditional teammate model.
    pub matchup_uncertainty: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamVolatility {
    pub pace_volatility: f64,
    pub major_injuries: usize,
    pub back_to_back: bool,
}

/// Sample standard deviation (n - 1). `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

pub fn base_std_dev(mean: f64, tier: Tier, recent: &[f64]) -> f64 {
    if recent.len() >= MIN_RECENT_GAMES
        && let Some(sd) = sample_std_dev(recent)
    {
        return sd;
    }
    let spread = if tier.is_star() {
        STAR_SPREAD
    } else {
        ROLE_SPREAD
    };
    mean.max(0.0) * spread
}

pub fn player_std_dev(base: f64, flags: &VolatilityFlags, reasons: &mut Vec<String>) -> f64 {
    let mut sd = base;
    if flags.injury_uncertainty > INJURY_UNCERTAINTY_ABOVE {
        sd *= INJURY_MULT;
        reasons.push("variance: injury uncertainty x1.5".to_string());
    }
    if flags.pace_volatility > PACE_VOLATILITY_ABOVE {
        sd *= PACE_MULT;
        reasons.push("variance: pace volatility x1.2".to_string());
    }
    if flags.minutes_volatility > MINUTES_VOLATILITY_ABOVE {
        sd *= MINUTES_MULT;
        reasons.push("variance: minutes volatility x1.3".to_string());
    }
    if flags.matchup_uncertainty > MATCHUP_UNCERTAINTY_ABOVE {
        sd *= MATCHUP_MULT;
        reasons.push("variance: matchup uncertainty x1.15".to_string());
    }
    sd
}

pub fn intervals(mean: f64, std_dev: f64) -> ((f64, f64), (f64, f64)) {
    (
        ((mean - std_dev).max(0.0), mean + std_dev),
        ((mean - 2.0 * std_dev).max(0.0), mean + 2.0 * std_dev),
    )
}

pub fn projection(mean: f64, std_dev: f64, reasons: Vec<String>) -> Projection {
    let (ci68, ci95) = intervals(mean, std_dev);
    Projection {
        mean,
        std_dev,
        ci68,
        ci95,
        reasons,
    }
}

/// Player points projection. `recent` is the player's recent-game sample for the stat.
pub fn player_projection(
    mean: f64,
    tier: Tier,
    recent: &[f64],
    flags: &VolatilityFlags,
    mut reasons: Vec<String>,
) -> Projection {
    let base = base_std_dev(mean, tier, recent);
    let sd = player_std_dev(base, flags, &mut reasons);
    projection(mean, sd, reasons)
}

pub fn team_projection(score: f64, vol: &TeamVolatility, mut reasons: Vec<String>) -> Projection {
    let mut sd = score.max(0.0) * TEAM_SPREAD;
    if vol.pace_volatility > PACE_VOLATILITY_ABOVE {
        sd *= TEAM_PACE_MULT;
        reasons.push("variance: pace volatility x1.3".to_string());
    }
    if vol.major_injuries >= MAJOR_INJURIES {
        sd *= TEAM_INJURY_MULT;
        reasons.push(format!(
            "variance: {} major injuries x1.4",
            vol.major_injuries
        ));
    }
    if vol.back_to_back {
        sd *= TEAM_B2B_MULT;
        reasons.push("variance: back-to-back x1.2".to_string());
    }
    projection(score, sd, reasons)
}
