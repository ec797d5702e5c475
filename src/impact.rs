use serde::{Deserialize, Serialize};

use crate::model::PlayerStatLine;

const W_POINTS: f64 = 1.0;
const W_ASSISTS: f64 = 1.5;
const W_REBOUNDS: f64 = 1.2;
const W_STEALS: f64 = 2.0;
const W_BLOCKS: f64 = 2.0;

const SUPERSTAR_ABOVE: f64 = 40.0;
const STAR_ABOVE: f64 = 25.0;
const KEY_ROLE_ABOVE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Bench,
    #[serde(rename = "Key Role")]
    KeyRole,
    Star,
    Superstar,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Superstar => "Superstar",
            Tier::Star => "Star",
            Tier::KeyRole => "Key Role",
            Tier::Bench => "Bench",
        }
    }

    pub fn is_star(self) -> bool {
        matches!(self, Tier::Superstar | Tier::Star)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub score: f64,
    pub tier: Tier,
}

impl Default for Impact {
    fn default() -> Self {
        Self {
            score: 0.0,
            tier: Tier::Bench,
        }
    }
}

pub fn impact_score(line: &PlayerStatLine) -> f64 {
    line.points * W_POINTS
        + line.assists * W_ASSISTS
        + line.rebounds * W_REBOUNDS
        + line.steals * W_STEALS
        + line.blocks * W_BLOCKS
}

pub fn tier_for_score(score: f64) -> Tier {
    if score > SUPERSTAR_ABOVE {
        Tier::Superstar
    } else if score > STAR_ABOVE {
        Tier::Star
    } else if score > KEY_ROLE_ABOVE {
        Tier::KeyRole
    } else {
        Tier::Bench
    }
}

pub fn assess(line: &PlayerStatLine) -> Impact {
    let score = impact_score(line);
    Impact {
        score,
        tier: tier_for_score(score),
    }
}

/// Returns a copy of the line tagged with its impact score and tier.
pub fn classify(line: &PlayerStatLine) -> PlayerStatLine {
    PlayerStatLine {
        impact: assess(line),
        ..line.clone()
    }
}

/// Lower-case key with runs of punctuation/whitespace collapsed to `_`.
pub fn normalize_name(input: &str) -> String {
    let lower = input.trim().to_ascii_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut prev_us = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_us = false;
        } else if ch == '.' || ch == '\'' {
            // "P.J." and "D'Angelo" should match their dotless spellings.
            continue;
        } else if !prev_us && !out.is_empty() {
            out.push('_');
            prev_us = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Compact key that ignores whitespace entirely; used against collapsed report text.
pub fn compact_key(input: &str) -> String {
    normalize_name(input).replace('_', "")
}
