//! Expected-value teammate projections when a key player's availability is uncertain.
//!
//! Only the single most impactful questionable/doubtful player on a team is
//! modeled as the scenario driver. When two stars are uncertain at once the
//! second one is ignored here, which understates the swing for their teammates.

use serde::Serialize;

use crate::impact::{Tier, normalize_name};
use crate::injury::InjuryStatus;
use crate::model::{InjuryRecord, PlayerStatLine};

const PLAYS_POINTS_BOOST: f64 = 1.03;
const PLAYS_ASSISTS_BOOST: f64 = 1.03;
const PLAYS_REBOUNDS_BOOST: f64 = 1.02;
const SITS_REBOUND_SHARE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioDriver {
    pub name: String,
    pub tier: Tier,
    pub impact_score: f64,
    pub status: InjuryStatus,
    pub play_probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScenarioKind {
    StarPlays,
    StarSits,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub probability: f64,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalProjection {
    pub driver: Option<String>,
    pub scenarios: Vec<Scenario>,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub uncertainty: f64,
}

/// Extra share of usage a teammate absorbs when a player of this tier sits.
pub fn sits_boost(tier: Tier) -> f64 {
    match tier {
        Tier::Superstar => 0.20,
        Tier::Star => 0.15,
        Tier::KeyRole => 0.08,
        Tier::Bench => 0.0,
    }
}

/// Picks the highest-impact uncertain player. `players` must already carry impact tags.
pub fn select_driver(
    players: &[PlayerStatLine],
    injuries: &[InjuryRecord],
) -> Option<ScenarioDriver> {
    let mut best: Option<ScenarioDriver> = None;
    for player in players {
        let key = normalize_name(&player.name);
        let Some(record) = injuries
            .iter()
            .find(|r| normalize_name(&r.player_name) == key)
        else {
            continue;
        };
        if !record.status.is_uncertain() {
            continue;
        }
        let replace = match &best {
            Some(current) => player.impact.score > current.impact_score,
            None => true,
        };
        if replace {
            best = Some(ScenarioDriver {
                name: player.name.clone(),
                tier: player.impact.tier,
                impact_score: player.impact.score,
                status: record.status,
                play_probability: record.status.availability().play_probability,
            });
        }
    }
    best
}

pub fn project_teammate(
    teammate: &PlayerStatLine,
    driver: Option<&ScenarioDriver>,
) -> ConditionalProjection {
    let no_op = ConditionalProjection {
        driver: None,
        scenarios: Vec::new(),
        points: teammate.points,
        rebounds: teammate.rebounds,
        assists: teammate.assists,
        uncertainty: 0.0,
    };
    let Some(driver) = driver else {
        return no_op;
    };
    if normalize_name(&driver.name) == normalize_name(&teammate.name) {
        return no_op;
    }

    let p = driver.play_probability.clamp(0.0, 1.0);
    let boost = sits_boost(driver.tier);
    let plays = Scenario {
        kind: ScenarioKind::StarPlays,
        probability: p,
        points: teammate.points * PLAYS_POINTS_BOOST,
        rebounds: teammate.rebounds * PLAYS_REBOUNDS_BOOST,
        assists: teammate.assists * PLAYS_ASSISTS_BOOST,
    };
    let sits = Scenario {
        kind: ScenarioKind::StarSits,
        probability: 1.0 - p,
        points: teammate.points * (1.0 + boost),
        rebounds: teammate.rebounds * (1.0 + boost * SITS_REBOUND_SHARE),
        assists: teammate.assists * (1.0 + boost),
    };

    let weighted =
        |f: fn(&Scenario) -> f64| plays.probability * f(&plays) + sits.probability * f(&sits);
    let uncertainty = if teammate.points > 0.0 {
        (sits.points - plays.points).abs() / teammate.points
    } else {
        0.0
    };

    ConditionalProjection {
        driver: Some(driver.name.clone()),
        points: weighted(|s| s.points),
        rebounds: weighted(|s| s.rebounds),
        assists: weighted(|s| s.assists),
        scenarios: vec![plays, sits],
        uncertainty,
    }
}

impl ConditionalProjection {
    pub fn is_active(&self) -> bool {
        self.driver.is_some()
    }

    /// The teammate line with the expected-value stats applied.
    pub fn apply_to(&self, line: &PlayerStatLine) -> PlayerStatLine {
        PlayerStatLine {
            points: self.points,
            rebounds: self.rebounds,
            assists: self.assists,
            ..line.clone()
        }
    }

    pub fn reason(&self) -> Option<String> {
        let driver = self.driver.as_ref()?;
        let sits = self
            .scenarios
            .iter()
            .find(|s| s.kind == ScenarioKind::StarSits)?;
        Some(format!(
            "conditional on {driver} ({:.0}% sits): {:.1} pts expected",
            sits.probability * 100.0,
            self.points
        ))
    }
}
