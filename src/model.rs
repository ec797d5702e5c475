use serde::{Deserialize, Serialize};

use crate::impact::Impact;
use crate::injury::InjuryStatus;

pub const LEAGUE_PACE: f64 = 100.0;
pub const LEAGUE_RATING: f64 = 110.0;
pub const LEAGUE_THREE_PCT: f64 = 0.36;
pub const LEAGUE_PAINT_POINTS: f64 = 48.0;

/// Per-game averages for one player. Every stage of the engine derives a new
/// line from the previous one, so the original input is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStatLine {
    pub name: String,
    pub team: String,
    pub position: String,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub three_pointers_made: f64,
    pub field_goal_pct: f64,
    pub minutes: f64,
    pub usage_pct: f64,
    pub free_throw_attempts: f64,
    pub three_point_attempts: f64,
    pub recent_points: Vec<f64>,
    pub recent_minutes: Vec<f64>,
    pub impact: Impact,
}

impl Default for PlayerStatLine {
    fn default() -> Self {
        Self {
            name: String::new(),
            team: String::new(),
            position: String::new(),
            points: 0.0,
            rebounds: 0.0,
            assists: 0.0,
            steals: 0.0,
            blocks: 0.0,
            three_pointers_made: 0.0,
            field_goal_pct: 0.0,
            minutes: 0.0,
            usage_pct: 0.0,
            free_throw_attempts: 0.0,
            three_point_attempts: 0.0,
            recent_points: Vec::new(),
            recent_minutes: Vec::new(),
            impact: Impact::default(),
        }
    }
}

impl PlayerStatLine {
    /// Centers and power forwards.
    pub fn is_big(&self) -> bool {
        let pos = self.position.to_ascii_uppercase();
        pos.contains('C') || pos.contains("PF")
    }

    pub fn is_guard(&self) -> bool {
        self.position.to_ascii_uppercase().contains('G')
    }

    pub fn is_shooter(&self) -> bool {
        self.three_pointers_made >= 2.0
    }

    /// Scales the counting stats a projection carries.
    pub fn scaled(&self, points: f64, rebounds: f64, assists: f64, threes: f64) -> Self {
        Self {
            points: self.points * points,
            rebounds: self.rebounds * rebounds,
            assists: self.assists * assists,
            three_pointers_made: self.three_pointers_made * threes,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralStats {
    pub wins: u32,
    pub losses: u32,
    pub points: f64,
    pub paint_pts: f64,
    pub opp_paint_pts: f64,
    pub three_pointers_made: f64,
    pub three_point_pct: f64,
    pub field_goals_attempted: f64,
    pub opp_three_point_pct: f64,
    pub assists: f64,
    pub field_goals_made: f64,
    pub opponent_turnovers: f64,
    pub turnovers: f64,
    pub offensive_rebounds: f64,
    pub defensive_rebounds: f64,
    pub games_played: u32,
}

impl Default for GeneralStats {
    fn default() -> Self {
        Self {
            wins: 0,
            losses: 0,
            points: 112.0,
            paint_pts: LEAGUE_PAINT_POINTS,
            opp_paint_pts: LEAGUE_PAINT_POINTS,
            three_pointers_made: 12.5,
            three_point_pct: LEAGUE_THREE_PCT,
            field_goals_attempted: 88.0,
            opp_three_point_pct: LEAGUE_THREE_PCT,
            assists: 25.0,
            field_goals_made: 41.0,
            opponent_turnovers: 14.0,
            turnovers: 14.0,
            offensive_rebounds: 10.5,
            defensive_rebounds: 33.0,
            games_played: 0,
        }
    }
}

impl GeneralStats {
    /// Share of field-goal attempts taken from three, with attempts recovered from makes
    /// and accuracy. `None` when the shooting splits are missing.
    pub fn three_point_rate(&self) -> Option<f64> {
        if self.field_goals_attempted <= 0.0 || self.three_point_pct <= 0.0 {
            return None;
        }
        Some(self.three_pointers_made / self.three_point_pct / self.field_goals_attempted)
    }

    /// Win percentage, 0.5 when no games have been recorded.
    pub fn win_pct(&self) -> f64 {
        let games = self.wins + self.losses;
        if games == 0 {
            return 0.5;
        }
        self.wins as f64 / games as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedStats {
    pub offensive_rating: f64,
    pub defensive_rating: f64,
    pub pace: Option<f64>,
}

impl Default for AdvancedStats {
    fn default() -> Self {
        Self {
            offensive_rating: LEAGUE_RATING,
            defensive_rating: LEAGUE_RATING,
            pace: None,
        }
    }
}

impl AdvancedStats {
    pub fn pace_or_league(&self) -> f64 {
        self.pace.unwrap_or(LEAGUE_PACE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShotSelection {
    pub three_point_rate: f64,
    pub paint_touches: f64,
}

impl Default for ShotSelection {
    fn default() -> Self {
        Self {
            three_point_rate: 0.39,
            paint_touches: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BallMovement {
    pub assist_rate: f64,
}

impl Default for BallMovement {
    fn default() -> Self {
        Self { assist_rate: 0.60 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OffensiveStyle {
    pub pace: Option<f64>,
    pub shot_selection: ShotSelection,
    pub ball_movement: BallMovement,
    pub transition_frequency: f64,
}

impl Default for OffensiveStyle {
    fn default() -> Self {
        Self {
            pace: None,
            shot_selection: ShotSelection::default(),
            ball_movement: BallMovement::default(),
            transition_frequency: 0.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefensiveStyle {
    pub opponent_three_point_pct: f64,
    pub points_in_paint_against: f64,
    pub transition_defense: f64,
    pub zone_frequency: f64,
    pub switch_rate: f64,
}

impl Default for DefensiveStyle {
    fn default() -> Self {
        Self {
            opponent_three_point_pct: LEAGUE_THREE_PCT,
            points_in_paint_against: LEAGUE_PAINT_POINTS,
            transition_defense: 1.0,
            zone_frequency: 0.0,
            switch_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleProfile {
    pub offensive_style: OffensiveStyle,
    pub defensive_style: DefensiveStyle,
}

/// A five-man unit from the rotation feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineupUnit {
    pub players: Vec<String>,
    pub minutes_together: f64,
    pub net_rating: f64,
    pub pace: Option<f64>,
}

impl LineupUnit {
    pub fn contains(&self, player_norm: &str) -> bool {
        self.players
            .iter()
            .any(|p| crate::impact::normalize_name(p) == player_norm)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RotationIntelligence {
    pub starting_lineup: Option<LineupUnit>,
    pub bench_units: Vec<LineupUnit>,
    pub closing_lineup: Option<LineupUnit>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineupProfile {
    pub rotation_intelligence: RotationIntelligence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamStatProfile {
    pub name: String,
    pub general: GeneralStats,
    pub advanced: AdvancedStats,
    pub style: Option<StyleProfile>,
    pub lineups: Option<LineupProfile>,
}

impl TeamStatProfile {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn offensive_style(&self) -> Option<&OffensiveStyle> {
        self.style.as_ref().map(|s| &s.offensive_style)
    }

    pub fn defensive_style(&self) -> Option<&DefensiveStyle> {
        self.style.as_ref().map(|s| &s.defensive_style)
    }

    pub fn rotation(&self) -> Option<&RotationIntelligence> {
        self.lineups.as_ref().map(|l| &l.rotation_intelligence)
    }

    /// Paint points conceded, preferring the style feed when present.
    pub fn paint_allowed(&self) -> f64 {
        self.defensive_style()
            .map(|d| d.points_in_paint_against)
            .unwrap_or(self.general.opp_paint_pts)
    }

    /// Opponent three-point percentage allowed, preferring the style feed.
    pub fn three_pct_allowed(&self) -> f64 {
        self.defensive_style()
            .map(|d| d.opponent_three_point_pct)
            .unwrap_or(self.general.opp_three_point_pct)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjuryRecord {
    pub team: String,
    pub player_name: String,
    pub status: InjuryStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
}

/// Rest and back-to-back context for one side of a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamSchedule {
    pub back_to_back: bool,
    pub rest_days: u32,
}

/// Per-stat multiplicative factors. `None` means the stat is untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatFactors {
    pub points: Option<f64>,
    pub assists: Option<f64>,
    pub rebounds: Option<f64>,
    pub three_pointers: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancementMultiplier {
    pub rule: String,
    pub factors: StatFactors,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleKind {
    Interior,
    Tempo,
    Perimeter,
    BallMovement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BattleConfidence {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameScriptBattle {
    pub kind: BattleKind,
    pub advantage_team: String,
    pub differential: f64,
    pub confidence: BattleConfidence,
}

impl GameScriptBattle {
    pub fn favors(&self, team: &str) -> bool {
        crate::impact::normalize_name(&self.advantage_team) == crate::impact::normalize_name(team)
    }
}

/// A point estimate with its spread and the ordered layers that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub mean: f64,
    pub std_dev: f64,
    pub ci68: (f64, f64),
    pub ci95: (f64, f64),
    pub reasons: Vec<String>,
}
