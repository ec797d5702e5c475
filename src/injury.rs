use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::model::{InjuryRecord, PlayerStatLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InjuryStatus {
    Out,
    Doubtful,
    Questionable,
    Probable,
    Available,
    /// Any status string outside the table. Treated as fully available.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown injury status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for InjuryStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "out" => Ok(InjuryStatus::Out),
            "doubtful" => Ok(InjuryStatus::Doubtful),
            "questionable" | "gtd" | "game-time decision" => Ok(InjuryStatus::Questionable),
            "probable" => Ok(InjuryStatus::Probable),
            "available" | "active" => Ok(InjuryStatus::Available),
            _ => Err(UnknownStatus(raw.to_string())),
        }
    }
}

impl From<String> for InjuryStatus {
    fn from(raw: String) -> Self {
        match raw.parse() {
            Ok(status) => status,
            Err(err) => {
                warn!(%err, "falling back to full availability");
                InjuryStatus::Unrecognized
            }
        }
    }
}

impl From<InjuryStatus> for String {
    fn from(status: InjuryStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for InjuryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl InjuryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InjuryStatus::Out => "out",
            InjuryStatus::Doubtful => "doubtful",
            InjuryStatus::Questionable => "questionable",
            InjuryStatus::Probable => "probable",
            InjuryStatus::Available => "available",
            InjuryStatus::Unrecognized => "unrecognized",
        }
    }

    pub fn availability(self) -> Availability {
        let (play_probability, effectiveness) = match self {
            InjuryStatus::Out => (0.0, 0.0),
            InjuryStatus::Doubtful => (0.20, 0.60),
            InjuryStatus::Questionable => (0.65, 0.75),
            InjuryStatus::Probable => (0.90, 0.95),
            InjuryStatus::Available | InjuryStatus::Unrecognized => (1.0, 1.0),
        };
        Availability {
            play_probability,
            effectiveness,
        }
    }

    /// Questionable and doubtful players drive the teammate scenario model.
    pub fn is_uncertain(self) -> bool {
        matches!(self, InjuryStatus::Questionable | InjuryStatus::Doubtful)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Availability {
    pub play_probability: f64,
    pub effectiveness: f64,
}

impl Availability {
    pub fn factor(self) -> f64 {
        self.play_probability * self.effectiveness
    }

    pub fn uncertainty(self) -> f64 {
        1.0 - self.play_probability
    }
}

/// Availability for a raw status string; unknown strings resolve to full availability.
pub fn availability_for(raw_status: &str) -> Availability {
    InjuryStatus::from(raw_status.to_string()).availability()
}

pub fn expected_stat(base: f64, status: InjuryStatus) -> f64 {
    base * status.availability().factor()
}

#[derive(Debug, Clone, PartialEq)]
pub struct InjuryAdjusted {
    pub line: PlayerStatLine,
    pub status: InjuryStatus,
    pub availability: Availability,
    pub uncertainty: f64,
    pub note: String,
}

/// Probability-weighted line for a player carrying an injury designation.
pub fn apply_injury(line: &PlayerStatLine, record: &InjuryRecord) -> InjuryAdjusted {
    let availability = record.status.availability();
    let f = availability.factor();
    let adjusted = PlayerStatLine {
        points: line.points * f,
        rebounds: line.rebounds * f,
        assists: line.assists * f,
        steals: line.steals * f,
        blocks: line.blocks * f,
        three_pointers_made: line.three_pointers_made * f,
        minutes: line.minutes * f,
        free_throw_attempts: line.free_throw_attempts * f,
        three_point_attempts: line.three_point_attempts * f,
        ..line.clone()
    };
    let note = if record.description.trim().is_empty() {
        format!(
            "{} ({:.0}% to play, {:.0}% effective)",
            record.status,
            availability.play_probability * 100.0,
            availability.effectiveness * 100.0
        )
    } else {
        format!(
            "{} - {} ({:.0}% to play, {:.0}% effective)",
            record.status,
            record.description.trim(),
            availability.play_probability * 100.0,
            availability.effectiveness * 100.0
        )
    };
    InjuryAdjusted {
        line: adjusted,
        status: record.status,
        availability,
        uncertainty: availability.uncertainty(),
        note,
    }
}
