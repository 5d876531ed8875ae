//! # Scorer
//! Pure combination of keyword signals into one 0–10 potential score and a
//! recommendation tier. No I/O.
//!
//! Policy: volume dominates (45%), trend momentum is second (35%),
//! competition is a tiebreaker (20%). Difficulty is carried through to the
//! output record but has no weight of its own.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::round1;

pub const WEIGHT_VOLUME: f64 = 0.45;
pub const WEIGHT_TREND: f64 = 0.35;
pub const WEIGHT_COMPETITION: f64 = 0.20;

/// Scale applied to `log10(volume + 1)` before the cap at 10.
const VOLUME_LOG_SCALE: f64 = 3.3;

pub const HIGH_POTENTIAL_MIN: f64 = 8.5;
pub const TEST_MIN: f64 = 7.5;

/// Trend score used when the supplied one is not a number.
const NEUTRAL_TREND: f64 = 5.0;

/// Scorer inputs, clamped into their documented ranges on construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreInputs {
    pub volume: u64,
    /// 0..=100, pass-through only.
    pub difficulty: u8,
    /// 0..=10
    pub trend_score: f64,
    /// 0..=100
    pub competition: u8,
}

impl ScoreInputs {
    /// Safe constructor with clamping.
    pub fn new(volume: u64, difficulty: i64, trend_score: f64, competition: i64) -> Self {
        fn pct(x: i64) -> u8 {
            x.clamp(0, 100) as u8
        }
        let trend_score = if trend_score.is_finite() {
            trend_score.clamp(0.0, 10.0)
        } else {
            NEUTRAL_TREND
        };
        Self {
            volume,
            difficulty: pct(difficulty),
            trend_score,
            competition: pct(competition),
        }
    }
}

/// Logarithmic volume compression: meaningful between 10k and 100k, capped at 10.
pub fn volume_norm(volume: u64) -> f64 {
    let v = volume.max(1) as f64;
    ((v + 1.0).log10() * VOLUME_LOG_SCALE).min(10.0)
}

/// Inverted competition: lower competition contributes more.
pub fn competition_norm(competition: i64) -> f64 {
    (100 - competition.clamp(0, 100)) as f64 / 10.0
}

/// Weighted potential score in [0,10], rounded half-up to one decimal.
pub fn potential_score(inputs: &ScoreInputs) -> f64 {
    let raw = volume_norm(inputs.volume) * WEIGHT_VOLUME
        + inputs.trend_score * WEIGHT_TREND
        + competition_norm(inputs.competition as i64) * WEIGHT_COMPETITION;
    round1(raw.clamp(0.0, 10.0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    HighPotential,
    Test,
    Review,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::HighPotential => "high-potential",
            Recommendation::Test => "test",
            Recommendation::Review => "review",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier for an already rounded potential score.
pub fn recommend(potential: f64) -> Recommendation {
    if potential >= HIGH_POTENTIAL_MIN {
        Recommendation::HighPotential
    } else if potential >= TEST_MIN {
        Recommendation::Test
    } else {
        Recommendation::Review
    }
}
