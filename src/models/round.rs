//! Round models: raw input, validated batch, persisted row.

use serde::{Deserialize, Serialize};

use super::{MatchId, RoundId};

/// A loosely typed numeric field from a client payload.
///
/// Form clients send numbers as JSON numbers or as strings; anything else
/// is kept so the validator can report it instead of the deserializer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Numeric {
    /// The value as an integer, if it denotes one exactly.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Numeric::Int(i) => Some(*i),
            Numeric::Float(f) => float_to_integer(*f),
            Numeric::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(float_to_integer))
            }
            Numeric::Other(_) => None,
        }
    }
}

fn float_to_integer(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl From<i64> for Numeric {
    fn from(v: i64) -> Self {
        Numeric::Int(v)
    }
}

/// One round as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoundInput {
    #[serde(default)]
    pub round_index: Option<Numeric>,
    #[serde(default)]
    pub team1_score: Option<Numeric>,
    #[serde(default)]
    pub team2_score: Option<Numeric>,
}

impl RoundInput {
    pub fn new(round_index: i64, team1_score: i64, team2_score: i64) -> Self {
        Self {
            round_index: Some(round_index.into()),
            team1_score: Some(team1_score.into()),
            team2_score: Some(team2_score.into()),
        }
    }
}

/// Scores of one round, already checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundScore {
    pub round_index: u32,
    pub team1_score: u32,
    pub team2_score: u32,
}

/// A non-empty batch of rounds indexed exactly `1..=N`, sorted by index.
///
/// Only [`crate::calculate::validate_rounds`] builds one, so a store never
/// receives a batch that skipped validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRounds(Vec<RoundScore>);

impl ValidatedRounds {
    pub(crate) fn from_sorted(rounds: Vec<RoundScore>) -> Self {
        Self(rounds)
    }

    pub fn as_slice(&self) -> &[RoundScore] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoundScore> {
        self.0.iter()
    }
}

/// A persisted round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub match_id: MatchId,
    pub round_index: u32,
    pub team1_score: u32,
    pub team2_score: u32,
}
