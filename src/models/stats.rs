//! Derived statistics models. None of these are persisted.

use serde::{Deserialize, Serialize};

use super::{Player, PlayerId, TeamSide};

/// Match winner by rounds won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
    #[default]
    #[serde(rename = "TIE")]
    Tie,
}

impl Winner {
    /// Win/loss for the given side, `None` for a tie.
    pub fn result_for(&self, side: TeamSide) -> Option<FormResult> {
        match (self, side) {
            (Winner::Tie, _) => None,
            (Winner::A, TeamSide::A) | (Winner::B, TeamSide::B) => Some(FormResult::W),
            _ => Some(FormResult::L),
        }
    }

    pub fn side(&self) -> Option<TeamSide> {
        match self {
            Winner::A => Some(TeamSide::A),
            Winner::B => Some(TeamSide::B),
            Winner::Tie => None,
        }
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Winner::A => write!(f, "A"),
            Winner::B => write!(f, "B"),
            Winner::Tie => write!(f, "TIE"),
        }
    }
}

/// One entry of a recent-form sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormResult {
    W,
    L,
}

/// Round tallies and points of one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub rounds_played: u32,
    pub rounds_won_a: u32,
    pub rounds_won_b: u32,
    pub rounds_tied: u32,
    pub total_score_a: u64,
    pub total_score_b: u64,
    pub winner: Winner,
}

impl MatchOutcome {
    /// Points scored by one side.
    pub fn score_for(&self, side: TeamSide) -> u64 {
        match side {
            TeamSide::A => self.total_score_a,
            TeamSide::B => self.total_score_b,
        }
    }
}

/// Per-player aggregate over their played matches.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsSnapshot {
    pub played_matches: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,

    /// Integer percentage
    pub win_rate: u32,

    pub total_points: u64,
    pub total_rounds: u32,

    /// One decimal; `None` when the player has no rounds at all
    pub avg_round_points: Option<f64>,

    /// Most recent first, ties skipped, at most five
    pub recent_form: Vec<FormResult>,
}

/// A player paired with their statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatsEntry {
    pub player: Player,
    pub stats: PlayerStatsSnapshot,
}

/// Short player reference used in leaderboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Player> for PlayerRef {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerEntry {
    pub player: PlayerRef,
    pub wins: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorerEntry {
    pub player: PlayerRef,
    pub points: u64,
}

/// Played matches in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// Sortable `YYYY-MM`
    pub key: String,
    /// Display `MM/YYYY`
    pub month: String,
    pub total_matches: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeagueTotals {
    pub players: u32,
    pub matches: u32,
    pub rounds: u32,
    pub points: u64,
}

/// League-wide KPIs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub totals: LeagueTotals,
    pub matches_by_month: Vec<MonthBucket>,
    pub top_winners: Vec<WinnerEntry>,
    pub top_scorer: Option<ScorerEntry>,
}
