//! Match model: two fixed teams of two players.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, Numeric, PlayerId};
use crate::error::ValidationError;

/// Which team of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    A,
    B,
}

/// A pair of distinct players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub p1: PlayerId,
    pub p2: PlayerId,
}

impl Team {
    pub fn new(p1: PlayerId, p2: PlayerId) -> Self {
        Self { p1, p2 }
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.p1 == player || self.p2 == player
    }

    pub fn members(&self) -> [PlayerId; 2] {
        [self.p1, self.p2]
    }
}

/// Cached play status. "played" iff at least one round is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Played,
}

impl MatchStatus {
    pub fn from_round_count(count: usize) -> Self {
        if count > 0 {
            MatchStatus::Played
        } else {
            MatchStatus::Scheduled
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::Played => write!(f, "played"),
        }
    }
}

/// A persisted match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,

    /// When the match took place (UTC)
    pub played_at: NaiveDateTime,

    pub location: String,

    pub team1: Team,

    pub team2: Team,

    /// Mirrors the number of stored rounds
    pub rounds_played: u32,

    pub status: MatchStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// Whether the match counts as played.
    ///
    /// The status is a cache of round existence and can lag behind the round
    /// data, so either signal is enough.
    pub fn is_played(&self) -> bool {
        self.status == MatchStatus::Played || self.rounds_played > 0
    }

    pub fn player_ids(&self) -> [PlayerId; 4] {
        [self.team1.p1, self.team1.p2, self.team2.p1, self.team2.p2]
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.side_of(player).is_some()
    }

    /// The side the player is on, if they took part.
    pub fn side_of(&self, player: PlayerId) -> Option<TeamSide> {
        if self.team1.contains(player) {
            Some(TeamSide::A)
        } else if self.team2.contains(player) {
            Some(TeamSide::B)
        } else {
            None
        }
    }
}

/// Player slots of one team as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamInput {
    #[serde(default)]
    pub p1: Option<Numeric>,
    #[serde(default)]
    pub p2: Option<Numeric>,
}

/// Match payload as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchInput {
    #[serde(default)]
    pub played_at: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub team1: Option<TeamInput>,
    #[serde(default)]
    pub team2: Option<TeamInput>,
}

/// A validated match ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDraft {
    pub played_at: NaiveDateTime,
    pub location: String,
    pub team1: Team,
    pub team2: Team,
}

impl MatchDraft {
    pub fn player_ids(&self) -> [PlayerId; 4] {
        [self.team1.p1, self.team1.p2, self.team2.p1, self.team2.p2]
    }
}

/// Parse a client timestamp into a UTC naive date/time.
///
/// Accepts RFC 3339 (offsets are converted to UTC), `YYYY-MM-DDTHH:MM[:SS]`,
/// the same with a space separator, and a bare `YYYY-MM-DD`.
pub fn parse_played_at(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }

    const FORMATS: [&str; 6] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn slot(team: Option<&TeamInput>, first: bool) -> Option<PlayerId> {
    let team = team?;
    let value = if first { &team.p1 } else { &team.p2 };
    value.as_ref()?.as_integer()
}

impl MatchInput {
    pub fn validate(&self) -> Result<MatchDraft, ValidationError> {
        let played_at = self
            .played_at
            .as_deref()
            .and_then(parse_played_at)
            .ok_or(ValidationError::InvalidPlayedAt)?;

        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingLocation)?
            .to_string();

        let slots = [
            slot(self.team1.as_ref(), true),
            slot(self.team1.as_ref(), false),
            slot(self.team2.as_ref(), true),
            slot(self.team2.as_ref(), false),
        ];
        let [Some(a1), Some(a2), Some(b1), Some(b2)] = slots else {
            return Err(ValidationError::MissingPlayer);
        };

        let unique: HashSet<PlayerId> = [a1, a2, b1, b2].into_iter().collect();
        if unique.len() != 4 {
            return Err(ValidationError::DuplicatePlayer);
        }

        Ok(MatchDraft {
            played_at,
            location,
            team1: Team::new(a1, a2),
            team2: Team::new(b1, b2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(p1: i64, p2: i64) -> Option<TeamInput> {
        Some(TeamInput {
            p1: Some(p1.into()),
            p2: Some(p2.into()),
        })
    }

    fn input(played_at: &str, location: &str) -> MatchInput {
        MatchInput {
            played_at: Some(played_at.to_string()),
            location: Some(location.to_string()),
            team1: team(1, 2),
            team2: team(3, 4),
        }
    }

    fn sample_match(status: MatchStatus, rounds_played: u32) -> Match {
        let now = Utc::now();
        Match {
            id: 1,
            played_at: parse_played_at("2024-05-01T20:00").unwrap(),
            location: "Club".to_string(),
            team1: Team::new(1, 2),
            team2: Team::new(3, 4),
            rounds_played,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_parse_played_at_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(20, 30, 0)
            .unwrap();

        assert_eq!(parse_played_at("2024-03-09T20:30"), Some(expected));
        assert_eq!(parse_played_at("2024-03-09T20:30:00"), Some(expected));
        assert_eq!(parse_played_at("2024-03-09 20:30:00"), Some(expected));
        assert_eq!(parse_played_at("2024-03-09T21:30:00+01:00"), Some(expected));
        assert_eq!(parse_played_at("2024-03-09T20:30:00Z"), Some(expected));
        assert_eq!(
            parse_played_at("2024-03-09"),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn test_parse_played_at_rejects_garbage() {
        assert_eq!(parse_played_at(""), None);
        assert_eq!(parse_played_at("yesterday"), None);
        assert_eq!(parse_played_at("2024-13-01"), None);
        assert_eq!(parse_played_at("2024-02-30T10:00"), None);
    }

    #[test]
    fn test_validate_ok() {
        let draft = input("2024-03-09T20:30", "  Café du Port ").validate().unwrap();
        assert_eq!(draft.location, "Café du Port");
        assert_eq!(draft.team1, Team::new(1, 2));
        assert_eq!(draft.team2, Team::new(3, 4));
        assert_eq!(draft.player_ids(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_validate_order_of_checks() {
        let mut raw = input("nope", "");
        assert_eq!(raw.validate(), Err(ValidationError::InvalidPlayedAt));

        raw.played_at = Some("2024-03-09".to_string());
        assert_eq!(raw.validate(), Err(ValidationError::MissingLocation));

        raw.location = Some("Club".to_string());
        raw.team2 = None;
        assert_eq!(raw.validate(), Err(ValidationError::MissingPlayer));
    }

    #[test]
    fn test_validate_rejects_duplicates_across_teams() {
        let mut raw = input("2024-03-09", "Club");
        raw.team2 = team(2, 4);
        assert_eq!(raw.validate(), Err(ValidationError::DuplicatePlayer));

        raw.team2 = team(3, 3);
        assert_eq!(raw.validate(), Err(ValidationError::DuplicatePlayer));
    }

    #[test]
    fn test_validate_accepts_string_ids() {
        let raw: MatchInput = serde_json::from_str(
            r#"{"played_at": "2024-03-09T20:30", "location": "Club",
                "team1": {"p1": "1", "p2": "2"}, "team2": {"p1": 3, "p2": 4}}"#,
        )
        .unwrap();
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_is_played_or_condition() {
        assert!(!sample_match(MatchStatus::Scheduled, 0).is_played());
        assert!(sample_match(MatchStatus::Played, 0).is_played());
        assert!(sample_match(MatchStatus::Scheduled, 2).is_played());
    }

    #[test]
    fn test_side_of() {
        let m = sample_match(MatchStatus::Played, 1);
        assert_eq!(m.side_of(2), Some(TeamSide::A));
        assert_eq!(m.side_of(3), Some(TeamSide::B));
        assert_eq!(m.side_of(9), None);
        assert!(m.involves(4));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&MatchStatus::Played).unwrap(),
            "\"played\""
        );
        assert_eq!(MatchStatus::from_round_count(0), MatchStatus::Scheduled);
        assert_eq!(MatchStatus::from_round_count(3), MatchStatus::Played);
    }
}
