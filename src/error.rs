//! Error kinds surfaced by the league core.

use thiserror::Error;

use crate::models::{MatchId, PlayerId};
use crate::storage::StorageError;

/// A malformed write request. Always reported back to the caller, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no rounds supplied")]
    NoRounds,

    #[error("round indexes must be integers")]
    NonIntegerRoundIndex,

    #[error("scores must be integers between 0 and {max}", max = u32::MAX)]
    InvalidScore,

    #[error("rounds must be numbered sequentially starting at 1")]
    NonSequentialRounds,

    #[error("the number of rounds does not match the supplied indexes")]
    RoundCountMismatch,

    #[error("played_at is not a valid date/time")]
    InvalidPlayedAt,

    #[error("location is required")]
    MissingLocation,

    #[error("every player slot must be filled")]
    MissingPlayer,

    #[error("a player cannot appear twice in the same match")]
    DuplicatePlayer,

    #[error("first name and last name are required")]
    MissingName,

    #[error("email address is not valid")]
    InvalidEmail,
}

/// Errors returned by [`crate::service::LeagueService`].
#[derive(Debug, Error)]
pub enum LeagueError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error(transparent)]
    Persistence(#[from] StorageError),
}

impl LeagueError {
    pub fn player_not_found(id: PlayerId) -> Self {
        LeagueError::NotFound {
            entity: "player",
            id,
        }
    }

    pub fn match_not_found(id: MatchId) -> Self {
        LeagueError::NotFound { entity: "match", id }
    }
}

pub type LeagueResult<T> = Result<T, LeagueError>;
