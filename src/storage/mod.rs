//! Persistence for players, matches and rounds.
//!
//! - `LeagueStore`: the read/write contract the service layer depends on
//! - `tables`: in-memory table engine with copy-on-write transactions
//! - `memory`: volatile adapter (tests, demos)
//! - `jsonl`: JSON Lines files under the data directory

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    Match, MatchDraft, MatchId, NewPlayer, Player, PlayerId, Round, ValidatedRounds,
};

mod jsonl;
mod memory;
mod tables;

pub use jsonl::*;
pub use memory::*;
pub use tables::*;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Corrupt record in {path:?} at line {line}: {message}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Which adapter backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Jsonl,
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Directory holding the league tables.
    pub fn league_dir(&self) -> PathBuf {
        self.data_dir.join("league")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Match listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchFilter {
    /// Only matches with `status = played OR rounds_played > 0`, or with
    /// stored rounds
    pub played_only: bool,
    /// Only matches this player took part in
    pub player: Option<PlayerId>,
}

impl MatchFilter {
    pub fn played() -> Self {
        Self {
            played_only: true,
            player: None,
        }
    }

    pub fn with_player(mut self, player: Option<PlayerId>) -> Self {
        self.player = player;
        self
    }

    /// `has_rounds` tells whether any round is stored for `m`.
    pub fn accepts(&self, m: &Match, has_rounds: bool) -> bool {
        (!self.played_only || m.is_played() || has_rounds)
            && self.player.map_or(true, |p| m.involves(p))
    }
}

/// Full dump of the league tables, used for export/import between stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub players: Vec<Player>,
    pub matches: Vec<Match>,
    pub rounds: Vec<Round>,
}

/// Read/write contract of the persistence collaborator.
///
/// Matches are listed by `played_at` desc then `created_at` desc; rounds by
/// `round_index` asc. Every write is all-or-nothing.
#[async_trait]
pub trait LeagueStore: Send + Sync {
    async fn list_players(&self) -> Result<Vec<Player>, StorageError>;

    async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, StorageError>;

    async fn create_player(&self, player: NewPlayer) -> Result<Player, StorageError>;

    /// `None` when the player does not exist.
    async fn update_player(
        &self,
        id: PlayerId,
        player: NewPlayer,
    ) -> Result<Option<Player>, StorageError>;

    /// `false` when the player does not exist. Fails with
    /// [`StorageError::Constraint`] while a match references the player.
    async fn delete_player(&self, id: PlayerId) -> Result<bool, StorageError>;

    async fn list_matches(&self, filter: MatchFilter) -> Result<Vec<Match>, StorageError>;

    async fn get_match(&self, id: MatchId) -> Result<Option<Match>, StorageError>;

    async fn create_match(&self, draft: MatchDraft) -> Result<Match, StorageError>;

    /// Updates date, location and teams; rounds and status are untouched.
    async fn update_match(
        &self,
        id: MatchId,
        draft: MatchDraft,
    ) -> Result<Option<Match>, StorageError>;

    /// Deletes the match and its rounds.
    async fn delete_match(&self, id: MatchId) -> Result<bool, StorageError>;

    /// The match and its rounds, read together.
    async fn get_match_with_rounds(
        &self,
        id: MatchId,
    ) -> Result<Option<(Match, Vec<Round>)>, StorageError>;

    /// Matches accepted by `filter` and their rounds, read together.
    async fn list_matches_with_rounds(
        &self,
        filter: MatchFilter,
    ) -> Result<(Vec<Match>, Vec<Round>), StorageError>;

    async fn list_rounds(&self, match_id: MatchId) -> Result<Vec<Round>, StorageError>;

    async fn list_all_rounds(&self) -> Result<Vec<Round>, StorageError>;

    /// Clear the match's rounds, insert `rounds`, refresh `rounds_played` and
    /// status, as one unit. `None` when the match does not exist.
    async fn replace_rounds(
        &self,
        match_id: MatchId,
        rounds: &ValidatedRounds,
    ) -> Result<Option<Vec<Round>>, StorageError>;

    /// Remove every round and reset the match to scheduled, as one unit.
    async fn clear_rounds(&self, match_id: MatchId) -> Result<bool, StorageError>;

    async fn export(&self) -> Result<Snapshot, StorageError>;

    /// Upsert every record, keeping ids, as one unit. The snapshot's rounds
    /// replace those of each imported match. Fails with
    /// [`StorageError::Constraint`] and changes nothing when the result would
    /// hold a dangling reference, a match with a repeated player, or a round
    /// set not numbered `1..=N`.
    async fn import(&self, snapshot: Snapshot) -> Result<(), StorageError>;
}

/// Open the store selected by `backend`.
pub fn open_store(
    backend: StorageBackend,
    config: &StorageConfig,
) -> Result<Arc<dyn LeagueStore>, StorageError> {
    Ok(match backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Jsonl => Arc::new(JsonlStore::open_dir(config.league_dir())?),
    })
}
