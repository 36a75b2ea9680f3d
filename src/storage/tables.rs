//! In-memory table engine shared by every adapter.
//!
//! Writes run against a private copy of the tables. The copy is made durable
//! and only then published, so readers never observe a half-applied unit and
//! a failed step leaves the published state exactly as it was.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{LeagueStore, MatchFilter, Snapshot, StorageError};
use crate::models::{
    IdSequence, Match, MatchDraft, MatchId, MatchStatus, NewPlayer, Player, PlayerId, Round,
    RoundId, ValidatedRounds,
};

/// The three league tables plus their id sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    players: BTreeMap<PlayerId, Player>,
    matches: BTreeMap<MatchId, Match>,
    rounds: BTreeMap<RoundId, Round>,
    player_ids: IdSequence,
    match_ids: IdSequence,
    round_ids: IdSequence,
}

impl Tables {
    /// Build tables from a snapshot, enforcing the same constraints as
    /// [`Tables::import`].
    pub fn from_snapshot(snapshot: Snapshot, now: DateTime<Utc>) -> Result<Self, StorageError> {
        let mut tables = Tables::default();
        tables.import(snapshot, now)?;
        Ok(tables)
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            players: self.players.values().cloned().collect(),
            matches: self.matches.values().cloned().collect(),
            rounds: self.rounds.values().cloned().collect(),
        }
    }

    /// Insert or overwrite records by id and move sequences past them.
    ///
    /// The rounds of every imported match are replaced by the snapshot's.
    /// Fails with [`StorageError::Constraint`] when the result breaks a
    /// table constraint; the caller discards the tables in that case.
    pub fn import(&mut self, snapshot: Snapshot, now: DateTime<Utc>) -> Result<(), StorageError> {
        for player in snapshot.players {
            self.player_ids.advance_past(player.id);
            self.players.insert(player.id, player);
        }

        let mut touched: BTreeSet<MatchId> = snapshot.matches.iter().map(|m| m.id).collect();
        for m in snapshot.matches {
            self.match_ids.advance_past(m.id);
            self.matches.insert(m.id, m);
        }
        self.rounds.retain(|_, r| !touched.contains(&r.match_id));

        for round in snapshot.rounds {
            self.round_ids.advance_past(round.id);
            touched.insert(round.match_id);
            self.rounds.insert(round.id, round);
        }

        self.check_integrity()?;
        for match_id in touched {
            self.sync_status(match_id, now);
        }
        Ok(())
    }

    /// Every match names four distinct existing players, every round
    /// belongs to an existing match, and each match's round indexes are
    /// exactly `1..=N`.
    fn check_integrity(&self) -> Result<(), StorageError> {
        for m in self.matches.values() {
            let ids = m.player_ids();
            for (i, id) in ids.iter().enumerate() {
                if !self.players.contains_key(id) {
                    return Err(StorageError::Constraint(format!(
                        "match {} references missing player {}",
                        m.id, id
                    )));
                }
                if ids[..i].contains(id) {
                    return Err(StorageError::Constraint(format!(
                        "match {} lists player {} more than once",
                        m.id, id
                    )));
                }
            }
        }

        let mut indexes: BTreeMap<MatchId, Vec<u32>> = BTreeMap::new();
        for round in self.rounds.values() {
            if !self.matches.contains_key(&round.match_id) {
                return Err(StorageError::Constraint(format!(
                    "round {} references missing match {}",
                    round.id, round.match_id
                )));
            }
            indexes.entry(round.match_id).or_default().push(round.round_index);
        }
        for (match_id, mut found) in indexes {
            found.sort_unstable();
            let sequential = found
                .iter()
                .enumerate()
                .all(|(i, &index)| index as usize == i + 1);
            if !sequential {
                return Err(StorageError::Constraint(format!(
                    "rounds of match {} are not numbered 1..{}",
                    match_id,
                    found.len()
                )));
            }
        }
        Ok(())
    }

    pub fn players(&self) -> Vec<Player> {
        // Newest first
        let mut players: Vec<Player> = self.players.values().cloned().collect();
        players.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        players
    }

    pub fn player(&self, id: PlayerId) -> Option<Player> {
        self.players.get(&id).cloned()
    }

    pub fn insert_player(&mut self, player: NewPlayer, now: DateTime<Utc>) -> Player {
        let record = Player {
            id: self.player_ids.next_id(),
            first_name: player.first_name,
            last_name: player.last_name,
            email: player.email,
            phone: player.phone,
            created_at: now,
            updated_at: now,
        };
        self.players.insert(record.id, record.clone());
        record
    }

    pub fn update_player(
        &mut self,
        id: PlayerId,
        player: NewPlayer,
        now: DateTime<Utc>,
    ) -> Option<Player> {
        let record = self.players.get_mut(&id)?;
        record.first_name = player.first_name;
        record.last_name = player.last_name;
        record.email = player.email;
        record.phone = player.phone;
        record.updated_at = now;
        Some(record.clone())
    }

    pub fn delete_player(&mut self, id: PlayerId) -> Result<bool, StorageError> {
        if !self.players.contains_key(&id) {
            return Ok(false);
        }
        if let Some(m) = self.matches.values().find(|m| m.involves(id)) {
            return Err(StorageError::Constraint(format!(
                "player {} is referenced by match {}",
                id, m.id
            )));
        }
        self.players.remove(&id);
        Ok(true)
    }

    pub fn matches(&self, filter: MatchFilter) -> Vec<Match> {
        let with_rounds: BTreeSet<MatchId> = self.rounds.values().map(|r| r.match_id).collect();
        let mut matches: Vec<Match> = self
            .matches
            .values()
            .filter(|m| filter.accepts(m, with_rounds.contains(&m.id)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.played_at
                .cmp(&a.played_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        matches
    }

    pub fn match_record(&self, id: MatchId) -> Option<Match> {
        self.matches.get(&id).cloned()
    }

    pub fn match_with_rounds(&self, id: MatchId) -> Option<(Match, Vec<Round>)> {
        let record = self.match_record(id)?;
        Some((record, self.rounds_of(id)))
    }

    /// Listed matches plus the rounds belonging to them.
    pub fn matches_with_rounds(&self, filter: MatchFilter) -> (Vec<Match>, Vec<Round>) {
        let matches = self.matches(filter);
        let ids: BTreeSet<MatchId> = matches.iter().map(|m| m.id).collect();
        let rounds = self
            .all_rounds()
            .into_iter()
            .filter(|r| ids.contains(&r.match_id))
            .collect();
        (matches, rounds)
    }

    pub fn insert_match(&mut self, draft: MatchDraft, now: DateTime<Utc>) -> Match {
        let record = Match {
            id: self.match_ids.next_id(),
            played_at: draft.played_at,
            location: draft.location,
            team1: draft.team1,
            team2: draft.team2,
            rounds_played: 0,
            status: MatchStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };
        self.matches.insert(record.id, record.clone());
        record
    }

    pub fn update_match(&mut self, id: MatchId, draft: MatchDraft, now: DateTime<Utc>) -> Option<Match> {
        let record = self.matches.get_mut(&id)?;
        record.played_at = draft.played_at;
        record.location = draft.location;
        record.team1 = draft.team1;
        record.team2 = draft.team2;
        record.updated_at = now;
        Some(record.clone())
    }

    pub fn delete_match(&mut self, id: MatchId) -> bool {
        if self.matches.remove(&id).is_none() {
            return false;
        }
        self.rounds.retain(|_, r| r.match_id != id);
        true
    }

    pub fn rounds_of(&self, match_id: MatchId) -> Vec<Round> {
        let mut rounds: Vec<Round> = self
            .rounds
            .values()
            .filter(|r| r.match_id == match_id)
            .cloned()
            .collect();
        rounds.sort_by_key(|r| r.round_index);
        rounds
    }

    pub fn all_rounds(&self) -> Vec<Round> {
        let mut rounds: Vec<Round> = self.rounds.values().cloned().collect();
        rounds.sort_by_key(|r| (r.match_id, r.round_index));
        rounds
    }

    /// Clear, insert, refresh the status cache.
    pub fn replace_rounds(
        &mut self,
        match_id: MatchId,
        rounds: &ValidatedRounds,
        now: DateTime<Utc>,
    ) -> Option<Vec<Round>> {
        if !self.matches.contains_key(&match_id) {
            return None;
        }

        self.rounds.retain(|_, r| r.match_id != match_id);
        for score in rounds.iter() {
            let round = Round {
                id: self.round_ids.next_id(),
                match_id,
                round_index: score.round_index,
                team1_score: score.team1_score,
                team2_score: score.team2_score,
            };
            self.rounds.insert(round.id, round);
        }
        self.refresh_status(match_id, now);

        Some(self.rounds_of(match_id))
    }

    pub fn clear_rounds(&mut self, match_id: MatchId, now: DateTime<Utc>) -> bool {
        if !self.matches.contains_key(&match_id) {
            return false;
        }
        self.rounds.retain(|_, r| r.match_id != match_id);
        self.refresh_status(match_id, now);
        true
    }

    fn refresh_status(&mut self, match_id: MatchId, now: DateTime<Utc>) {
        let count = self.rounds.values().filter(|r| r.match_id == match_id).count();
        if let Some(m) = self.matches.get_mut(&match_id) {
            m.rounds_played = count as u32;
            m.status = MatchStatus::from_round_count(count);
            m.updated_at = now;
        }
    }

    /// Like `refresh_status`, but leaves an already consistent row untouched.
    fn sync_status(&mut self, match_id: MatchId, now: DateTime<Utc>) {
        let count = self.rounds.values().filter(|r| r.match_id == match_id).count();
        let status = MatchStatus::from_round_count(count);
        if let Some(m) = self.matches.get_mut(&match_id) {
            if m.rounds_played != count as u32 || m.status != status {
                m.rounds_played = count as u32;
                m.status = status;
                m.updated_at = now;
            }
        }
    }

    /// Overwrite the status cache without touching rounds.
    #[cfg(test)]
    pub(crate) fn set_status_cache(&mut self, match_id: MatchId, status: MatchStatus, rounds_played: u32) {
        if let Some(m) = self.matches.get_mut(&match_id) {
            m.status = status;
            m.rounds_played = rounds_played;
        }
    }
}

/// How a [`TableStore`] makes committed tables survive a restart.
pub trait Durability: Send + Sync {
    /// Initial contents.
    fn load(&self) -> Result<Tables, StorageError>;

    /// Make `tables` durable. A failure aborts the unit being committed.
    fn persist(&self, tables: &Tables) -> Result<(), StorageError>;
}

/// A [`LeagueStore`] over [`Tables`] with a pluggable durability layer.
pub struct TableStore<D> {
    tables: RwLock<Tables>,
    durability: D,
}

impl<D: Durability> TableStore<D> {
    pub fn open(durability: D) -> Result<Self, StorageError> {
        let tables = durability.load()?;
        Ok(Self::with_tables(tables, durability))
    }

    pub fn with_tables(tables: Tables, durability: D) -> Self {
        Self {
            tables: RwLock::new(tables),
            durability,
        }
    }

    pub fn durability(&self) -> &D {
        &self.durability
    }

    async fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let guard = self.tables.read().await;
        f(&guard)
    }

    /// Run one all-or-nothing unit.
    async fn transact<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Tables) -> Result<T, StorageError> + Send,
        T: Send,
    {
        let mut guard = self.tables.write().await;
        let mut working = Tables::clone(&guard);
        let out = f(&mut working)?;
        self.durability.persist(&working)?;
        *guard = working;
        Ok(out)
    }
}

#[async_trait]
impl<D: Durability> LeagueStore for TableStore<D> {
    async fn list_players(&self) -> Result<Vec<Player>, StorageError> {
        Ok(self.read(Tables::players).await)
    }

    async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, StorageError> {
        Ok(self.read(|t| t.player(id)).await)
    }

    async fn create_player(&self, player: NewPlayer) -> Result<Player, StorageError> {
        let created = self
            .transact(|t| Ok(t.insert_player(player, Utc::now())))
            .await?;
        info!("Created player {} ({})", created.id, created.full_name());
        Ok(created)
    }

    async fn update_player(
        &self,
        id: PlayerId,
        player: NewPlayer,
    ) -> Result<Option<Player>, StorageError> {
        self.transact(|t| Ok(t.update_player(id, player, Utc::now())))
            .await
    }

    async fn delete_player(&self, id: PlayerId) -> Result<bool, StorageError> {
        self.transact(|t| t.delete_player(id)).await
    }

    async fn list_matches(&self, filter: MatchFilter) -> Result<Vec<Match>, StorageError> {
        let matches = self.read(|t| t.matches(filter)).await;
        debug!("Listed {} matches ({:?})", matches.len(), filter);
        Ok(matches)
    }

    async fn get_match(&self, id: MatchId) -> Result<Option<Match>, StorageError> {
        Ok(self.read(|t| t.match_record(id)).await)
    }

    async fn create_match(&self, draft: MatchDraft) -> Result<Match, StorageError> {
        let created = self
            .transact(|t| Ok(t.insert_match(draft, Utc::now())))
            .await?;
        info!("Created match {} at {}", created.id, created.location);
        Ok(created)
    }

    async fn update_match(
        &self,
        id: MatchId,
        draft: MatchDraft,
    ) -> Result<Option<Match>, StorageError> {
        self.transact(|t| Ok(t.update_match(id, draft, Utc::now())))
            .await
    }

    async fn delete_match(&self, id: MatchId) -> Result<bool, StorageError> {
        self.transact(|t| Ok(t.delete_match(id))).await
    }

    async fn get_match_with_rounds(
        &self,
        id: MatchId,
    ) -> Result<Option<(Match, Vec<Round>)>, StorageError> {
        Ok(self.read(|t| t.match_with_rounds(id)).await)
    }

    async fn list_matches_with_rounds(
        &self,
        filter: MatchFilter,
    ) -> Result<(Vec<Match>, Vec<Round>), StorageError> {
        Ok(self.read(|t| t.matches_with_rounds(filter)).await)
    }

    async fn list_rounds(&self, match_id: MatchId) -> Result<Vec<Round>, StorageError> {
        Ok(self.read(|t| t.rounds_of(match_id)).await)
    }

    async fn list_all_rounds(&self) -> Result<Vec<Round>, StorageError> {
        Ok(self.read(Tables::all_rounds).await)
    }

    async fn replace_rounds(
        &self,
        match_id: MatchId,
        rounds: &ValidatedRounds,
    ) -> Result<Option<Vec<Round>>, StorageError> {
        let stored = self
            .transact(|t| Ok(t.replace_rounds(match_id, rounds, Utc::now())))
            .await?;
        if stored.is_some() {
            info!("Stored {} rounds for match {}", rounds.len(), match_id);
        }
        Ok(stored)
    }

    async fn clear_rounds(&self, match_id: MatchId) -> Result<bool, StorageError> {
        self.transact(|t| Ok(t.clear_rounds(match_id, Utc::now())))
            .await
    }

    async fn export(&self) -> Result<Snapshot, StorageError> {
        Ok(self.read(Tables::to_snapshot).await)
    }

    async fn import(&self, snapshot: Snapshot) -> Result<(), StorageError> {
        let (players, matches, rounds) = (
            snapshot.players.len(),
            snapshot.matches.len(),
            snapshot.rounds.len(),
        );
        self.transact(|t| t.import(snapshot, Utc::now())).await?;
        info!(
            "Imported players={} matches={} rounds={}",
            players, matches, rounds
        );
        Ok(())
    }
}
