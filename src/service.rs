//! League service: fetches rows from the store and hands them to the engine.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::calculate::{
    build_leaderboard, compute_all_player_stats, compute_outcome, compute_player_stats,
    rank_and_page, score_played_matches, validate_rounds, PageRequest, Paged, ScoredMatch,
    SortKey, SortOrder,
};
use crate::error::{LeagueError, LeagueResult};
use crate::models::{
    Leaderboard, Match, MatchDraft, MatchId, MatchInput, MatchOutcome, Player, PlayerId,
    PlayerInput, PlayerRef, PlayerStatsEntry, Round, RoundInput,
};
use crate::storage::{LeagueStore, MatchFilter, Snapshot};

/// Page size of the played-match listing when none is given.
pub const DEFAULT_PLAYED_LIMIT: usize = 10;

/// A match with its players resolved, in slot order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchView {
    #[serde(flatten)]
    pub record: Match,
    pub players: Vec<PlayerRef>,
}

/// A match with its rounds and outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchDetail {
    #[serde(flatten)]
    pub record: Match,
    pub players: Vec<PlayerRef>,
    pub rounds: Vec<Round>,
    pub outcome: MatchOutcome,
}

/// A played match with its outcome and players.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayedMatch {
    #[serde(flatten)]
    pub scored: ScoredMatch,
    pub players: Vec<PlayerRef>,
}

/// Rounds currently stored for a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRounds {
    pub match_id: MatchId,
    pub rounds: Vec<Round>,
}

/// Parameters of the player statistics table.
#[derive(Debug, Clone, Default)]
pub struct StatsQuery {
    pub search: Option<String>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub page: PageRequest,
}

fn player_refs(m: &Match, players: &HashMap<PlayerId, PlayerRef>) -> Vec<PlayerRef> {
    m.player_ids()
        .iter()
        .filter_map(|id| players.get(id).cloned())
        .collect()
}

fn index_players(players: &[Player]) -> HashMap<PlayerId, PlayerRef> {
    players.iter().map(|p| (p.id, PlayerRef::from(p))).collect()
}

#[derive(Clone)]
pub struct LeagueService {
    store: Arc<dyn LeagueStore>,
}

impl LeagueService {
    pub fn new(store: Arc<dyn LeagueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LeagueStore> {
        &self.store
    }

    // ── Players ─────────────────────────────────────────────────

    pub async fn list_players(&self, search: Option<&str>) -> LeagueResult<Vec<Player>> {
        let mut players = self.store.list_players().await?;
        if let Some(needle) = search {
            players.retain(|p| p.matches_search(needle));
        }
        Ok(players)
    }

    pub async fn get_player(&self, id: PlayerId) -> LeagueResult<Player> {
        self.store
            .get_player(id)
            .await?
            .ok_or_else(|| LeagueError::player_not_found(id))
    }

    pub async fn create_player(&self, input: &PlayerInput) -> LeagueResult<Player> {
        let player = input.validate()?;
        Ok(self.store.create_player(player).await?)
    }

    pub async fn update_player(&self, id: PlayerId, input: &PlayerInput) -> LeagueResult<Player> {
        let player = input.validate()?;
        let updated = self
            .store
            .update_player(id, player)
            .await?
            .ok_or_else(|| LeagueError::player_not_found(id))?;
        info!("Updated player {}", id);
        Ok(updated)
    }

    pub async fn delete_player(&self, id: PlayerId) -> LeagueResult<()> {
        if !self.store.delete_player(id).await? {
            return Err(LeagueError::player_not_found(id));
        }
        info!("Deleted player {}", id);
        Ok(())
    }

    // ── Matches ─────────────────────────────────────────────────

    pub async fn list_matches(&self) -> LeagueResult<Vec<MatchView>> {
        let matches = self.store.list_matches(MatchFilter::default()).await?;
        let players = index_players(&self.store.list_players().await?);

        Ok(matches
            .into_iter()
            .map(|m| MatchView {
                players: player_refs(&m, &players),
                record: m,
            })
            .collect())
    }

    pub async fn get_match(&self, id: MatchId) -> LeagueResult<MatchDetail> {
        let (record, rounds) = self
            .store
            .get_match_with_rounds(id)
            .await?
            .ok_or_else(|| LeagueError::match_not_found(id))?;
        let players = index_players(&self.store.list_players().await?);

        Ok(MatchDetail {
            players: player_refs(&record, &players),
            outcome: compute_outcome(&rounds),
            rounds,
            record,
        })
    }

    async fn ensure_players_exist(&self, draft: &MatchDraft) -> LeagueResult<()> {
        for id in draft.player_ids() {
            if self.store.get_player(id).await?.is_none() {
                return Err(LeagueError::player_not_found(id));
            }
        }
        Ok(())
    }

    pub async fn create_match(&self, input: &MatchInput) -> LeagueResult<Match> {
        let draft = input.validate()?;
        self.ensure_players_exist(&draft).await?;
        Ok(self.store.create_match(draft).await?)
    }

    pub async fn update_match(&self, id: MatchId, input: &MatchInput) -> LeagueResult<Match> {
        let draft = input.validate()?;
        if self.store.get_match(id).await?.is_none() {
            return Err(LeagueError::match_not_found(id));
        }
        self.ensure_players_exist(&draft).await?;

        let updated = self
            .store
            .update_match(id, draft)
            .await?
            .ok_or_else(|| LeagueError::match_not_found(id))?;
        info!("Updated match {}", id);
        Ok(updated)
    }

    pub async fn delete_match(&self, id: MatchId) -> LeagueResult<()> {
        if !self.store.delete_match(id).await? {
            return Err(LeagueError::match_not_found(id));
        }
        info!("Deleted match {} and its rounds", id);
        Ok(())
    }

    /// Played matches, most recent first, with their outcome.
    pub async fn played_matches(
        &self,
        player: Option<PlayerId>,
        page: PageRequest,
    ) -> LeagueResult<Paged<PlayedMatch>> {
        let filter = MatchFilter::played().with_player(player);
        let (matches, rounds) = self.store.list_matches_with_rounds(filter).await?;
        let players = index_players(&self.store.list_players().await?);

        let scored: Vec<PlayedMatch> = score_played_matches(matches, &rounds)
            .into_iter()
            .map(|s| PlayedMatch {
                players: player_refs(&s.record, &players),
                scored: s,
            })
            .collect();

        let paged = Paged::slice(scored, page);
        debug!(
            "Played matches: {} of {} (player={:?})",
            paged.items.len(),
            paged.pagination.total,
            player
        );
        Ok(paged)
    }

    // ── Rounds ──────────────────────────────────────────────────

    /// Validate the batch, then swap it in for the match's current rounds.
    pub async fn replace_rounds(
        &self,
        match_id: MatchId,
        batch: &[RoundInput],
    ) -> LeagueResult<MatchRounds> {
        let rounds = validate_rounds(batch)?;
        let stored = self
            .store
            .replace_rounds(match_id, &rounds)
            .await?
            .ok_or_else(|| LeagueError::match_not_found(match_id))?;

        Ok(MatchRounds {
            match_id,
            rounds: stored,
        })
    }

    pub async fn clear_rounds(&self, match_id: MatchId) -> LeagueResult<MatchRounds> {
        if !self.store.clear_rounds(match_id).await? {
            return Err(LeagueError::match_not_found(match_id));
        }
        info!("Cleared rounds of match {}", match_id);
        Ok(MatchRounds {
            match_id,
            rounds: Vec::new(),
        })
    }

    // ── Statistics ──────────────────────────────────────────────

    async fn scored_matches(&self, player: Option<PlayerId>) -> LeagueResult<Vec<ScoredMatch>> {
        let (matches, rounds) = self
            .store
            .list_matches_with_rounds(MatchFilter::played().with_player(player))
            .await?;
        Ok(score_played_matches(matches, &rounds))
    }

    pub async fn player_stats(&self, id: PlayerId) -> LeagueResult<PlayerStatsEntry> {
        let player = self.get_player(id).await?;
        let matches = self.scored_matches(Some(id)).await?;
        Ok(PlayerStatsEntry {
            stats: compute_player_stats(id, &matches),
            player,
        })
    }

    pub async fn stats_table(&self, query: &StatsQuery) -> LeagueResult<Paged<PlayerStatsEntry>> {
        let players = self.list_players(query.search.as_deref()).await?;
        let matches = self.scored_matches(None).await?;
        let entries = compute_all_player_stats(&players, &matches);
        Ok(rank_and_page(entries, query.sort, query.order, query.page))
    }

    pub async fn leaderboard(&self) -> LeagueResult<Leaderboard> {
        let players = self.store.list_players().await?;
        let matches = self.scored_matches(None).await?;
        Ok(build_leaderboard(&players, &matches))
    }

    // ── Migration ───────────────────────────────────────────────

    pub async fn export(&self) -> LeagueResult<Snapshot> {
        Ok(self.store.export().await?)
    }

    pub async fn import(&self, snapshot: Snapshot) -> LeagueResult<()> {
        Ok(self.store.import(snapshot).await?)
    }
}
