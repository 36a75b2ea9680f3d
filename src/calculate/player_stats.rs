//! Per-player statistics over played matches.

use std::cmp::Reverse;

use super::outcome::ScoredMatch;
use super::{average_one_decimal, percentage};
use crate::models::{FormResult, Player, PlayerId, PlayerStatsEntry, PlayerStatsSnapshot};

/// Number of decided results kept in the recent-form sequence.
pub const RECENT_FORM_LEN: usize = 5;

/// Aggregate one player's record over the given played matches.
///
/// Matches the player did not take part in are ignored.
pub fn compute_player_stats(player: PlayerId, matches: &[ScoredMatch]) -> PlayerStatsSnapshot {
    let mut stats = PlayerStatsSnapshot::default();
    let mut decided: Vec<(&ScoredMatch, FormResult)> = Vec::new();

    for m in matches {
        let Some(side) = m.record.side_of(player) else {
            continue;
        };

        stats.played_matches += 1;
        stats.total_points += m.outcome.score_for(side);
        stats.total_rounds += m.outcome.rounds_played;

        match m.outcome.winner.result_for(side) {
            Some(FormResult::W) => {
                stats.wins += 1;
                decided.push((m, FormResult::W));
            }
            Some(FormResult::L) => {
                stats.losses += 1;
                decided.push((m, FormResult::L));
            }
            None => stats.ties += 1,
        }
    }

    stats.win_rate = percentage(stats.wins, stats.played_matches);
    stats.avg_round_points = average_one_decimal(stats.total_points, stats.total_rounds);

    // Most recent first; id breaks ties between matches played at the same instant.
    decided.sort_by_key(|(m, _)| Reverse((m.record.played_at, m.record.id)));
    stats.recent_form = decided
        .into_iter()
        .take(RECENT_FORM_LEN)
        .map(|(_, result)| result)
        .collect();

    stats
}

/// Statistics for every given player.
pub fn compute_all_player_stats(players: &[Player], matches: &[ScoredMatch]) -> Vec<PlayerStatsEntry> {
    players
        .iter()
        .map(|player| PlayerStatsEntry {
            player: player.clone(),
            stats: compute_player_stats(player.id, matches),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_played_at, Match, MatchStatus, RoundScore, Team};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn scored(id: i64, played_at: &str, team1: (i64, i64), team2: (i64, i64), rounds: &[(u32, u32)]) -> ScoredMatch {
        let now = Utc::now();
        let record = Match {
            id,
            played_at: parse_played_at(played_at).unwrap(),
            location: "Club".to_string(),
            team1: Team::new(team1.0, team1.1),
            team2: Team::new(team2.0, team2.1),
            rounds_played: rounds.len() as u32,
            status: MatchStatus::Played,
            created_at: now,
            updated_at: now,
        };
        let rounds: Vec<RoundScore> = rounds
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| RoundScore {
                round_index: i as u32 + 1,
                team1_score: a,
                team2_score: b,
            })
            .collect();
        ScoredMatch::from_rounds(record, &rounds)
    }

    #[test]
    fn test_three_matches_two_wins() {
        // Player 1: win (team A), win (team B), loss (team A).
        // Points: 60 + 50 + 40 = 150 over 3 + 3 + 3 = 9 rounds.
        let matches = vec![
            scored(1, "2024-01-01T20:00", (1, 2), (3, 4), &[(20, 10), (20, 10), (20, 10)]),
            scored(2, "2024-01-02T20:00", (3, 4), (2, 1), &[(0, 20), (0, 20), (5, 10)]),
            scored(3, "2024-01-03T20:00", (1, 3), (2, 4), &[(10, 20), (10, 20), (20, 10)]),
        ];

        let stats = compute_player_stats(1, &matches);
        assert_eq!(stats.played_matches, 3);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.win_rate, 67);
        assert_eq!(stats.total_points, 150);
        assert_eq!(stats.total_rounds, 9);
        assert_eq!(stats.avg_round_points, Some(16.7));
        assert_eq!(stats.recent_form, vec![FormResult::L, FormResult::W, FormResult::W]);
    }

    #[test]
    fn test_no_matches() {
        let matches = vec![scored(1, "2024-01-01T20:00", (1, 2), (3, 4), &[(20, 10)])];

        let stats = compute_player_stats(99, &matches);
        assert_eq!(stats.played_matches, 0);
        assert_eq!(stats.win_rate, 0);
        assert_eq!(stats.avg_round_points, None);
        assert!(stats.recent_form.is_empty());
    }

    #[test]
    fn test_played_without_rounds_has_null_average() {
        // Status says played, no rounds stored: zero rounds means no average.
        let matches = vec![scored(1, "2024-01-01T20:00", (1, 2), (3, 4), &[])];

        let stats = compute_player_stats(1, &matches);
        assert_eq!(stats.played_matches, 1);
        assert_eq!(stats.ties, 1);
        assert_eq!(stats.avg_round_points, None);
    }

    #[test]
    fn test_zero_points_is_not_null() {
        let matches = vec![scored(1, "2024-01-01T20:00", (1, 2), (3, 4), &[(0, 10)])];
        let stats = compute_player_stats(1, &matches);
        assert_eq!(stats.avg_round_points, Some(0.0));
    }

    #[test]
    fn test_recent_form_skips_ties_and_caps_at_five() {
        let mut matches = Vec::new();
        // Seven decided matches alternating W/L with ties interleaved.
        for day in 1..=9 {
            let rounds: &[(u32, u32)] = match day {
                3 | 6 => &[(5, 5)],
                d if d % 2 == 0 => &[(10, 0)],
                _ => &[(0, 10)],
            };
            matches.push(scored(day, &format!("2024-02-{:02}T20:00", day), (1, 2), (3, 4), rounds));
        }

        let stats = compute_player_stats(1, &matches);
        assert_eq!(stats.ties, 2);
        // Days 9, 8, 7, 5, 4 (6 is a tie).
        assert_eq!(
            stats.recent_form,
            vec![FormResult::L, FormResult::W, FormResult::L, FormResult::L, FormResult::W]
        );
    }

    #[test]
    fn test_recent_form_id_breaks_same_timestamp() {
        let matches = vec![
            scored(10, "2024-03-01T20:00", (1, 2), (3, 4), &[(10, 0)]),
            scored(11, "2024-03-01T20:00", (1, 2), (3, 4), &[(0, 10)]),
        ];
        let stats = compute_player_stats(1, &matches);
        assert_eq!(stats.recent_form, vec![FormResult::L, FormResult::W]);
    }

    #[test]
    fn test_compute_all_player_stats() {
        let now = Utc::now();
        let players: Vec<Player> = (1..=4)
            .map(|id| Player {
                id,
                first_name: format!("P{}", id),
                last_name: format!("L{}", id),
                email: None,
                phone: None,
                created_at: now,
                updated_at: now,
            })
            .collect();
        let matches = vec![scored(1, "2024-01-01T20:00", (1, 2), (3, 4), &[(20, 10)])];

        let entries = compute_all_player_stats(&players, &matches);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].stats.wins, 1);
        assert_eq!(entries[2].stats.losses, 1);
        assert_eq!(entries[3].stats.total_points, 10);
    }
}
