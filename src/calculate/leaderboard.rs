//! League-wide leaderboard and KPIs.

use std::collections::{BTreeMap, HashMap};

use super::compare_players_by_name;
use super::outcome::ScoredMatch;
use crate::models::{
    Leaderboard, LeagueTotals, MonthBucket, Player, PlayerId, PlayerRef, ScorerEntry, WinnerEntry,
};

/// How many players the winners podium shows.
pub const TOP_WINNERS: usize = 3;

/// Turn a `YYYY-MM` key into its `MM/YYYY` display form.
pub fn month_label(key: &str) -> String {
    match key.split_once('-') {
        Some((year, month)) if !year.is_empty() && !month.is_empty() => {
            format!("{}/{}", month, year)
        }
        _ => key.to_string(),
    }
}

/// Build the league leaderboard over played matches.
///
/// Only players still present in `players` can appear in rankings.
pub fn build_leaderboard(players: &[Player], matches: &[ScoredMatch]) -> Leaderboard {
    let roster: HashMap<PlayerId, &Player> = players.iter().map(|p| (p.id, p)).collect();

    let mut wins: HashMap<PlayerId, u32> = HashMap::new();
    let mut points: HashMap<PlayerId, u64> = HashMap::new();
    let mut months: BTreeMap<String, u32> = BTreeMap::new();
    let mut totals = LeagueTotals {
        players: players.len() as u32,
        ..Default::default()
    };

    for m in matches {
        totals.matches += 1;
        totals.rounds += m.outcome.rounds_played;
        totals.points += m.outcome.total_score_a + m.outcome.total_score_b;

        *months
            .entry(m.record.played_at.format("%Y-%m").to_string())
            .or_default() += 1;

        for (team, side) in [
            (m.record.team1, crate::models::TeamSide::A),
            (m.record.team2, crate::models::TeamSide::B),
        ] {
            let won = m.outcome.winner.side() == Some(side);
            for id in team.members() {
                if !roster.contains_key(&id) {
                    continue;
                }
                *points.entry(id).or_default() += m.outcome.score_for(side);
                if won {
                    *wins.entry(id).or_default() += 1;
                }
            }
        }
    }

    let mut top_winners: Vec<(&Player, u32)> = wins
        .into_iter()
        .filter_map(|(id, w)| roster.get(&id).map(|p| (*p, w)))
        .collect();
    top_winners.sort_by(|(pa, wa), (pb, wb)| wb.cmp(wa).then_with(|| compare_players_by_name(pa, pb)));

    let top_scorer = points
        .into_iter()
        .filter_map(|(id, pts)| roster.get(&id).map(|p| (*p, pts)))
        .min_by(|(pa, a), (pb, b)| b.cmp(a).then_with(|| compare_players_by_name(pa, pb)))
        .map(|(player, points)| ScorerEntry {
            player: PlayerRef::from(player),
            points,
        });

    Leaderboard {
        totals,
        matches_by_month: months
            .into_iter()
            .map(|(key, total_matches)| MonthBucket {
                month: month_label(&key),
                key,
                total_matches,
            })
            .collect(),
        top_winners: top_winners
            .into_iter()
            .take(TOP_WINNERS)
            .map(|(player, wins)| WinnerEntry {
                player: PlayerRef::from(player),
                wins,
            })
            .collect(),
        top_scorer,
    }
}
