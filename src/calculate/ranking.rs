//! Sorting and offset/limit pagination of player statistics.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::compare_players_by_name;
use crate::models::PlayerStatsEntry;

/// Field a statistics table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    LastName,
    PlayedMatches,
    Wins,
    WinRate,
    AvgRoundPoints,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lastName" | "last_name" => Ok(SortKey::LastName),
            "playedMatches" | "played_matches" => Ok(SortKey::PlayedMatches),
            "wins" => Ok(SortKey::Wins),
            "winRate" | "win_rate" => Ok(SortKey::WinRate),
            "avgRoundPoints" | "avg_round_points" => Ok(SortKey::AvgRoundPoints),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Requested window over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    /// `None` means no limit
    pub limit: Option<usize>,
    pub offset: usize,
}

impl PageRequest {
    pub fn new(limit: Option<usize>, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Lenient parsing: a missing, unparsable or non-positive limit means
    /// "no limit"; a missing, unparsable or negative offset means 0.
    pub fn from_raw(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = limit
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|&l| l > 0)
            .map(|l| l as usize);
        let offset = offset
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|&o| o >= 0)
            .map(|o| o as usize)
            .unwrap_or(0);
        Self { limit, offset }
    }
}

/// Pagination metadata. `total` counts items before the window was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub limit: Option<usize>,
    pub offset: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paged<T> {
    /// Cut `[offset, offset + limit)` out of an already ordered collection.
    pub fn slice(items: Vec<T>, page: PageRequest) -> Self {
        let total = items.len();
        let items: Vec<T> = match page.limit {
            Some(limit) => items.into_iter().skip(page.offset).take(limit).collect(),
            None => items.into_iter().skip(page.offset).collect(),
        };
        Self {
            items,
            pagination: PageMeta {
                limit: page.limit,
                offset: page.offset,
                total,
            },
        }
    }
}

/// Numeric sort value. A missing average gets a sentinel that lands at the
/// tail once the direction is applied.
fn numeric_value(entry: &PlayerStatsEntry, key: SortKey, order: SortOrder) -> f64 {
    let stats = &entry.stats;
    match key {
        SortKey::LastName => 0.0,
        SortKey::PlayedMatches => f64::from(stats.played_matches),
        SortKey::Wins => f64::from(stats.wins),
        SortKey::WinRate => f64::from(stats.win_rate),
        SortKey::AvgRoundPoints => stats.avg_round_points.unwrap_or(match order {
            SortOrder::Asc => f64::INFINITY,
            SortOrder::Desc => f64::NEG_INFINITY,
        }),
    }
}

fn compare_entries(a: &PlayerStatsEntry, b: &PlayerStatsEntry, key: SortKey, order: SortOrder) -> Ordering {
    let primary = match key {
        SortKey::LastName => compare_players_by_name(&a.player, &b.player),
        _ => numeric_value(a, key, order).total_cmp(&numeric_value(b, key, order)),
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| compare_players_by_name(&a.player, &b.player))
}

/// Sort statistics by `key` in `order`, then apply the page window.
///
/// Equal keys fall back to name then id, so the order is total.
pub fn rank_and_page(
    mut entries: Vec<PlayerStatsEntry>,
    key: SortKey,
    order: SortOrder,
    page: PageRequest,
) -> Paged<PlayerStatsEntry> {
    entries.sort_by(|a, b| compare_entries(a, b, key, order));
    Paged::slice(entries, page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Player, PlayerStatsSnapshot};
    use chrono::Utc;

    fn entry(id: i64, last: &str, wins: u32, avg: Option<f64>) -> PlayerStatsEntry {
        let now = Utc::now();
        PlayerStatsEntry {
            player: Player {
                id,
                first_name: format!("F{}", id),
                last_name: last.to_string(),
                email: None,
                phone: None,
                created_at: now,
                updated_at: now,
            },
            stats: PlayerStatsSnapshot {
                played_matches: wins + 1,
                wins,
                win_rate: wins * 10,
                avg_round_points: avg,
                ..Default::default()
            },
        }
    }

    fn ids(paged: &Paged<PlayerStatsEntry>) -> Vec<i64> {
        paged.items.iter().map(|e| e.player.id).collect()
    }

    fn sample() -> Vec<PlayerStatsEntry> {
        vec![
            entry(1, "martin", 3, Some(12.5)),
            entry(2, "Bernard", 5, None),
            entry(3, "Émery", 1, Some(40.0)),
            entry(4, "durand", 5, Some(3.0)),
            entry(5, "Zola", 0, None),
        ]
    }

    #[test]
    fn test_parse_keys_and_orders() {
        assert_eq!("winRate".parse::<SortKey>(), Ok(SortKey::WinRate));
        assert_eq!("avg_round_points".parse::<SortKey>(), Ok(SortKey::AvgRoundPoints));
        assert!("points".parse::<SortKey>().is_err());
        assert_eq!("ASC".parse::<SortOrder>(), Ok(SortOrder::Asc));
        assert_eq!(SortKey::default(), SortKey::LastName);
        assert_eq!(SortOrder::default(), SortOrder::Desc);
    }

    #[test]
    fn test_last_name_case_and_accent_insensitive() {
        let paged = rank_and_page(sample(), SortKey::LastName, SortOrder::Asc, PageRequest::default());
        assert_eq!(ids(&paged), vec![2, 4, 3, 1, 5]);

        let paged = rank_and_page(sample(), SortKey::LastName, SortOrder::Desc, PageRequest::default());
        assert_eq!(ids(&paged), vec![5, 1, 3, 4, 2]);
    }

    #[test]
    fn test_last_name_folds_letters_outside_latin1() {
        let entries = vec![
            entry(1, "Zola", 0, None),
            entry(2, "Šimek", 0, None),
            entry(3, "Łukasz", 0, None),
            entry(4, "Martin", 0, None),
        ];
        let paged = rank_and_page(entries, SortKey::LastName, SortOrder::Asc, PageRequest::default());
        let names: Vec<&str> = paged.items.iter().map(|e| e.player.last_name.as_str()).collect();
        assert_eq!(names, vec!["Łukasz", "Martin", "Šimek", "Zola"]);
    }

    #[test]
    fn test_null_averages_last_descending() {
        let paged = rank_and_page(sample(), SortKey::AvgRoundPoints, SortOrder::Desc, PageRequest::default());
        assert_eq!(ids(&paged), vec![3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_null_averages_last_ascending() {
        let paged = rank_and_page(sample(), SortKey::AvgRoundPoints, SortOrder::Asc, PageRequest::default());
        assert_eq!(ids(&paged), vec![4, 1, 3, 2, 5]);
    }

    #[test]
    fn test_numeric_ties_fall_back_to_name() {
        // Bernard and durand both have 5 wins
        let paged = rank_and_page(sample(), SortKey::Wins, SortOrder::Desc, PageRequest::default());
        assert_eq!(ids(&paged), vec![2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_pagination_window_and_total() {
        let page = PageRequest::new(Some(2), 1);
        let paged = rank_and_page(sample(), SortKey::LastName, SortOrder::Asc, page);
        assert_eq!(ids(&paged), vec![4, 3]);
        assert_eq!(
            paged.pagination,
            PageMeta {
                limit: Some(2),
                offset: 1,
                total: 5,
            }
        );
    }

    #[test]
    fn test_offset_past_end() {
        let paged = rank_and_page(sample(), SortKey::Wins, SortOrder::Asc, PageRequest::new(None, 10));
        assert!(paged.items.is_empty());
        assert_eq!(paged.pagination.total, 5);
    }

    #[test]
    fn test_lenient_page_parsing() {
        assert_eq!(PageRequest::from_raw(None, None), PageRequest::new(None, 0));
        assert_eq!(PageRequest::from_raw(Some("0"), Some("-3")), PageRequest::new(None, 0));
        assert_eq!(PageRequest::from_raw(Some("abc"), Some("x")), PageRequest::new(None, 0));
        assert_eq!(PageRequest::from_raw(Some("-1"), Some("4")), PageRequest::new(None, 4));
        assert_eq!(PageRequest::from_raw(Some(" 25 "), Some("5")), PageRequest::new(Some(25), 5));
    }
}
