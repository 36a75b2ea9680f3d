//! Scoring and statistics engine.
//!
//! Pure functions over rows handed in by the caller:
//! - Round batch validation
//! - Match outcomes from round scores
//! - Per-player statistics and recent form
//! - League leaderboard and monthly activity
//! - Sorting and pagination of statistics tables

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Player;

mod leaderboard;
mod outcome;
mod player_stats;
mod ranking;
mod rounds;

pub use leaderboard::*;
pub use outcome::*;
pub use player_stats::*;
pub use ranking::*;
pub use rounds::*;

/// `part / whole` as a rounded integer percentage, 0 when `whole` is 0.
pub fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        0
    } else {
        (f64::from(part) * 100.0 / f64::from(whole)).round() as u32
    }
}

/// `total / count` rounded to one decimal, `None` when `count` is 0.
pub fn average_one_decimal(total: u64, count: u32) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some((total as f64 / f64::from(count) * 10.0).round() / 10.0)
    }
}

/// Case- and accent-insensitive key for name ordering.
///
/// Canonical decomposition strips diacritics; letters that have no
/// decomposition (stroked or ligature forms) are folded by hand.
pub fn collation_key(s: &str) -> String {
    let mut key = String::with_capacity(s.len());
    for c in s
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        match c {
            'ł' => key.push('l'),
            'ø' => key.push('o'),
            'đ' | 'ð' => key.push('d'),
            'ħ' => key.push('h'),
            'ı' => key.push('i'),
            'æ' => key.push_str("ae"),
            'œ' => key.push_str("oe"),
            'ß' => key.push_str("ss"),
            _ => key.push(c),
        }
    }
    key
}

/// Last name, then first name (collated), then raw spelling, then id.
pub fn compare_players_by_name(a: &Player, b: &Player) -> Ordering {
    collation_key(&a.last_name)
        .cmp(&collation_key(&b.last_name))
        .then_with(|| collation_key(&a.first_name).cmp(&collation_key(&b.first_name)))
        .then_with(|| a.last_name.cmp(&b.last_name))
        .then_with(|| a.first_name.cmp(&b.first_name))
        .then_with(|| a.id.cmp(&b.id))
}
