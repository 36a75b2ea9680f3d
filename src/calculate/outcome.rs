//! Match outcome from round scores.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Match, MatchId, MatchOutcome, Round, RoundScore, Winner};

/// Anything carrying a pair of team scores.
pub trait RoundPoints {
    fn points(&self) -> (u32, u32);
}

impl RoundPoints for Round {
    fn points(&self) -> (u32, u32) {
        (self.team1_score, self.team2_score)
    }
}

impl RoundPoints for RoundScore {
    fn points(&self) -> (u32, u32) {
        (self.team1_score, self.team2_score)
    }
}

/// Tally round wins and points. Independent of round order.
pub fn compute_outcome<R: RoundPoints>(rounds: &[R]) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    for round in rounds {
        let (a, b) = round.points();
        outcome.rounds_played += 1;
        outcome.total_score_a += u64::from(a);
        outcome.total_score_b += u64::from(b);
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => outcome.rounds_won_a += 1,
            std::cmp::Ordering::Less => outcome.rounds_won_b += 1,
            std::cmp::Ordering::Equal => outcome.rounds_tied += 1,
        }
    }

    outcome.winner = match outcome.rounds_won_a.cmp(&outcome.rounds_won_b) {
        std::cmp::Ordering::Greater => Winner::A,
        std::cmp::Ordering::Less => Winner::B,
        std::cmp::Ordering::Equal => Winner::Tie,
    };

    outcome
}

/// A match reduced to what the aggregators need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    #[serde(rename = "match")]
    pub record: Match,
    pub outcome: MatchOutcome,
}

impl ScoredMatch {
    pub fn from_rounds<R: RoundPoints>(record: Match, rounds: &[R]) -> Self {
        Self {
            outcome: compute_outcome(rounds),
            record,
        }
    }
}

/// Attach outcomes to matches and keep only the played ones.
///
/// A match is played when its cached status says so or when rounds exist
/// for it, whichever comes first.
pub fn score_played_matches(matches: Vec<Match>, rounds: &[Round]) -> Vec<ScoredMatch> {
    let mut by_match: HashMap<MatchId, Vec<&Round>> = HashMap::new();
    for round in rounds {
        by_match.entry(round.match_id).or_default().push(round);
    }

    matches
        .into_iter()
        .filter_map(|m| {
            let rounds: Vec<Round> = by_match
                .get(&m.id)
                .map(|rs| rs.iter().map(|r| (*r).clone()).collect())
                .unwrap_or_default();
            if m.is_played() || !rounds.is_empty() {
                Some(ScoredMatch::from_rounds(m, &rounds))
            } else {
                None
            }
        })
        .collect()
}
