//! Round batch validation.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::models::{Numeric, RoundInput, RoundScore, ValidatedRounds};

fn integer(value: &Option<Numeric>) -> Option<i64> {
    value.as_ref().and_then(Numeric::as_integer)
}

fn score(value: &Option<Numeric>) -> Option<u32> {
    integer(value).and_then(|s| u32::try_from(s).ok())
}

/// Validate a proposed round batch and return it sorted by index.
///
/// Checks run in order: non-empty batch, integral indexes, non-negative
/// integral scores, then the index set must be exactly `1..=N` where N is
/// the batch size.
pub fn validate_rounds(batch: &[RoundInput]) -> Result<ValidatedRounds, ValidationError> {
    if batch.is_empty() {
        return Err(ValidationError::NoRounds);
    }

    let indexes = batch
        .iter()
        .map(|r| integer(&r.round_index))
        .collect::<Option<Vec<i64>>>()
        .ok_or(ValidationError::NonIntegerRoundIndex)?;

    let scores = batch
        .iter()
        .map(|r| Some((score(&r.team1_score)?, score(&r.team2_score)?)))
        .collect::<Option<Vec<(u32, u32)>>>()
        .ok_or(ValidationError::InvalidScore)?;

    let count = indexes.len() as i64;
    let max_index = indexes.iter().copied().max().unwrap_or(0);
    let present: HashSet<i64> = indexes.iter().copied().collect();

    // More slots than entries always leaves a hole.
    if max_index > count || (1..=max_index).any(|i| !present.contains(&i)) {
        return Err(ValidationError::NonSequentialRounds);
    }
    if count != max_index {
        return Err(ValidationError::RoundCountMismatch);
    }

    let mut rounds: Vec<RoundScore> = indexes
        .into_iter()
        .zip(scores)
        .map(|(index, (team1_score, team2_score))| RoundScore {
            round_index: index as u32,
            team1_score,
            team2_score,
        })
        .collect();
    rounds.sort_by_key(|r| r.round_index);

    Ok(ValidatedRounds::from_sorted(rounds))
}
