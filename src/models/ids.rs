//! Server-assigned record identifiers.

/// Identifier of a player row.
pub type PlayerId = i64;

/// Identifier of a match row.
pub type MatchId = i64;

/// Identifier of a round row.
pub type RoundId = i64;

/// Monotonic id sequence for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdSequence {
    last: i64,
}

impl IdSequence {
    /// Hand out the next id.
    pub fn next_id(&mut self) -> i64 {
        self.last += 1;
        self.last
    }

    /// Make sure future ids are strictly greater than `id`.
    pub fn advance_past(&mut self, id: i64) {
        if id > self.last {
            self.last = id;
        }
    }

    pub fn last(&self) -> i64 {
        self.last
    }
}
