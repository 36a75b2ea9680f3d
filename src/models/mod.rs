//! Core data models for the league.

mod ids;
mod matches;
mod player;
mod round;
mod stats;

pub use ids::*;
pub use matches::*;
pub use player::*;
pub use round::*;
pub use stats::*;
