//! # Belote League
//!
//! Match, round and statistics tracker for a two-versus-two belote league.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, matches, rounds, statistics)
//! - **calculate**: Round validation, match outcomes, player stats, leaderboard, ranking
//! - **storage**: Persistence contract plus in-memory and JSONL adapters
//! - **service**: Fetch-then-compute orchestration over a store
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod storage;

pub use error::{LeagueError, LeagueResult, ValidationError};
pub use models::*;
