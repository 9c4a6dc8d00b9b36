//! Heat Core - bracket generation and scoring for multi-round race events.
//!
//! Racers are split into heats, heat finishes become points, and points
//! reseed later rounds and roll up into event and season standings. The crate
//! performs no I/O: every operation takes a snapshot and returns a new one.
//! Python bindings are available behind the `python` feature.

pub mod constants;
pub mod error;
pub mod event;
pub mod heat;
pub mod partition;
pub mod progression;
pub mod racer;
pub mod scoring;
pub mod seeding;
pub mod standings;
pub mod store;

#[cfg(feature = "python")]
mod python;

pub use constants::{
    heat_points, heat_points_total, rng_from_seed, DEFAULT_RACERS_PER_HEAT, DEFAULT_TOTAL_ROUNDS,
    MAX_RACERS_PER_HEAT, MIN_RACERS_PER_HEAT, MIN_TOTAL_ROUNDS,
};
pub use error::{EngineError, EngineResult, StateError, ValidationError};
pub use event::{Event, EventConfig, EventStatus, Round, RoundStatus};
pub use heat::{Heat, HeatResult, HeatStatus};
pub use partition::{heat_count, partition_heats};
pub use progression::{
    complete_heat, finalize_event, is_event_complete, is_round_complete, start_round, FinalizedEvent,
};
pub use racer::{Racer, RacerId};
pub use scoring::{finish_order_from_positions, validate_and_score_heat, validate_finish_order, ScoredHeat};
pub use seeding::{seed_and_partition_first_round, seed_and_partition_next_round};
pub use standings::{
    accumulated_points, apply_season_points, compute_event_standings, round_points, season_leaderboard,
    season_totals, LeaderboardEntry, RankedEntry,
};
pub use store::{finalize_stored_event, with_event, EventLocks, InMemoryEventStore, SnapshotStore, StoreError};
