//! Game and tournament drivers.
//!
//! ## Key Types
//!
//! - `GameRunner`: deals one game and drives it turn by turn to an outcome
//! - `GameOutcome`: winner, turn count and per-seat error tallies
//! - `GameTrace`: optional turn-by-turn record for reproducibility checks
//! - `TournamentSummary`: append-only aggregate of many outcomes
//! - `CancelSignal`: stops a tournament from dispatching further games

pub mod game;
pub mod tournament;

pub use game::{
    run_game, GameError, GameOutcome, GameRunner, GameTrace, TerminationReason, TraceStep,
};
pub use tournament::{
    run_tournament, seating, AgentFactory, CancelSignal, TournamentError, TournamentSummary,
};
