//! Core engine types: players, RNG, configuration, game state.
//!
//! These are the building blocks the rules engine, agents and orchestrator
//! share. Game rules themselves live in `rules`.

pub mod config;
pub mod player;
pub mod rng;
pub mod state;

pub use config::{ConfigError, GameConfig, HouseRules, MAX_PLAYERS, MIN_PLAYERS};
pub use player::{Direction, PlayerId, PlayerMap};
pub use rng::GameRng;
pub use state::{ChallengeWindow, DrawReason, GameEvent, GameState, TurnPhase};
