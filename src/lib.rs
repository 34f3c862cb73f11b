//! # uno-arena
//!
//! UNO played by language-model agents, humans and bots.
//!
//! ## Design Principles
//!
//! 1. **One Mutator**: Only `UnoEngine::apply` changes a `GameState`, and
//!    only with moves `validate` accepted. Agents see a `PlayerView`.
//!
//! 2. **Always Progress**: Every agent failure is bounded. LLM agents retry
//!    then fall back to a deterministic move; a game that still cannot go on
//!    ends with a recorded termination reason instead of an error.
//!
//! 3. **Reproducible**: All randomness flows from a seeded `GameRng`, so a
//!    seed plus the agents' replies reproduces a game turn by turn.
//!
//! ## Modules
//!
//! - `core`: Players, RNG, configuration, game state
//! - `cards`: Cards, the 108-card deck, draw and discard piles
//! - `rules`: Move type, validator, player views, the rules engine
//! - `agents`: The `Agent` capability with LLM, human and random variants
//! - `orchestrator`: Single-game runner and concurrent tournaments

pub mod agents;
pub mod cards;
pub mod core;
pub mod orchestrator;
pub mod rules;

// Re-export commonly used types
pub use crate::core::{
    ConfigError, Direction, GameConfig, GameEvent, GameRng, GameState, HouseRules, PlayerId,
    PlayerMap, TurnPhase,
};

pub use crate::cards::{Card, Color, Deck, DeckError, Rank};

pub use crate::rules::{
    legal_moves, validate, Move, PlayerView, RejectReason, RulesError, UnoEngine,
};

pub use crate::agents::{
    fallback_move, Agent, AgentError, AgentSpec, Decision, DecisionProvider, HumanAgent, LlmAgent,
    ModelConfig, RandomAgent,
};

pub use crate::orchestrator::{
    run_game, run_tournament, CancelSignal, GameOutcome, GameRunner, GameTrace, TerminationReason,
    TournamentSummary,
};
