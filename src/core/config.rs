//! Game and tournament configuration.
//!
//! One `GameConfig` carries every knob the core recognizes: house rules for
//! the rules engine, the decision retry budget and timeout for agents, and the
//! worker count and seed for tournaments. Values are always passed in; the
//! core never reads the environment.
//!
//! ## House-rule defaults
//!
//! | knob | default |
//! |---|---|
//! | `stacking_enabled` | `false` |
//! | `draw_then_play_allowed` | `true` |
//! | `missed_uno_penalty` | `2` |
//! | `retry_budget` | `3` |
//! | `decision_timeout` | 30 s |
//! | `concurrency` | `4` |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest supported table.
pub const MIN_PLAYERS: usize = 2;

/// Largest supported table. 10 players * 7 cards still leaves a draw pile.
pub const MAX_PLAYERS: usize = 10;

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("player count {0} is outside {MIN_PLAYERS}..={MAX_PLAYERS}")]
    PlayerCount(usize),
    #[error("hand size {hand_size} leaves no draw pile for {players} players")]
    HandSize { hand_size: usize, players: usize },
    #[error("retry budget must be at least 1")]
    ZeroRetryBudget,
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("decision timeout must be non-zero")]
    ZeroTimeout,
    #[error("max turns must be at least 1")]
    ZeroMaxTurns,
}

/// Configuration recognized by the rules engine, agents and orchestrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Allow answering a pending Draw Two / Wild Draw Four with another card
    /// of the same rank, passing the accumulated obligation onward.
    pub stacking_enabled: bool,

    /// After a voluntary single draw, allow playing the drawn card this turn
    /// if it is playable.
    pub draw_then_play_allowed: bool,

    /// Cards drawn by a player caught not calling Uno.
    pub missed_uno_penalty: u32,

    /// Attempts an agent gets per decision before falling back.
    pub retry_budget: u32,

    /// Bounded wait for one decision-provider call.
    pub decision_timeout: Duration,

    /// Games run at once in a tournament.
    pub concurrency: usize,

    /// Master seed. `None` draws seeds from entropy.
    pub random_seed: Option<u64>,

    /// Cards dealt to each player.
    pub hand_size: usize,

    /// Applied moves after which a game is abandoned as a turn-limit draw.
    pub max_turns: u32,

    /// Rotate the starting seat between tournament games.
    pub rotate_seats: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            stacking_enabled: false,
            draw_then_play_allowed: true,
            missed_uno_penalty: 2,
            retry_budget: 3,
            decision_timeout: Duration::from_secs(30),
            concurrency: 4,
            random_seed: None,
            hand_size: 7,
            max_turns: 1000,
            rotate_seats: true,
        }
    }
}

impl GameConfig {
    /// Create a config with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable Draw Two / Wild Draw Four stacking.
    pub fn with_stacking(mut self, enabled: bool) -> Self {
        self.stacking_enabled = enabled;
        self
    }

    /// Enable or disable playing a freshly drawn card.
    pub fn with_draw_then_play(mut self, allowed: bool) -> Self {
        self.draw_then_play_allowed = allowed;
        self
    }

    /// Set the missed-Uno penalty.
    pub fn with_missed_uno_penalty(mut self, cards: u32) -> Self {
        self.missed_uno_penalty = cards;
        self
    }

    /// Set the per-decision attempt budget.
    pub fn with_retry_budget(mut self, attempts: u32) -> Self {
        self.retry_budget = attempts;
        self
    }

    /// Set the decision-provider timeout.
    pub fn with_decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = timeout;
        self
    }

    /// Set the tournament worker count.
    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = workers;
        self
    }

    /// Set the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set the starting hand size.
    pub fn with_hand_size(mut self, cards: usize) -> Self {
        self.hand_size = cards;
        self
    }

    /// Set the turn limit.
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = turns;
        self
    }

    /// Enable or disable seat rotation between tournament games.
    pub fn with_seat_rotation(mut self, rotate: bool) -> Self {
        self.rotate_seats = rotate;
        self
    }

    /// The rule knobs a table carries with it.
    #[must_use]
    pub fn house_rules(&self) -> HouseRules {
        HouseRules {
            stacking_enabled: self.stacking_enabled,
            draw_then_play_allowed: self.draw_then_play_allowed,
            missed_uno_penalty: self.missed_uno_penalty,
        }
    }

    /// Check the knobs that are independent of the table size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_budget == 0 {
            return Err(ConfigError::ZeroRetryBudget);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.decision_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_turns == 0 {
            return Err(ConfigError::ZeroMaxTurns);
        }
        Ok(())
    }

    /// Check the config against a concrete table size.
    pub fn validate_for(&self, player_count: usize) -> Result<(), ConfigError> {
        self.validate()?;
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
            return Err(ConfigError::PlayerCount(player_count));
        }
        // Leave at least the starter card and one card to draw.
        if self.hand_size == 0 || self.hand_size * player_count + 2 > crate::cards::DECK_SIZE {
            return Err(ConfigError::HandSize {
                hand_size: self.hand_size,
                players: player_count,
            });
        }
        Ok(())
    }
}

/// House rules consulted by the validator and the transition function.
///
/// Stored in every `GameState` so that a player's view can be validated
/// without access to the orchestrator's config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HouseRules {
    pub stacking_enabled: bool,
    pub draw_then_play_allowed: bool,
    pub missed_uno_penalty: u32,
}

impl Default for HouseRules {
    fn default() -> Self {
        GameConfig::default().house_rules()
    }
}
