//! Single-game driver.
//!
//! Deals a game, then loops: build the current player's view, ask their
//! agent, validate, apply, check for a winner. Turns are strictly
//! sequential.
//!
//! Failures never escape as errors. Every way a game can end, including an
//! agent that gives up or a broken invariant, is folded into a
//! [`GameOutcome`] with a [`TerminationReason`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::agents::{Agent, AgentError};
use crate::core::{GameConfig, GameRng, GameState, PlayerId, PlayerMap};
use crate::rules::{validate, Move, RejectReason, RulesError, UnoEngine};

/// How a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminationReason {
    NormalWin,
    /// An agent kept proposing illegal moves, or could not answer at all.
    AgentExhaustedRetries,
    /// Broken invariant, panic, or cancellation.
    InternalError,
    /// `max_turns` moves were applied without a winner.
    TurnLimitReached,
}

/// Errors that abort a single game.
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Rules(#[from] RulesError),
    #[error("{player}'s agent failed: {source}")]
    Agent {
        player: PlayerId,
        #[source]
        source: AgentError,
    },
    #[error("{player} exhausted the retry budget, last rejection: {reason}")]
    RetriesExhausted {
        player: PlayerId,
        reason: RejectReason,
    },
    #[error("cancelled")]
    Cancelled,
    #[error("game task panicked: {0}")]
    Panicked(String),
}

impl GameError {
    /// The termination reason this error is reported as.
    #[must_use]
    pub fn termination(&self) -> TerminationReason {
        match self {
            GameError::Agent { .. } | GameError::RetriesExhausted { .. } => {
                TerminationReason::AgentExhaustedRetries
            }
            GameError::Rules(_) | GameError::Cancelled | GameError::Panicked(_) => {
                TerminationReason::InternalError
            }
        }
    }
}

/// Result of one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Position within a tournament; 0 for a standalone game.
    pub game_index: usize,
    pub seed: u64,
    /// Agent slot sitting at each seat.
    pub seats: Vec<usize>,
    /// Winning seat.
    pub winner: Option<PlayerId>,
    /// Moves applied.
    pub turn_count: u32,
    /// Failed decision attempts per seat.
    pub error_counts: PlayerMap<u32>,
    /// Fallback moves played per seat.
    pub fallback_counts: PlayerMap<u32>,
    pub termination: TerminationReason,
    /// Error message for abnormal endings.
    pub detail: Option<String>,
}

impl GameOutcome {
    /// An outcome for a game that never got to play a move.
    #[must_use]
    pub fn aborted(game_index: usize, seed: u64, seats: Vec<usize>, error: &GameError) -> Self {
        let player_count = seats.len().max(1);
        Self {
            game_index,
            seed,
            seats,
            winner: None,
            turn_count: 0,
            error_counts: PlayerMap::with_value(player_count, 0),
            fallback_counts: PlayerMap::with_value(player_count, 0),
            termination: error.termination(),
            detail: Some(error.to_string()),
        }
    }

    /// Agent slot of the winner.
    #[must_use]
    pub fn winner_slot(&self) -> Option<usize> {
        self.winner
            .and_then(|seat| self.seats.get(seat.index()).copied())
    }

    /// Whether the agent in `slot` won.
    #[must_use]
    pub fn is_winner(&self, slot: usize) -> bool {
        self.winner_slot() == Some(slot)
    }

    /// Failures charged to the agent in `slot`.
    #[must_use]
    pub fn errors_for_slot(&self, slot: usize) -> u32 {
        self.seat_of(slot)
            .map_or(0, |seat| self.error_counts[seat])
    }

    /// Fallbacks played by the agent in `slot`.
    #[must_use]
    pub fn fallbacks_for_slot(&self, slot: usize) -> u32 {
        self.seat_of(slot)
            .map_or(0, |seat| self.fallback_counts[seat])
    }

    fn seat_of(&self, slot: usize) -> Option<PlayerId> {
        self.seats
            .iter()
            .position(|&s| s == slot)
            .filter(|&seat| seat < self.error_counts.player_count())
            .map(|seat| PlayerId::new(seat as u8))
    }
}

/// One applied move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub turn: u32,
    pub player: PlayerId,
    pub mv: Move,
    /// State after the move.
    pub state: GameState,
}

/// Turn-by-turn record of a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTrace {
    pub seed: u64,
    /// State right after the deal.
    pub initial: Option<GameState>,
    pub steps: Vec<TraceStep>,
}

impl GameTrace {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            initial: None,
            steps: Vec::new(),
        }
    }

    /// Moves in order.
    pub fn moves(&self) -> impl Iterator<Item = (PlayerId, Move)> + '_ {
        self.steps.iter().map(|step| (step.player, step.mv))
    }

    #[must_use]
    pub fn final_state(&self) -> Option<&GameState> {
        self.steps
            .last()
            .map(|step| &step.state)
            .or(self.initial.as_ref())
    }
}

/// Runs games with a fixed configuration.
#[derive(Clone, Debug)]
pub struct GameRunner {
    config: GameConfig,
}

impl GameRunner {
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Play one game, seat `i` being `agents[i]`.
    pub async fn run(&self, agents: &mut [Box<dyn Agent>], seed: u64) -> GameOutcome {
        self.run_inner(agents, seed, None).await
    }

    /// Play one game and record every applied move.
    pub async fn run_traced(
        &self,
        agents: &mut [Box<dyn Agent>],
        seed: u64,
    ) -> (GameOutcome, GameTrace) {
        let mut trace = GameTrace::new(seed);
        let outcome = self.run_inner(agents, seed, Some(&mut trace)).await;
        (outcome, trace)
    }

    #[instrument(level = "debug", skip(self, agents, trace), fields(players = agents.len()))]
    async fn run_inner(
        &self,
        agents: &mut [Box<dyn Agent>],
        seed: u64,
        trace: Option<&mut GameTrace>,
    ) -> GameOutcome {
        let seats: Vec<usize> = (0..agents.len()).collect();
        let mut engine = UnoEngine::new(self.config.clone(), GameRng::new(seed));

        let state = match engine.new_game(agents.len()) {
            Ok(state) => state,
            Err(e) => {
                let error = GameError::from(e);
                tracing::error!(target: "uno.game", seed, error = %error, "could not deal");
                return GameOutcome::aborted(0, seed, seats, &error);
            }
        };

        let player_count = state.player_count();
        let mut table = Table {
            engine,
            state,
            retry_budget: self.config.retry_budget.max(1),
            max_turns: self.config.max_turns,
            errors: PlayerMap::with_value(player_count, 0),
            fallbacks: PlayerMap::with_value(player_count, 0),
            trace,
        };
        if let Some(trace) = table.trace.as_deref_mut() {
            trace.initial = Some(table.state.clone());
        }

        let result = table.play(agents).await;
        let (winner, termination, detail) = match result {
            Ok(Some(winner)) => (Some(winner), TerminationReason::NormalWin, None),
            Ok(None) => (None, TerminationReason::TurnLimitReached, None),
            Err(error) => {
                tracing::warn!(target: "uno.game", seed, error = %error, "game aborted");
                (None, error.termination(), Some(error.to_string()))
            }
        };

        tracing::info!(
            target: "uno.game",
            seed,
            winner = ?winner,
            turns = table.state.turn_number(),
            termination = ?termination,
            "game finished"
        );

        GameOutcome {
            game_index: 0,
            seed,
            seats,
            winner,
            turn_count: table.state.turn_number(),
            error_counts: table.errors,
            fallback_counts: table.fallbacks,
            termination,
            detail,
        }
    }
}

/// Play one game seeded from `config.random_seed`, or from entropy if unset.
pub async fn run_game(agents: &mut [Box<dyn Agent>], config: &GameConfig) -> GameOutcome {
    let seed = config
        .random_seed
        .unwrap_or_else(|| GameRng::from_entropy().seed());
    GameRunner::new(config.clone()).run(agents, seed).await
}

/// Mutable state of a game in progress.
struct Table<'t> {
    engine: UnoEngine,
    state: GameState,
    retry_budget: u32,
    max_turns: u32,
    errors: PlayerMap<u32>,
    fallbacks: PlayerMap<u32>,
    trace: Option<&'t mut GameTrace>,
}

impl Table<'_> {
    /// Ok(Some(winner)), or Ok(None) on reaching the turn limit.
    async fn play(&mut self, agents: &mut [Box<dyn Agent>]) -> Result<Option<PlayerId>, GameError> {
        loop {
            if let Some(winner) = self.engine.is_terminal(&self.state) {
                return Ok(Some(winner));
            }
            if self.state.turn_number() >= self.max_turns {
                return Ok(None);
            }

            let player = self.state.current_player();
            let agent = agents.get_mut(player.index()).ok_or_else(|| {
                RulesError::InvariantViolation(format!("no agent seated at {player}"))
            })?;

            let mv = self.decide(agent.as_mut(), player).await?;
            let applied = self.engine.apply(&mut self.state, player, &mv)?;

            if let Some(trace) = self.trace.as_deref_mut() {
                trace.steps.push(TraceStep {
                    turn: self.state.turn_number(),
                    player,
                    mv: applied,
                    state: self.state.clone(),
                });
            }
        }
    }

    /// Ask `agent` for a legal move, re-asking with feedback on rejection.
    async fn decide(&mut self, agent: &mut dyn Agent, player: PlayerId) -> Result<Move, GameError> {
        let view = self.state.view(player);
        let mut feedback = None;

        for _ in 0..self.retry_budget {
            let decision = agent
                .decide(&view, feedback)
                .await
                .map_err(|source| GameError::Agent { player, source })?;

            self.errors[player] += decision.failures;
            if decision.fell_back {
                self.fallbacks[player] += 1;
            }

            match validate(&self.state, player, &decision.mv) {
                Ok(mv) => return Ok(mv),
                Err(reason) => {
                    self.errors[player] += 1;
                    tracing::debug!(
                        target: "uno.game",
                        agent = agent.name(),
                        player = %player,
                        mv = %decision.mv,
                        reason = %reason,
                        "move rejected"
                    );
                    feedback = Some(reason);
                }
            }
        }

        Err(GameError::RetriesExhausted {
            player,
            reason: feedback.unwrap_or(RejectReason::InvalidPhaseForMove),
        })
    }
}
