//! Many independent games with bounded parallelism.
//!
//! Each game is spawned onto the runtime under a semaphore permit and gets
//! its own agents, deck and seed. Results flow back through a `JoinSet`
//! and are folded into a [`TournamentSummary`] by the collecting loop
//! alone, so no lock guards the tallies.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

use super::game::{GameError, GameOutcome, GameRunner, TerminationReason};
use crate::agents::Agent;
use crate::core::{ConfigError, GameConfig, GameRng};

/// Builds a fresh agent for `(slot, game_seed)`.
pub type AgentFactory = Arc<dyn Fn(usize, u64) -> Box<dyn Agent> + Send + Sync>;

/// Errors that prevent a tournament from starting.
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Tournament-wide stop request.
///
/// Cloning shares the signal. Once cancelled it stays cancelled.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelSignal {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate over all dispatched games.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentSummary {
    /// Number of agent slots.
    pub slots: usize,
    pub games_played: usize,
    /// Wins per agent slot.
    pub wins: Vec<u32>,
    /// Failed decision attempts per agent slot.
    pub errors: Vec<u32>,
    /// Fallback moves per agent slot.
    pub fallbacks: Vec<u32>,
    pub terminations: FxHashMap<TerminationReason, u32>,
    /// Every outcome, ordered by game index.
    pub outcomes: Vec<GameOutcome>,
}

impl TournamentSummary {
    #[must_use]
    pub fn new(slots: usize) -> Self {
        Self {
            slots,
            wins: vec![0; slots],
            errors: vec![0; slots],
            fallbacks: vec![0; slots],
            ..Self::default()
        }
    }

    /// Fold one finished game into the tallies.
    pub fn record(&mut self, outcome: GameOutcome) {
        self.games_played += 1;
        for slot in 0..self.slots {
            self.errors[slot] += outcome.errors_for_slot(slot);
            self.fallbacks[slot] += outcome.fallbacks_for_slot(slot);
        }
        if let Some(slot) = outcome.winner_slot() {
            if let Some(wins) = self.wins.get_mut(slot) {
                *wins += 1;
            }
        }
        *self.terminations.entry(outcome.termination).or_default() += 1;

        let at = self
            .outcomes
            .partition_point(|o| o.game_index < outcome.game_index);
        self.outcomes.insert(at, outcome);
    }

    /// Games that ended with `reason`.
    #[must_use]
    pub fn count(&self, reason: TerminationReason) -> u32 {
        self.terminations.get(&reason).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_errors(&self) -> u32 {
        self.errors.iter().sum()
    }

    /// Share of played games won by `slot`.
    #[must_use]
    pub fn win_rate(&self, slot: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        f64::from(self.wins.get(slot).copied().unwrap_or(0)) / self.games_played as f64
    }
}

/// Seat→slot assignment for game `game_index`.
///
/// With rotation, the slot that opens the game moves one seat each game.
#[must_use]
pub fn seating(slots: usize, game_index: usize, rotate: bool) -> Vec<usize> {
    let shift = if rotate && slots > 0 {
        game_index % slots
    } else {
        0
    };
    (0..slots).map(|seat| (seat + shift) % slots).collect()
}

/// Run `games` games among `slots` agents built by `factory`.
///
/// Up to `config.concurrency` games run at once. Per-game seeds are forked
/// from `config.random_seed` when set. After `cancel` fires no new game is
/// started; games still running are abandoned and every game, started or
/// not, is recorded as an `InternalError`.
pub async fn run_tournament(
    factory: AgentFactory,
    slots: usize,
    games: usize,
    config: GameConfig,
    cancel: CancelSignal,
) -> Result<TournamentSummary, TournamentError> {
    config.validate_for(slots)?;

    let mut seeds = match config.random_seed {
        Some(seed) => GameRng::new(seed),
        None => GameRng::from_entropy(),
    };
    let permits = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let runner = GameRunner::new(config.clone());
    let mut tasks: JoinSet<GameOutcome> = JoinSet::new();
    let mut summary = TournamentSummary::new(slots);

    tracing::info!(
        target: "uno.tournament",
        games,
        slots,
        concurrency = config.concurrency,
        "tournament starting"
    );

    for game_index in 0..games {
        let seed = seeds.fork().seed();
        let seats = seating(slots, game_index, config.rotate_seats);

        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            permit = permits.clone().acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            summary.record(GameOutcome::aborted(game_index, seed, seats, &GameError::Cancelled));
            continue;
        };

        let agents: Vec<Box<dyn Agent>> =
            seats.iter().map(|&slot| factory(slot, seed)).collect();
        tasks.spawn(play_one(
            runner.clone(),
            agents,
            game_index,
            seed,
            seats,
            cancel.clone(),
            permit,
        ));
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => summary.record(outcome),
            // `play_one` catches panics itself; this only fires if it was aborted.
            Err(e) => tracing::error!(target: "uno.tournament", error = %e, "game task lost"),
        }
    }

    tracing::info!(
        target: "uno.tournament",
        games = summary.games_played,
        wins = ?summary.wins,
        errors = summary.total_errors(),
        "tournament finished"
    );
    Ok(summary)
}

/// One game, with panics and cancellation folded into its outcome.
async fn play_one(
    runner: GameRunner,
    mut agents: Vec<Box<dyn Agent>>,
    game_index: usize,
    seed: u64,
    seats: Vec<usize>,
    cancel: CancelSignal,
    _permit: tokio::sync::OwnedSemaphorePermit,
) -> GameOutcome {
    let game = tokio::spawn(async move { runner.run(&mut agents, seed).await });
    let abort = game.abort_handle();

    let result = tokio::select! {
        joined = game => joined.map_err(|e| {
            if e.is_panic() {
                GameError::Panicked(panic_message(e.into_panic()))
            } else {
                GameError::Cancelled
            }
        }),
        () = cancel.cancelled() => {
            abort.abort();
            Err(GameError::Cancelled)
        }
    };

    match result {
        Ok(mut outcome) => {
            // The runner numbers seats from zero; put the tournament's view back.
            outcome.game_index = game_index;
            outcome.seats = seats;
            outcome
        }
        Err(error) => {
            tracing::warn!(
                target: "uno.tournament",
                game_index,
                seed,
                error = %error,
                "game abandoned"
            );
            GameOutcome::aborted(game_index, seed, seats, &error)
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
