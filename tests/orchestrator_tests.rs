//! Whole games and tournaments driven end to end.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use uno_arena::agents::{
    fallback_move, Agent, AgentError, Backend, Decision, DecisionProvider, LlmAgent, ModelConfig,
    ProviderError, RandomAgent,
};
use uno_arena::core::{GameConfig, GameEvent, PlayerId};
use uno_arena::orchestrator::{
    run_game, run_tournament, AgentFactory, CancelSignal, GameRunner, TerminationReason,
};
use uno_arena::rules::{Move, PlayerView, RejectReason};

fn bots(count: usize, seed: u64) -> Vec<Box<dyn Agent>> {
    (0..count)
        .map(|slot| {
            Box::new(RandomAgent::seeded(format!("bot-{slot}"), seed + slot as u64))
                as Box<dyn Agent>
        })
        .collect()
}

fn random_factory() -> AgentFactory {
    Arc::new(|slot: usize, seed: u64| -> Box<dyn Agent> {
        Box::new(RandomAgent::seeded(format!("bot-{slot}"), seed ^ slot as u64))
    })
}

/// Always answers with a move that is never legal at the start of a turn.
struct Stubborn;

#[async_trait]
impl Agent for Stubborn {
    fn name(&self) -> &str {
        "stubborn"
    }

    async fn decide(
        &mut self,
        _view: &PlayerView,
        _feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError> {
        Ok(Decision::clean(Move::ChallengeDrawFour { challenge: true }))
    }
}

struct Disconnected;

#[async_trait]
impl Agent for Disconnected {
    fn name(&self) -> &str {
        "disconnected"
    }

    async fn decide(
        &mut self,
        _view: &PlayerView,
        _feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError> {
        Err(AgentError::InputClosed)
    }
}

struct Panicky;

#[async_trait]
impl Agent for Panicky {
    fn name(&self) -> &str {
        "panicky"
    }

    async fn decide(
        &mut self,
        _view: &PlayerView,
        _feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError> {
        panic!("boom")
    }
}

struct Hanging;

#[async_trait]
impl Agent for Hanging {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn decide(
        &mut self,
        _view: &PlayerView,
        _feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError> {
        std::future::pending::<Result<Decision, AgentError>>().await
    }
}

/// Draws whenever drawing is legal, so cards pile up in hands.
struct Hoarder;

#[async_trait]
impl Agent for Hoarder {
    fn name(&self) -> &str {
        "hoarder"
    }

    async fn decide(
        &mut self,
        view: &PlayerView,
        _feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError> {
        if view.legal_moves.contains(&Move::DrawCard) {
            return Ok(Decision::clean(Move::DrawCard));
        }
        fallback_move(&view.legal_moves)
            .map(Decision::clean)
            .ok_or(AgentError::NoLegalMove)
    }
}

/// Random play that records how many decisions are in progress at once.
struct Gauged {
    inner: RandomAgent,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

#[async_trait]
impl Agent for Gauged {
    fn name(&self) -> &str {
        "gauged"
    }

    async fn decide(
        &mut self,
        view: &PlayerView,
        feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.decide(view, feedback).await
    }
}

struct Gibberish;

#[async_trait]
impl DecisionProvider for Gibberish {
    async fn complete(
        &self,
        _prompt: &str,
        _model: &ModelConfig,
    ) -> Result<String, ProviderError> {
        Ok("Let me think about this carefully...".to_string())
    }
}

#[tokio::test]
async fn test_random_game_finishes() {
    let runner = GameRunner::new(GameConfig::default());
    let mut agents = bots(3, 1);

    let outcome = runner.run(&mut agents, 2024).await;

    assert!(matches!(
        outcome.termination,
        TerminationReason::NormalWin | TerminationReason::TurnLimitReached
    ));
    assert_eq!(outcome.winner.is_some(), outcome.termination == TerminationReason::NormalWin);
    assert!(outcome.turn_count > 0);
    assert_eq!(outcome.error_counts.values().sum::<u32>(), 0);
    assert_eq!(outcome.seats, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_same_seed_same_trace() {
    let runner = GameRunner::new(GameConfig::default());

    let (first, trace_a) = runner.run_traced(&mut bots(4, 7), 31).await;
    let (second, trace_b) = runner.run_traced(&mut bots(4, 7), 31).await;

    assert_eq!(first, second);
    assert_eq!(trace_a, trace_b);
    assert_eq!(trace_a.steps.len() as u32, first.turn_count);
    assert_eq!(
        trace_a.final_state().and_then(|s| s.winner()),
        first.winner
    );
}

#[tokio::test]
async fn test_run_game_uses_configured_seed() {
    let config = GameConfig::default().with_seed(5);

    let outcome = run_game(&mut bots(2, 0), &config).await;

    assert_eq!(outcome.seed, 5);
}

#[tokio::test]
async fn test_turn_limit() {
    let runner = GameRunner::new(GameConfig::default().with_max_turns(5));

    let outcome = runner.run(&mut bots(2, 3), 9).await;

    assert_eq!(outcome.termination, TerminationReason::TurnLimitReached);
    assert_eq!(outcome.turn_count, 5);
    assert_eq!(outcome.winner, None);
}

#[tokio::test]
async fn test_repeated_illegal_moves_end_the_game() {
    let runner = GameRunner::new(GameConfig::default().with_retry_budget(3));
    let mut agents: Vec<Box<dyn Agent>> =
        vec![Box::new(Stubborn), Box::new(RandomAgent::seeded("bot", 1))];

    let outcome = runner.run(&mut agents, 4).await;

    assert_eq!(outcome.termination, TerminationReason::AgentExhaustedRetries);
    assert_eq!(outcome.error_counts[PlayerId::new(0)], 3);
    assert_eq!(outcome.turn_count, 0);
    assert!(outcome.detail.unwrap().contains("player_0"));
}

#[tokio::test]
async fn test_agent_error_ends_the_game() {
    let runner = GameRunner::new(GameConfig::default());
    let mut agents: Vec<Box<dyn Agent>> =
        vec![Box::new(Disconnected), Box::new(RandomAgent::seeded("bot", 1))];

    let outcome = runner.run(&mut agents, 4).await;

    assert_eq!(outcome.termination, TerminationReason::AgentExhaustedRetries);
    assert!(outcome.detail.unwrap().contains("input source closed"));
}

#[tokio::test]
async fn test_failing_llm_agent_still_finishes() {
    let config = GameConfig::default().with_retry_budget(2).with_max_turns(60);
    let llm = LlmAgent::from_config(
        Arc::new(Gibberish),
        ModelConfig::new(Backend::OpenRouter, "openai/gpt-4o-mini"),
        &config,
    );
    let mut agents: Vec<Box<dyn Agent>> =
        vec![Box::new(llm), Box::new(RandomAgent::seeded("bot", 8))];

    let outcome = GameRunner::new(config).run(&mut agents, 12).await;

    assert_ne!(outcome.termination, TerminationReason::AgentExhaustedRetries);
    assert_ne!(outcome.termination, TerminationReason::InternalError);
    let llm_seat = PlayerId::new(0);
    assert!(outcome.fallback_counts[llm_seat] > 0);
    // Every decision burns the whole budget before falling back.
    assert_eq!(outcome.error_counts[llm_seat], 2 * outcome.fallback_counts[llm_seat]);
}

#[tokio::test]
async fn test_tournament_tallies_every_game() {
    let config = GameConfig::default().with_seed(77).with_concurrency(3);

    let summary = run_tournament(random_factory(), 2, 6, config, CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(summary.games_played, 6);
    assert_eq!(summary.outcomes.len(), 6);
    let decided = summary.count(TerminationReason::NormalWin);
    assert_eq!(summary.wins.iter().sum::<u32>(), decided);
    assert_eq!(decided + summary.count(TerminationReason::TurnLimitReached), 6);
    for (index, outcome) in summary.outcomes.iter().enumerate() {
        assert_eq!(outcome.game_index, index);
        // Seats rotate: the opening seat alternates between the two slots.
        assert_eq!(outcome.seats[0], index % 2);
    }
}

#[tokio::test]
async fn test_tournament_is_reproducible() {
    let config = GameConfig::default().with_seed(3).with_concurrency(4);

    let a = run_tournament(random_factory(), 3, 5, config.clone(), CancelSignal::new())
        .await
        .unwrap();
    let b = run_tournament(random_factory(), 3, 5, config, CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(a.outcomes, b.outcomes);
    assert_eq!(a.wins, b.wins);
}

#[tokio::test]
async fn test_panicking_games_are_contained() {
    let factory: AgentFactory =
        Arc::new(|_slot: usize, _seed: u64| -> Box<dyn Agent> { Box::new(Panicky) });

    let summary = run_tournament(factory, 2, 3, GameConfig::default(), CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(summary.games_played, 3);
    assert_eq!(summary.count(TerminationReason::InternalError), 3);
    for outcome in &summary.outcomes {
        assert!(outcome.detail.as_deref().unwrap().contains("boom"));
    }
}

#[tokio::test]
async fn test_cancel_before_start() {
    let cancel = CancelSignal::new();
    cancel.cancel();

    let summary = run_tournament(random_factory(), 2, 4, GameConfig::default(), cancel)
        .await
        .unwrap();

    assert_eq!(summary.games_played, 4);
    assert_eq!(summary.count(TerminationReason::InternalError), 4);
    assert!(summary
        .outcomes
        .iter()
        .all(|o| o.detail.as_deref() == Some("cancelled")));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_abandons_running_games() {
    let factory: AgentFactory =
        Arc::new(|_slot: usize, _seed: u64| -> Box<dyn Agent> { Box::new(Hanging) });
    let cancel = CancelSignal::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let config = GameConfig::default().with_concurrency(2);
    let summary = run_tournament(factory, 2, 3, config, cancel).await.unwrap();

    assert_eq!(summary.games_played, 3);
    assert_eq!(summary.count(TerminationReason::InternalError), 3);
    assert!(summary
        .outcomes
        .iter()
        .all(|o| o.detail.as_deref() == Some("cancelled")));
}

#[tokio::test]
async fn test_tournament_rejects_bad_player_count() {
    let result =
        run_tournament(random_factory(), 1, 2, GameConfig::default(), CancelSignal::new()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_hoarders_outlast_the_deck() {
    let config = GameConfig::default()
        .with_draw_then_play(false)
        .with_max_turns(200);
    let runner = GameRunner::new(config);
    let mut agents: Vec<Box<dyn Agent>> = vec![Box::new(Hoarder), Box::new(Hoarder)];

    let (outcome, trace) = runner.run_traced(&mut agents, 6).await;

    // Nobody ever plays, so the deck runs dry long before the turn limit.
    assert_eq!(outcome.termination, TerminationReason::TurnLimitReached);
    let state = trace.final_state().unwrap();
    assert_eq!(state.deck().available(), 0);
    assert_eq!(state.hand_sizes().values().sum::<usize>(), 107);
    assert!(state
        .history()
        .iter()
        .any(|event| matches!(event, GameEvent::Passed { .. })));
}

#[tokio::test]
async fn test_hoarder_against_random_never_errors() {
    let config = GameConfig::default().with_draw_then_play(false);
    let runner = GameRunner::new(config);

    for seed in 0..20 {
        let mut agents: Vec<Box<dyn Agent>> =
            vec![Box::new(Hoarder), Box::new(RandomAgent::seeded("bot", seed))];
        let outcome = runner.run(&mut agents, seed).await;
        assert_ne!(
            outcome.termination,
            TerminationReason::InternalError,
            "seed {seed}: {:?}",
            outcome.detail
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_tournament_respects_concurrency_limit() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let factory: AgentFactory = {
        let in_flight = in_flight.clone();
        let peak = peak.clone();
        Arc::new(move |slot: usize, seed: u64| -> Box<dyn Agent> {
            Box::new(Gauged {
                inner: RandomAgent::seeded(format!("bot-{slot}"), seed ^ slot as u64),
                in_flight: in_flight.clone(),
                peak: peak.clone(),
            })
        })
    };
    let config = GameConfig::default()
        .with_seed(21)
        .with_concurrency(3)
        .with_max_turns(20);

    let summary = run_tournament(factory, 2, 8, config, CancelSignal::new())
        .await
        .unwrap();

    assert_eq!(summary.games_played, 8);
    let peak = peak.load(Ordering::SeqCst);
    // Turns within a game are sequential, so each decision in flight is its own game.
    assert!(peak <= 3, "{peak} games ran at once");
    assert!(peak > 1, "games never overlapped");
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}
