//! Seeded random bot, the baseline opponent.
//!
//! Never misses an Uno call or a callout, prefers any card play over
//! drawing, and otherwise picks uniformly among the legal moves.

use async_trait::async_trait;

use super::{Agent, AgentError, Decision};
use crate::core::GameRng;
use crate::rules::{Move, PlayerView, RejectReason};

pub struct RandomAgent {
    name: String,
    rng: GameRng,
}

impl RandomAgent {
    pub fn new(name: impl Into<String>, rng: GameRng) -> Self {
        Self {
            name: name.into(),
            rng,
        }
    }

    /// Agent with a fixed seed.
    pub fn seeded(name: impl Into<String>, seed: u64) -> Self {
        Self::new(name, GameRng::new(seed))
    }

    fn choose(&mut self, legal: &[Move]) -> Option<Move> {
        if legal.contains(&Move::CallUno) {
            return Some(Move::CallUno);
        }
        let plays: Vec<Move> = legal
            .iter()
            .filter(|mv| matches!(mv, Move::PlayCard { .. }))
            .copied()
            .collect();
        if !plays.is_empty() {
            return self.rng.choose(&plays).copied();
        }
        self.rng.choose(legal).copied()
    }
}

#[async_trait]
impl Agent for RandomAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide(
        &mut self,
        view: &PlayerView,
        _feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError> {
        self.choose(&view.legal_moves)
            .map(Decision::clean)
            .ok_or(AgentError::NoLegalMove)
    }
}
