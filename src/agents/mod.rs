//! Agents: anything that can choose a move from a `PlayerView`.
//!
//! ## Key Types
//!
//! - `Agent`: the async decision capability the orchestrator drives
//! - `Decision`: a chosen move plus the failures it took to get there
//! - `LlmAgent`: prompts a `DecisionProvider`, retries, then falls back
//! - `HumanAgent`: asks a `HumanInput` source until it gets a legal move
//! - `RandomAgent`: seeded baseline bot
//! - `AgentSpec`: `human | llm | llm:<model> | random` from a command line
//!
//! Agents hold no rules state. Everything they know arrives in the view.

pub mod grammar;
pub mod human;
pub mod llm;
pub mod prompt;
pub mod provider;
pub mod random;

use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::{Move, PlayerView, RejectReason};

pub use grammar::{parse_reply, ParseError};
pub use human::{ChannelInput, HumanAgent, HumanInput};
pub use llm::LlmAgent;
pub use provider::{Backend, DecisionProvider, ModelConfig, ProviderError, DEFAULT_MODEL};
pub use random::RandomAgent;

/// One failed decision attempt.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecisionFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("could not read reply: {0}")]
    Parse(#[from] ParseError),
    #[error("illegal move: {0}")]
    Rejected(#[from] RejectReason),
}

/// Errors that end an agent's participation in a game.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("input source closed")]
    InputClosed,
    #[error("agent unavailable: {0}")]
    Unavailable(String),
    #[error("asked to decide with no legal move available")]
    NoLegalMove,
}

/// A chosen move and the cost of choosing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decision {
    pub mv: Move,
    /// Failed attempts before `mv` was settled on.
    pub failures: u32,
    /// Whether `mv` is the deterministic fallback rather than the agent's pick.
    pub fell_back: bool,
}

impl Decision {
    /// A first-try decision.
    #[must_use]
    pub fn clean(mv: Move) -> Self {
        Self {
            mv,
            failures: 0,
            fell_back: false,
        }
    }
}

/// The decision capability.
///
/// `feedback` is set when the orchestrator refused this agent's previous
/// answer for the same turn.
#[async_trait]
pub trait Agent: Send {
    fn name(&self) -> &str;

    async fn decide(
        &mut self,
        view: &PlayerView,
        feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError>;
}

/// Deterministic fallback: the first card play by command text, else
/// `DRAW`, else declining an open challenge.
///
/// ```
/// use uno_arena::agents::fallback_move;
/// use uno_arena::cards::{Card, Color};
/// use uno_arena::rules::Move;
///
/// let legal = [
///     Move::play(Card::number(Color::Red, 4)),
///     Move::play(Card::number(Color::Blue, 4)),
///     Move::DrawCard,
/// ];
/// assert_eq!(fallback_move(&legal), Some(Move::play(Card::number(Color::Blue, 4))));
/// assert_eq!(fallback_move(&[Move::DrawCard, Move::CallUno]), Some(Move::DrawCard));
/// ```
#[must_use]
pub fn fallback_move(legal: &[Move]) -> Option<Move> {
    let first_play = legal
        .iter()
        .filter(|mv| matches!(mv, Move::PlayCard { .. }))
        .min_by_key(|mv| mv.to_string());

    first_play
        .or_else(|| legal.iter().find(|mv| **mv == Move::DrawCard))
        .or_else(|| {
            legal
                .iter()
                .find(|mv| **mv == Move::ChallengeDrawFour { challenge: false })
        })
        .copied()
}

/// Agent kind as written on a command line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentSpec {
    Human,
    /// `None` uses the configured default model.
    Llm { model: Option<String> },
    Random,
}

/// Unrecognized agent spec.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown agent `{0}` (expected human, llm, llm:<model> or random)")]
pub struct AgentSpecError(pub String);

impl FromStr for AgentSpec {
    type Err = AgentSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (kind, model) = match trimmed.split_once(':') {
            Some((kind, model)) => (kind, Some(model.trim())),
            None => (trimmed, None),
        };

        match (kind.to_ascii_lowercase().as_str(), model) {
            ("human", None) => Ok(AgentSpec::Human),
            ("random", None) => Ok(AgentSpec::Random),
            ("llm", None) => Ok(AgentSpec::Llm { model: None }),
            ("llm", Some(model)) if !model.is_empty() => Ok(AgentSpec::Llm {
                model: Some(model.to_string()),
            }),
            _ => Err(AgentSpecError(trimmed.to_string())),
        }
    }
}

impl AgentSpec {
    /// Parse a comma-separated list such as `llm,human,llm:llama3`.
    pub fn parse_list(list: &str) -> Result<Vec<AgentSpec>, AgentSpecError> {
        list.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Color};

    #[test]
    fn test_fallback_prefers_lexicographic_play() {
        let legal = [
            Move::play(Card::number(Color::Yellow, 1)),
            Move::play_wild(Card::wild(), Color::Red),
            Move::play_wild(Card::wild(), Color::Blue),
            Move::DrawCard,
        ];
        assert_eq!(
            fallback_move(&legal),
            Some(Move::play_wild(Card::wild(), Color::Blue))
        );
    }

    #[test]
    fn test_fallback_without_plays() {
        let challenge = [
            Move::ChallengeDrawFour { challenge: true },
            Move::ChallengeDrawFour { challenge: false },
        ];
        assert_eq!(
            fallback_move(&challenge),
            Some(Move::ChallengeDrawFour { challenge: false })
        );
        assert_eq!(fallback_move(&[]), None);
    }

    #[test]
    fn test_agent_spec_parsing() {
        assert_eq!("human".parse::<AgentSpec>(), Ok(AgentSpec::Human));
        assert_eq!(" LLM ".parse::<AgentSpec>(), Ok(AgentSpec::Llm { model: None }));
        assert_eq!(
            "llm:meta-llama/llama-3-8b-instruct".parse::<AgentSpec>(),
            Ok(AgentSpec::Llm {
                model: Some("meta-llama/llama-3-8b-instruct".to_string())
            })
        );
        assert_eq!("random".parse::<AgentSpec>(), Ok(AgentSpec::Random));
        assert!("robot".parse::<AgentSpec>().is_err());
        assert!("llm:".parse::<AgentSpec>().is_err());
        assert!("human:bob".parse::<AgentSpec>().is_err());
    }

    #[test]
    fn test_agent_spec_list() {
        let specs = AgentSpec::parse_list("llm, human,,random").unwrap();
        assert_eq!(
            specs,
            vec![
                AgentSpec::Llm { model: None },
                AgentSpec::Human,
                AgentSpec::Random
            ]
        );
        assert!(AgentSpec::parse_list("llm,robot").is_err());
    }
}
