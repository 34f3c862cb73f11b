//! LLM-backed agent.
//!
//! Each decision is a bounded loop of attempts. An attempt renders the
//! prompt, calls the provider under a timeout, parses the reply and
//! validates it against the agent's own view. Any failure is fed back into
//! the next prompt. When the budget is spent the agent plays
//! [`fallback_move`], so a game always moves forward.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::grammar::parse_reply;
use super::prompt::render_prompt;
use super::provider::{DecisionProvider, ModelConfig, ProviderError};
use super::{fallback_move, Agent, AgentError, Decision, DecisionFailure};
use crate::core::GameConfig;
use crate::rules::{validate, Move, PlayerView, RejectReason};

/// Agent that asks a language model for each move.
pub struct LlmAgent {
    name: String,
    provider: Arc<dyn DecisionProvider>,
    model: ModelConfig,
    retry_budget: u32,
    timeout: Duration,
}

impl LlmAgent {
    /// Agent with the default retry budget (3) and timeout (30 s).
    pub fn new(provider: Arc<dyn DecisionProvider>, model: ModelConfig) -> Self {
        let defaults = GameConfig::default();
        Self {
            name: format!("llm-{}", model.model),
            provider,
            model,
            retry_budget: defaults.retry_budget,
            timeout: defaults.decision_timeout,
        }
    }

    /// Agent using the retry budget and timeout from `config`.
    pub fn from_config(
        provider: Arc<dyn DecisionProvider>,
        model: ModelConfig,
        config: &GameConfig,
    ) -> Self {
        Self::new(provider, model)
            .with_retry_budget(config.retry_budget)
            .with_timeout(config.decision_timeout)
    }

    /// Total attempts per decision. Clamped to at least one.
    pub fn with_retry_budget(mut self, attempts: u32) -> Self {
        self.retry_budget = attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn model(&self) -> &ModelConfig {
        &self.model
    }

    /// One prompt/parse/validate round trip.
    async fn attempt(&self, view: &PlayerView, prompt: &str) -> Result<Move, DecisionFailure> {
        let reply = tokio::time::timeout(self.timeout, self.provider.complete(prompt, &self.model))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))??;

        let mv = parse_reply(&reply)?;
        Ok(validate(view, view.viewer, &mv)?)
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide(
        &mut self,
        view: &PlayerView,
        feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError> {
        let mut last_failure = feedback.map(|reason| DecisionFailure::Rejected(reason).to_string());
        let mut failures = 0;

        for attempt in 1..=self.retry_budget {
            let prompt = render_prompt(view, last_failure.as_deref());
            match self.attempt(view, &prompt).await {
                Ok(mv) => {
                    return Ok(Decision {
                        mv,
                        failures,
                        fell_back: false,
                    })
                }
                Err(failure) => {
                    failures += 1;
                    tracing::warn!(
                        target: "uno.agent",
                        agent = %self.name,
                        player = %view.viewer,
                        attempt,
                        budget = self.retry_budget,
                        error = %failure,
                        "decision attempt failed"
                    );
                    last_failure = Some(failure.to_string());
                }
            }
        }

        let mv = fallback_move(&view.legal_moves).ok_or(AgentError::NoLegalMove)?;
        tracing::warn!(
            target: "uno.agent",
            agent = %self.name,
            player = %view.viewer,
            fallback = %mv,
            "retry budget exhausted, playing fallback"
        );
        Ok(Decision {
            mv,
            failures,
            fell_back: true,
        })
    }
}
