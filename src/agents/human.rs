//! Human agent.
//!
//! Shows the player their view with numbered legal moves and waits for a
//! reply, with no timeout. A reply is either a grammar command or the
//! number of a listed move. Unreadable or illegal replies are re-prompted
//! with the reason; only a closed input source ends the wait.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::grammar::parse_reply;
use super::prompt::{render_view, REPLY_FORMAT};
use super::{Agent, AgentError, Decision};
use crate::rules::{validate, Move, PlayerView, RejectReason};

/// Where a human's replies come from.
#[async_trait]
pub trait HumanInput: Send {
    /// Show `rendering` and wait for one reply. `None` once the source is closed.
    async fn prompt_for_move(&mut self, rendering: &str) -> Option<String>;
}

/// `HumanInput` over a pair of channels: renderings go out, replies come in.
pub struct ChannelInput {
    prompts: mpsc::UnboundedSender<String>,
    replies: mpsc::Receiver<String>,
}

impl ChannelInput {
    /// Returns the input plus the prompt receiver and reply sender for the UI side.
    pub fn new(
        buffer: usize,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<String>,
        mpsc::Sender<String>,
    ) {
        let (prompt_tx, prompt_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = mpsc::channel(buffer.max(1));
        (
            Self {
                prompts: prompt_tx,
                replies: reply_rx,
            },
            prompt_rx,
            reply_tx,
        )
    }
}

#[async_trait]
impl HumanInput for ChannelInput {
    async fn prompt_for_move(&mut self, rendering: &str) -> Option<String> {
        // A UI that stopped reading prompts may still be sending replies.
        let _ = self.prompts.send(rendering.to_string());
        self.replies.recv().await
    }
}

/// Agent driven by a person.
pub struct HumanAgent<I> {
    name: String,
    input: I,
}

impl<I: HumanInput> HumanAgent<I> {
    pub fn new(name: impl Into<String>, input: I) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }
}

/// Read a reply as a move number or a command, and check it.
fn interpret(reply: &str, view: &PlayerView) -> Result<Move, String> {
    if let Ok(index) = reply.trim().parse::<usize>() {
        return view
            .legal_moves
            .get(index)
            .copied()
            .ok_or_else(|| format!("{index} is not one of the listed moves"));
    }
    let mv = parse_reply(reply).map_err(|e| e.to_string())?;
    validate(view, view.viewer, &mv).map_err(|reason| format!("`{mv}`: {reason}"))
}

fn render(view: &PlayerView, problem: Option<&str>) -> String {
    let mut out = render_view(view);
    out.push_str("\n=== Legal moves ===\n");
    for (index, mv) in view.legal_moves.iter().enumerate() {
        out.push_str(&format!("  {index}: {mv}\n"));
    }
    if let Some(problem) = problem {
        out.push_str(&format!("\nTry again: {problem}\n"));
    }
    out.push_str(&format!("\nEnter a number or {REPLY_FORMAT}\n"));
    out
}

#[async_trait]
impl<I: HumanInput> Agent for HumanAgent<I> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn decide(
        &mut self,
        view: &PlayerView,
        feedback: Option<RejectReason>,
    ) -> Result<Decision, AgentError> {
        if view.legal_moves.is_empty() {
            return Err(AgentError::NoLegalMove);
        }

        let mut problem = feedback.map(|reason| reason.to_string());
        let mut failures = 0;
        loop {
            let rendering = render(view, problem.as_deref());
            let reply = self
                .input
                .prompt_for_move(&rendering)
                .await
                .ok_or(AgentError::InputClosed)?;

            match interpret(&reply, view) {
                Ok(mv) => {
                    return Ok(Decision {
                        mv,
                        failures,
                        fell_back: false,
                    })
                }
                Err(reason) => {
                    failures += 1;
                    tracing::debug!(
                        target: "uno.agent",
                        agent = %self.name,
                        %reason,
                        "re-prompting human"
                    );
                    problem = Some(reason);
                }
            }
        }
    }
}
