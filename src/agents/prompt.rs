//! Text rendering of a `PlayerView` for agents.
//!
//! The rendering is sectioned (`=== Your hand ===`, `=== Top card ===`, ...)
//! and ends with the legal moves written in the reply grammar, so a model
//! can copy one line verbatim.

use std::fmt::Write;

use crate::core::TurnPhase;
use crate::rules::PlayerView;

/// Reply format reminder appended to every prompt.
pub const REPLY_FORMAT: &str = "PLAY <card> [<color>] | DRAW | UNO | CHALLENGE YES|NO";

/// Describe the table as `view.viewer` sees it.
#[must_use]
pub fn render_view(view: &PlayerView) -> String {
    let mut out = String::new();

    section(&mut out, "Your hand");
    let hand: Vec<String> = view.hand.iter().map(ToString::to_string).collect();
    let _ = writeln!(out, "{}", hand.join(" "));

    section(&mut out, "Top card");
    match view.top_card {
        Some(card) => {
            let _ = writeln!(out, "{card}");
        }
        None => out.push_str("none\n"),
    }

    section(&mut out, "Color to match");
    let _ = writeln!(out, "{}", view.active_color.name().to_ascii_uppercase());

    section(&mut out, "Other players");
    for (player, count) in view.hand_counts.iter() {
        if player != view.viewer {
            let noun = if *count == 1 { "card" } else { "cards" };
            let _ = writeln!(out, "  {player}: {count} {noun}");
        }
    }

    section(&mut out, "Direction");
    let _ = writeln!(out, "{}", view.direction);

    section(&mut out, "Pending draws");
    let _ = writeln!(out, "{}", view.pending_draw);

    if !view.recent_events.is_empty() {
        section(&mut out, "Recent events");
        for event in &view.recent_events {
            let _ = writeln!(out, "  {event}");
        }
    }

    if let Some(card) = view.drawn_card {
        let _ = writeln!(
            out,
            "\nYou just drew {card}. PLAY it now, or DRAW to keep it and end your turn."
        );
    }
    if let Some(offender) = view.missed_uno.filter(|_| view.can_call_out()) {
        let _ = writeln!(
            out,
            "\n{offender} is down to one card and did not call UNO. Reply UNO to catch them."
        );
    }
    if view.must_answer_challenge() && view.phase == TurnPhase::AwaitingChallengeDecision {
        let _ = writeln!(
            out,
            "\nA wild_draw_four was played on you. CHALLENGE YES if you think its player \
             held a card of the previous color (they draw {} if right, you draw {} if wrong), \
             or CHALLENGE NO to draw {}.",
            view.pending_draw + 2,
            view.pending_draw + 2,
            view.pending_draw
        );
    }

    out
}

/// Full decision prompt: rules reminder, table, legal moves, and feedback
/// about the previous reply if there was one.
#[must_use]
pub fn render_prompt(view: &PlayerView, feedback: Option<&str>) -> String {
    let mut out = format!(
        "You are playing UNO as {}. Reply with exactly one command on its own line.\n\n",
        view.viewer
    );
    out.push_str(&render_view(view));

    section(&mut out, "Legal moves");
    for mv in &view.legal_moves {
        let _ = writeln!(out, "{mv}");
    }

    if let Some(feedback) = feedback {
        section(&mut out, "Your previous reply was rejected");
        let _ = writeln!(out, "{feedback}");
    }

    let _ = write!(out, "\nReply format: {REPLY_FORMAT}\nYour move:");
    out
}

fn section(out: &mut String, title: &str) {
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
    let _ = writeln!(out, "=== {title} ===");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Color, Deck};
    use crate::core::{GameState, HouseRules, PlayerId};

    fn view() -> PlayerView {
        GameState::from_table(
            vec![
                vec![Card::number(Color::Red, 3), Card::wild()],
                vec![Card::number(Color::Green, 1)],
            ],
            Deck::from_piles([Card::number(Color::Red, 0)], [Card::number(Color::Red, 9)]),
            HouseRules::default(),
        )
        .view(PlayerId::new(0))
    }

    #[test]
    fn test_view_sections() {
        let text = render_view(&view());

        assert!(text.contains("=== Your hand ===\nred_3 wild\n"));
        assert!(text.contains("=== Top card ===\nred_9\n"));
        assert!(text.contains("=== Color to match ===\nRED\n"));
        assert!(text.contains("player_1: 1 card\n"));
        assert!(!text.contains("green_1"));
    }

    #[test]
    fn test_prompt_lists_legal_moves_and_feedback() {
        let view = view();
        let text = render_prompt(&view, Some("`PLAY red_8`: that card is not in your hand"));

        for mv in &view.legal_moves {
            assert!(text.contains(&format!("\n{mv}\n")), "missing {mv}");
        }
        assert!(text.contains("=== Your previous reply was rejected ==="));
        assert!(text.ends_with("Your move:"));
    }
}
