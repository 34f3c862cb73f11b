//! Moves and rejection reasons.
//!
//! A `Move` is a transient request from an agent. Only its effect on the
//! `GameState` persists. Its `Display` is the canonical command of the reply
//! grammar (`PLAY red_7`, `PLAY wild blue`, `DRAW`, `UNO`, `CHALLENGE NO`),
//! so a move printed into a prompt parses back to itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cards::{Card, Color};

/// A move proposed by the player to act.
///
/// ```
/// use uno_arena::cards::{Card, Color};
/// use uno_arena::rules::Move;
///
/// let mv = Move::play_wild(Card::wild(), Color::Blue);
/// assert_eq!(mv.to_string(), "PLAY wild blue");
/// assert_eq!(Move::DrawCard.to_string(), "DRAW");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Play a card. Wild-family cards need a declared color.
    PlayCard {
        card: Card,
        declared_color: Option<Color>,
    },
    /// Draw (or, right after a voluntary draw, keep the drawn card and pass).
    DrawCard,
    /// Declare Uno, or call out an opponent who forgot to.
    CallUno,
    /// Answer an open Wild Draw Four challenge window.
    ChallengeDrawFour { challenge: bool },
}

impl Move {
    /// Play a colored card.
    #[must_use]
    pub fn play(card: Card) -> Self {
        Move::PlayCard {
            card,
            declared_color: None,
        }
    }

    /// Play a wild-family card declaring `color`.
    #[must_use]
    pub fn play_wild(card: Card, color: Color) -> Self {
        Move::PlayCard {
            card,
            declared_color: Some(color),
        }
    }

    /// The card played, if any.
    #[must_use]
    pub fn card(&self) -> Option<Card> {
        match self {
            Move::PlayCard { card, .. } => Some(*card),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::PlayCard {
                card,
                declared_color: Some(color),
            } => write!(f, "PLAY {card} {color}"),
            Move::PlayCard { card, .. } => write!(f, "PLAY {card}"),
            Move::DrawCard => f.write_str("DRAW"),
            Move::CallUno => f.write_str("UNO"),
            Move::ChallengeDrawFour { challenge: true } => f.write_str("CHALLENGE YES"),
            Move::ChallengeDrawFour { challenge: false } => f.write_str("CHALLENGE NO"),
        }
    }
}

/// Why the validator refused a move.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("that card is not in your hand")]
    CardNotInHand,
    #[error("that card matches neither the active color nor the top card's rank")]
    ColorOrRankMismatch,
    #[error("a wild card needs a declared color (red, yellow, green or blue)")]
    MissingColorDeclaration,
    #[error("stacking draw cards is disabled at this table")]
    StackingDisabled,
    #[error("that move is not allowed right now")]
    InvalidPhaseForMove,
    #[error("you have already called UNO")]
    DuplicateUnoCall,
    #[error("there is no wild_draw_four for you to challenge")]
    ChallengeWindowClosed,
}
