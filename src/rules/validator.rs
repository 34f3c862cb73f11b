//! Move validation.
//!
//! `validate` is a pure function of a table and a proposed move. It is
//! written against the read-only [`TableView`] trait, which both the full
//! `GameState` and a player's `PlayerView` implement, so an agent checking
//! a move against its own view gets the same verdict the orchestrator will.
//!
//! Checks run in a fixed order:
//!
//! 1. The phase allows this kind of move, and it is the player's turn.
//! 2. A played card is in the player's hand.
//! 3. A played card matches the top card's effective color or rank, or
//!    answers a pending draw obligation.
//! 4. A wild-family play declares a color.
//! 5. A draw-card answer to a pending obligation is a legal stack.
//! 6. Uno calls and challenges respect their windows.

use smallvec::SmallVec;

use super::moves::{Move, RejectReason};
use crate::cards::{Card, Color, Rank};
use crate::core::{GameState, HouseRules, PlayerId, TurnPhase};

/// The slice of table state a validator needs.
pub trait TableView {
    fn phase(&self) -> TurnPhase;
    fn current_player(&self) -> PlayerId;
    fn rules(&self) -> HouseRules;
    fn top_card(&self) -> Option<Card>;
    fn active_color(&self) -> Color;
    fn pending_draw(&self) -> u32;

    /// `player`'s hand, if this table can see it.
    fn visible_hand(&self, player: PlayerId) -> Option<&[Card]>;

    fn has_called_uno(&self, player: PlayerId) -> bool;

    /// Player exposed to a missed-Uno callout.
    fn missed_uno(&self) -> Option<PlayerId>;

    /// Player entitled to challenge an open Wild Draw Four.
    fn challenger(&self) -> Option<PlayerId>;

    /// Card from this turn's voluntary draw that may still be played.
    fn drawn_card(&self) -> Option<Card>;
}

impl TableView for GameState {
    fn phase(&self) -> TurnPhase {
        self.phase
    }

    fn current_player(&self) -> PlayerId {
        self.current_player
    }

    fn rules(&self) -> HouseRules {
        self.rules
    }

    fn top_card(&self) -> Option<Card> {
        self.deck.top()
    }

    fn active_color(&self) -> Color {
        self.active_color
    }

    fn pending_draw(&self) -> u32 {
        self.pending_draw
    }

    fn visible_hand(&self, player: PlayerId) -> Option<&[Card]> {
        (player.index() < self.player_count()).then(|| self.hands[player].as_slice())
    }

    fn has_called_uno(&self, player: PlayerId) -> bool {
        self.uno_called.contains(&player)
    }

    fn missed_uno(&self) -> Option<PlayerId> {
        self.missed_uno
    }

    fn challenger(&self) -> Option<PlayerId> {
        self.challenge.map(|window| window.challenger)
    }

    fn drawn_card(&self) -> Option<Card> {
        self.drawn_card
    }
}

/// Validate `mv` for `player`, returning the normalized move.
///
/// Normalization drops a declared color on a non-wild card, so the move
/// that is applied is exactly the move that was accepted.
pub fn validate<T: TableView + ?Sized>(
    table: &T,
    player: PlayerId,
    mv: &Move,
) -> Result<Move, RejectReason> {
    let phase = table.phase();
    if matches!(phase, TurnPhase::Terminal | TurnPhase::AwaitingColorChoice) {
        return Err(RejectReason::InvalidPhaseForMove);
    }
    if player != table.current_player() {
        return Err(RejectReason::NotYourTurn);
    }

    match *mv {
        Move::PlayCard {
            card,
            declared_color,
        } => validate_play(table, player, card, declared_color),
        Move::DrawCard => {
            if phase == TurnPhase::AwaitingChallengeDecision {
                return Err(RejectReason::InvalidPhaseForMove);
            }
            Ok(Move::DrawCard)
        }
        Move::CallUno => validate_uno_call(table, player),
        Move::ChallengeDrawFour { challenge } => {
            if phase == TurnPhase::AwaitingChallengeDecision
                && table.challenger() == Some(player)
            {
                Ok(Move::ChallengeDrawFour { challenge })
            } else {
                Err(RejectReason::ChallengeWindowClosed)
            }
        }
    }
}

fn validate_play<T: TableView + ?Sized>(
    table: &T,
    player: PlayerId,
    card: Card,
    declared_color: Option<Color>,
) -> Result<Move, RejectReason> {
    // Only a stacked Wild Draw Four can answer an open challenge window.
    if table.phase() == TurnPhase::AwaitingChallengeDecision
        && card.rank() != Rank::WildDrawFour
    {
        return Err(RejectReason::InvalidPhaseForMove);
    }
    if let Some(drawn) = table.drawn_card() {
        if drawn != card {
            return Err(RejectReason::InvalidPhaseForMove);
        }
    }

    let in_hand = table
        .visible_hand(player)
        .is_some_and(|hand| hand.contains(&card));
    if !in_hand {
        return Err(RejectReason::CardNotInHand);
    }

    let pending = table.pending_draw();
    if pending > 0 {
        if card.rank().draw_penalty() == 0 {
            return Err(RejectReason::ColorOrRankMismatch);
        }
    } else {
        let top = table.top_card().ok_or(RejectReason::ColorOrRankMismatch)?;
        if !card.matches(top, table.active_color()) {
            return Err(RejectReason::ColorOrRankMismatch);
        }
    }

    let mv = if card.is_wild() {
        let color = declared_color.ok_or(RejectReason::MissingColorDeclaration)?;
        Move::play_wild(card, color)
    } else {
        Move::play(card)
    };

    if pending > 0 {
        if !table.rules().stacking_enabled {
            return Err(RejectReason::StackingDisabled);
        }
        // A stack must repeat the rank that created the obligation.
        if table.top_card().map(Card::rank) != Some(card.rank()) {
            return Err(RejectReason::ColorOrRankMismatch);
        }
    }

    Ok(mv)
}

fn validate_uno_call<T: TableView + ?Sized>(
    table: &T,
    player: PlayerId,
) -> Result<Move, RejectReason> {
    if table.missed_uno().is_some_and(|offender| offender != player) {
        return Ok(Move::CallUno);
    }
    if table.phase() != TurnPhase::AwaitingPlay {
        return Err(RejectReason::InvalidPhaseForMove);
    }
    if table.has_called_uno(player) {
        return Err(RejectReason::DuplicateUnoCall);
    }

    let hand_size = table.visible_hand(player).map_or(0, <[Card]>::len);
    if !(1..=2).contains(&hand_size) {
        return Err(RejectReason::InvalidPhaseForMove);
    }
    Ok(Move::CallUno)
}

/// Every move `validate` accepts for `player`.
///
/// Card plays come first, sorted by their command text (wild-family cards
/// once per declared color), then `DRAW`, `UNO` and the challenge answers.
/// Empty when the player cannot act.
pub fn legal_moves<T: TableView + ?Sized>(table: &T, player: PlayerId) -> Vec<Move> {
    let Some(hand) = table.visible_hand(player) else {
        return Vec::new();
    };

    let mut cards = hand.to_vec();
    cards.sort();
    cards.dedup();

    let mut plays: Vec<Move> = cards
        .into_iter()
        .flat_map(|card| {
            let candidates: SmallVec<[Move; 4]> = if card.is_wild() {
                Color::ALL
                    .into_iter()
                    .map(|color| Move::play_wild(card, color))
                    .collect()
            } else {
                smallvec::smallvec![Move::play(card)]
            };
            candidates
        })
        .filter_map(|mv| validate(table, player, &mv).ok())
        .collect();
    plays.sort_by_cached_key(ToString::to_string);

    let others = [
        Move::DrawCard,
        Move::CallUno,
        Move::ChallengeDrawFour { challenge: true },
        Move::ChallengeDrawFour { challenge: false },
    ];
    plays.extend(
        others
            .iter()
            .filter_map(|mv| validate(table, player, mv).ok()),
    );
    plays
}

/// Distinct cards `player` could play right now.
pub fn playable_cards<T: TableView + ?Sized>(table: &T, player: PlayerId) -> SmallVec<[Card; 8]> {
    let mut cards: SmallVec<[Card; 8]> = legal_moves(table, player)
        .iter()
        .filter_map(Move::card)
        .collect();
    cards.dedup();
    cards
}
