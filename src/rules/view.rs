//! A single player's projection of the table.
//!
//! The view carries the viewer's own hand but only the counts of every other
//! hand. Legal moves are precomputed by the engine as hints; they are the
//! same list `validate` would accept, and agents are free to ignore them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::moves::Move;
use super::validator::{legal_moves, playable_cards, TableView};
use crate::cards::{Card, Color};
use crate::core::{Direction, GameEvent, GameState, HouseRules, PlayerId, PlayerMap, TurnPhase};

/// History entries included in a view.
pub const RECENT_EVENTS: usize = 10;

/// Read-only projection of a `GameState` for one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub viewer: PlayerId,
    pub hand: Vec<Card>,
    /// Card counts for every seat, the viewer included.
    pub hand_counts: PlayerMap<usize>,
    pub top_card: Option<Card>,
    pub active_color: Color,
    pub direction: Direction,
    pub pending_draw: u32,
    pub phase: TurnPhase,
    pub current_player: PlayerId,
    /// Whether the viewer has an Uno call on record.
    pub uno_called: bool,
    pub missed_uno: Option<PlayerId>,
    pub challenger: Option<PlayerId>,
    /// Only set for the viewer's own draw.
    pub drawn_card: Option<Card>,
    pub turn_number: u32,
    pub recent_events: Vec<GameEvent>,
    pub playable_cards: SmallVec<[Card; 8]>,
    pub legal_moves: Vec<Move>,
    pub rules: HouseRules,
}

impl PlayerView {
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.hand_counts.player_count()
    }

    /// Whether the viewer is the one to act.
    #[must_use]
    pub fn is_my_turn(&self) -> bool {
        self.viewer == self.current_player && self.phase != TurnPhase::Terminal
    }

    /// Whether an opponent can be called out for a missed Uno.
    #[must_use]
    pub fn can_call_out(&self) -> bool {
        self.missed_uno.is_some_and(|offender| offender != self.viewer)
    }

    /// Whether the viewer must answer a Wild Draw Four.
    #[must_use]
    pub fn must_answer_challenge(&self) -> bool {
        self.challenger == Some(self.viewer)
    }
}

impl TableView for PlayerView {
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
        self.top_card
    }

    fn active_color(&self) -> Color {
        self.active_color
    }

    fn pending_draw(&self) -> u32 {
        self.pending_draw
    }

    fn visible_hand(&self, player: PlayerId) -> Option<&[Card]> {
        (player == self.viewer).then_some(self.hand.as_slice())
    }

    fn has_called_uno(&self, player: PlayerId) -> bool {
        player == self.viewer && self.uno_called
    }

    fn missed_uno(&self) -> Option<PlayerId> {
        self.missed_uno
    }

    fn challenger(&self) -> Option<PlayerId> {
        self.challenger
    }

    fn drawn_card(&self) -> Option<Card> {
        self.drawn_card
    }
}

impl GameState {
    /// Project the table for `viewer`.
    ///
    /// ```
    /// use uno_arena::core::{GameConfig, PlayerId};
    /// use uno_arena::rules::UnoEngine;
    ///
    /// let mut engine = UnoEngine::seeded(GameConfig::default(), 7);
    /// let state = engine.new_game(3).unwrap();
    /// let view = state.view(PlayerId::new(1));
    ///
    /// assert_eq!(view.hand.len(), 7);
    /// assert_eq!(view.player_count(), 3);
    /// assert!(view.legal_moves.is_empty()); // player 0 acts first
    /// ```
    #[must_use]
    pub fn view(&self, viewer: PlayerId) -> PlayerView {
        let skip = self.history.len().saturating_sub(RECENT_EVENTS);
        let own_draw = self.current_player == viewer;

        PlayerView {
            viewer,
            hand: self.hands[viewer].clone(),
            hand_counts: self.hand_sizes(),
            top_card: self.deck.top(),
            active_color: self.active_color,
            direction: self.direction,
            pending_draw: self.pending_draw,
            phase: self.phase,
            current_player: self.current_player,
            uno_called: self.uno_called.contains(&viewer),
            missed_uno: self.missed_uno,
            challenger: self.challenge.map(|window| window.challenger),
            drawn_card: self.drawn_card.filter(|_| own_draw),
            turn_number: self.turn_number,
            recent_events: self.history.iter().skip(skip).cloned().collect(),
            playable_cards: playable_cards(self, viewer),
            legal_moves: legal_moves(self, viewer),
            rules: self.rules,
        }
    }
}
