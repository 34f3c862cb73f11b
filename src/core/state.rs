//! Game state: the full table, including private hands.
//!
//! ## GameState
//!
//! Everything the rules engine needs to validate and apply a move:
//! - Hands, draw pile and discard pile
//! - Current player, direction, active color, pending draw count
//! - Uno calls and the missed-Uno callout window
//! - The Wild Draw Four challenge window and the draw-then-play window
//! - An append-only event history
//!
//! Only `rules::UnoEngine::apply` mutates a `GameState`; everything else
//! reads it, usually through a `PlayerView`.
//!
//! Hands are plain `Vec`s (small, and their order is visible to the owner);
//! the history and the Uno set use `im` persistent structures so that
//! per-move snapshots for traces stay cheap.

use std::fmt;

use im::{HashSet as ImHashSet, Vector};
use serde::{Deserialize, Serialize};

use super::config::HouseRules;
use super::player::{Direction, PlayerId, PlayerMap};
use crate::cards::{census, Card, CardCensus, Color, Deck};

/// Where the turn currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// The current player may play, draw, or call Uno.
    AwaitingPlay,
    /// A wild-family card is being resolved. Never observed between moves:
    /// the declared color travels with the play.
    AwaitingColorChoice,
    /// The player after a Wild Draw Four decides whether to challenge it.
    AwaitingChallengeDecision,
    /// Someone has emptied their hand.
    Terminal,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::AwaitingPlay => "awaiting play",
            TurnPhase::AwaitingColorChoice => "awaiting color choice",
            TurnPhase::AwaitingChallengeDecision => "awaiting challenge decision",
            TurnPhase::Terminal => "game over",
        };
        f.write_str(name)
    }
}

/// An open Wild Draw Four challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeWindow {
    /// Player who played the Wild Draw Four.
    pub offender: PlayerId,
    /// Player entitled to challenge it.
    pub challenger: PlayerId,
    /// Whether the offender held a non-wild card of the prior active color.
    pub offender_had_match: bool,
}

/// Why cards were drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawReason {
    /// A normal single draw.
    Voluntary,
    /// Discharging a Draw Two / Wild Draw Four obligation.
    Penalty,
    /// Caught without calling Uno.
    MissedUno,
    /// Losing side of a Wild Draw Four challenge.
    Challenge,
}

/// One entry in the game history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Cards dealt and the starter flipped.
    Dealt { players: usize, starter: Card },
    Played {
        player: PlayerId,
        card: Card,
        declared_color: Option<Color>,
    },
    Drew {
        player: PlayerId,
        count: u32,
        reason: DrawReason,
    },
    /// Declined to play a freshly drawn card.
    KeptDrawnCard { player: PlayerId },
    /// Drew with nothing left to draw.
    Passed { player: PlayerId },
    CalledUno { player: PlayerId },
    CaughtMissedUno {
        caller: PlayerId,
        offender: PlayerId,
        penalty: u32,
    },
    Challenged {
        challenger: PlayerId,
        offender: PlayerId,
        succeeded: bool,
    },
    /// Challenge declined.
    AcceptedDrawFour { player: PlayerId },
    Won { player: PlayerId },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::Dealt { players, starter } => {
                write!(f, "dealt {players} hands, starter {starter}")
            }
            GameEvent::Played {
                player,
                card,
                declared_color: Some(color),
            } => write!(f, "{player} played {card} and chose {color}"),
            GameEvent::Played { player, card, .. } => write!(f, "{player} played {card}"),
            GameEvent::Drew {
                player,
                count: 1,
                reason: DrawReason::Voluntary,
            } => write!(f, "{player} drew a card"),
            GameEvent::Drew {
                player,
                count,
                reason,
            } => {
                let why = match reason {
                    DrawReason::Voluntary => "",
                    DrawReason::Penalty => " (draw penalty)",
                    DrawReason::MissedUno => " (missed uno)",
                    DrawReason::Challenge => " (challenge)",
                };
                write!(f, "{player} drew {count} cards{why}")
            }
            GameEvent::KeptDrawnCard { player } => write!(f, "{player} kept the drawn card"),
            GameEvent::Passed { player } => write!(f, "{player} passed, nothing left to draw"),
            GameEvent::CalledUno { player } => write!(f, "{player} called UNO"),
            GameEvent::CaughtMissedUno {
                caller,
                offender,
                penalty,
            } => write!(f, "{caller} caught {offender} without UNO (+{penalty})"),
            GameEvent::Challenged {
                challenger,
                offender,
                succeeded,
            } => {
                let verdict = if *succeeded { "won" } else { "lost" };
                write!(f, "{challenger} challenged {offender}'s wild_draw_four and {verdict}")
            }
            GameEvent::AcceptedDrawFour { player } => {
                write!(f, "{player} accepted the wild_draw_four")
            }
            GameEvent::Won { player } => write!(f, "{player} won"),
        }
    }
}

/// Full game state including private hands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub(crate) hands: PlayerMap<Vec<Card>>,
    pub(crate) deck: Deck,
    pub(crate) current_player: PlayerId,
    pub(crate) direction: Direction,
    pub(crate) active_color: Color,
    pub(crate) pending_draw: u32,
    pub(crate) uno_called: ImHashSet<PlayerId>,
    pub(crate) phase: TurnPhase,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) missed_uno: Option<PlayerId>,
    pub(crate) challenge: Option<ChallengeWindow>,
    pub(crate) drawn_card: Option<Card>,
    pub(crate) turn_number: u32,
    pub(crate) history: Vector<GameEvent>,
    pub(crate) rules: HouseRules,
}

impl GameState {
    /// Assemble a table from explicit hands and piles.
    ///
    /// Player 0 is to act, direction is clockwise, and the active color is
    /// the top card's color (red under a wild top; override with
    /// [`GameState::with_active_color`]). Used for the deal and for scripted
    /// positions; the engine's `new_game` is the normal entry point.
    ///
    /// ```
    /// use uno_arena::cards::{Card, Color, Deck};
    /// use uno_arena::core::{GameState, HouseRules, PlayerId};
    ///
    /// let state = GameState::from_table(
    ///     vec![vec![Card::number(Color::Red, 1)], vec![Card::number(Color::Blue, 2)]],
    ///     Deck::from_piles([], [Card::number(Color::Red, 5)]),
    ///     HouseRules::default(),
    /// );
    /// assert_eq!(state.current_player(), PlayerId::new(0));
    /// assert_eq!(state.active_color(), Color::Red);
    /// ```
    #[must_use]
    pub fn from_table(hands: Vec<Vec<Card>>, deck: Deck, rules: HouseRules) -> Self {
        let player_count = hands.len();
        let mut hands = hands.into_iter();
        let hands = PlayerMap::new(player_count, |_| hands.next().unwrap_or_default());
        let active_color = deck.top().and_then(Card::color).unwrap_or(Color::Red);

        Self {
            hands,
            deck,
            current_player: PlayerId::new(0),
            direction: Direction::Clockwise,
            active_color,
            pending_draw: 0,
            uno_called: ImHashSet::new(),
            phase: TurnPhase::AwaitingPlay,
            winner: None,
            missed_uno: None,
            challenge: None,
            drawn_card: None,
            turn_number: 0,
            history: Vector::new(),
            rules,
        }
    }

    /// Override the active color, for positions with a wild on top.
    #[must_use]
    pub fn with_active_color(mut self, color: Color) -> Self {
        self.active_color = color;
        self
    }

    /// Override the player to act.
    #[must_use]
    pub fn with_current_player(mut self, player: PlayerId) -> Self {
        self.current_player = player;
        self
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.hands.player_count()
    }

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> &[Card] {
        &self.hands[player]
    }

    /// Hand sizes by seat.
    #[must_use]
    pub fn hand_sizes(&self) -> PlayerMap<usize> {
        self.hands.map(Vec::len)
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// The active card.
    #[must_use]
    pub fn top_card(&self) -> Option<Card> {
        self.deck.top()
    }

    #[must_use]
    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn active_color(&self) -> Color {
        self.active_color
    }

    #[must_use]
    pub fn pending_draw(&self) -> u32 {
        self.pending_draw
    }

    #[must_use]
    pub fn uno_called(&self) -> &ImHashSet<PlayerId> {
        &self.uno_called
    }

    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Player currently exposed to a missed-Uno callout.
    #[must_use]
    pub fn missed_uno(&self) -> Option<PlayerId> {
        self.missed_uno
    }

    #[must_use]
    pub fn challenge(&self) -> Option<ChallengeWindow> {
        self.challenge
    }

    /// Card drawn this turn that may still be played.
    #[must_use]
    pub fn drawn_card(&self) -> Option<Card> {
        self.drawn_card
    }

    /// Moves applied so far.
    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    #[must_use]
    pub fn history(&self) -> &Vector<GameEvent> {
        &self.history
    }

    #[must_use]
    pub fn rules(&self) -> HouseRules {
        self.rules
    }

    /// Every card on the table: hands, draw pile and discard pile.
    #[must_use]
    pub fn card_census(&self) -> CardCensus {
        let mut counts = self.deck.composition();
        for (card, n) in census(self.hands.values().flatten().copied()) {
            *counts.entry(card).or_insert(0) += n;
        }
        counts
    }

    /// Record an event.
    pub(crate) fn record(&mut self, event: GameEvent) {
        self.history.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Rank;

    fn two_player_table() -> GameState {
        GameState::from_table(
            vec![
                vec![Card::number(Color::Red, 1), Card::wild()],
                vec![Card::new(Color::Blue, Rank::Skip)],
            ],
            Deck::from_piles(
                [Card::number(Color::Green, 3)],
                [Card::number(Color::Yellow, 9)],
            ),
            HouseRules::default(),
        )
    }

    #[test]
    fn test_from_table_defaults() {
        let state = two_player_table();

        assert_eq!(state.player_count(), 2);
        assert_eq!(state.current_player(), PlayerId::new(0));
        assert_eq!(state.direction(), Direction::Clockwise);
        assert_eq!(state.active_color(), Color::Yellow);
        assert_eq!(state.phase(), TurnPhase::AwaitingPlay);
        assert_eq!(state.pending_draw(), 0);
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_wild_top_defaults_to_red_until_overridden() {
        let state = GameState::from_table(
            vec![vec![], vec![]],
            Deck::from_piles([], [Card::wild()]),
            HouseRules::default(),
        );
        assert_eq!(state.active_color(), Color::Red);
        assert_eq!(state.with_active_color(Color::Blue).active_color(), Color::Blue);
    }

    #[test]
    fn test_card_census_counts_everything() {
        let state = two_player_table();
        let counts = state.card_census();

        assert_eq!(counts.values().sum::<u32>(), 5);
        assert_eq!(counts[&Card::wild()], 1);
        assert_eq!(counts[&Card::number(Color::Yellow, 9)], 1);
    }

    #[test]
    fn test_hand_sizes() {
        let sizes = two_player_table().hand_sizes();
        assert_eq!(sizes[PlayerId::new(0)], 2);
        assert_eq!(sizes[PlayerId::new(1)], 1);
    }

    #[test]
    fn test_event_display() {
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);

        assert_eq!(
            GameEvent::Played {
                player: p0,
                card: Card::wild(),
                declared_color: Some(Color::Green)
            }
            .to_string(),
            "player_0 played wild and chose green"
        );
        assert_eq!(
            GameEvent::Drew {
                player: p1,
                count: 2,
                reason: DrawReason::Penalty
            }
            .to_string(),
            "player_1 drew 2 cards (draw penalty)"
        );
        assert_eq!(
            GameEvent::CaughtMissedUno {
                caller: p1,
                offender: p0,
                penalty: 2
            }
            .to_string(),
            "player_1 caught player_0 without UNO (+2)"
        );
    }

    #[test]
    fn test_state_serializes() {
        let state = two_player_table();
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
