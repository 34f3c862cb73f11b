//! The UNO transition function.
//!
//! `UnoEngine` owns the house rules and the per-game RNG (used only for
//! deck reshuffles). It deals new games and applies validated moves:
//!
//! - `new_game`: shuffle, deal round-robin, flip the starter
//! - `legal_moves`: every move the validator accepts for the player to act
//! - `apply`: re-validate, then transition the state atomically
//! - `is_terminal`: the winner, once there is one
//!
//! `apply` never partially mutates: it works on a copy and commits only when
//! the whole transition succeeded.

use thiserror::Error;

use super::moves::Move;
use super::validator::{self, validate};
use crate::cards::{Card, Color, Deck, DeckError, Rank};
use crate::core::{
    ChallengeWindow, ConfigError, DrawReason, GameConfig, GameEvent, GameRng, GameState,
    PlayerId, TurnPhase,
};

/// Fatal errors from the rules engine. Each one ends the game it occurred in.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Rules engine for one game.
#[derive(Clone, Debug)]
pub struct UnoEngine {
    config: GameConfig,
    rng: GameRng,
}

impl UnoEngine {
    #[must_use]
    pub fn new(config: GameConfig, rng: GameRng) -> Self {
        Self { config, rng }
    }

    /// Engine with a fixed seed.
    #[must_use]
    pub fn seeded(config: GameConfig, seed: u64) -> Self {
        Self::new(config, GameRng::new(seed))
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Seed of the RNG this engine shuffles with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Shuffle a standard deck and deal a new game.
    pub fn new_game(&mut self, player_count: usize) -> Result<GameState, RulesError> {
        self.config.validate_for(player_count)?;
        let deck = Deck::new_shuffled(&mut self.rng);
        self.deal(player_count, deck)
    }

    /// Deal from a prepared deck, front card first.
    ///
    /// Cards go out one at a time round-robin, then the first non-wild card
    /// is flipped as the starter. The starter's rank has no effect.
    pub fn deal(&mut self, player_count: usize, mut deck: Deck) -> Result<GameState, RulesError> {
        self.config.validate_for(player_count)?;

        let mut hands = vec![Vec::with_capacity(self.config.hand_size); player_count];
        for _ in 0..self.config.hand_size {
            for hand in &mut hands {
                hand.extend(deck.draw(1, &mut self.rng)?);
            }
        }
        let starter = deck.flip_starter()?;

        let mut state = GameState::from_table(hands, deck, self.config.house_rules());
        state.record(GameEvent::Dealt {
            players: player_count,
            starter,
        });

        tracing::debug!(
            target: "uno.rules",
            players = player_count,
            starter = %starter,
            seed = self.rng.seed(),
            "dealt new game"
        );
        Ok(state)
    }

    /// Legal moves for the player to act.
    #[must_use]
    pub fn legal_moves(&self, state: &GameState) -> Vec<Move> {
        validator::legal_moves(state, state.current_player())
    }

    /// The winner, if the game is over.
    #[must_use]
    pub fn is_terminal(&self, state: &GameState) -> Option<PlayerId> {
        match state.phase() {
            TurnPhase::Terminal => state.winner(),
            _ => None,
        }
    }

    /// Apply `mv` for `player`, returning the normalized move that was applied.
    ///
    /// The move is validated again first; an illegal move is a caller bug and
    /// is reported as `InvariantViolation` with `state` untouched.
    pub fn apply(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        mv: &Move,
    ) -> Result<Move, RulesError> {
        let mv = validate(state, player, mv).map_err(|reason| {
            RulesError::InvariantViolation(format!(
                "{player} attempted illegal move `{mv}`: {reason}"
            ))
        })?;

        let mut next = state.clone();
        match mv {
            Move::PlayCard {
                card,
                declared_color,
            } => self.play_card(&mut next, player, card, declared_color)?,
            Move::DrawCard => self.draw(&mut next, player)?,
            Move::CallUno => self.call_uno(&mut next, player)?,
            Move::ChallengeDrawFour { challenge } => {
                self.resolve_challenge(&mut next, player, challenge)?
            }
        }
        next.turn_number += 1;

        tracing::trace!(
            target: "uno.rules",
            turn = next.turn_number,
            player = %player,
            mv = %mv,
            next = %next.current_player,
            phase = ?next.phase,
            "applied move"
        );

        *state = next;
        Ok(mv)
    }

    fn play_card(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        card: Card,
        declared_color: Option<Color>,
    ) -> Result<(), RulesError> {
        let hand = &mut state.hands[player];
        let position = hand.iter().position(|&c| c == card).ok_or_else(|| {
            RulesError::InvariantViolation(format!("{card} vanished from {player}'s hand"))
        })?;
        hand.remove(position);

        let prior_color = state.active_color;
        let offender_had_match = hand
            .iter()
            .any(|c| !c.is_wild() && c.color() == Some(prior_color));
        let remaining = hand.len();

        state.missed_uno = None;
        state.drawn_card = None;
        state.deck.discard(card);
        state.record(GameEvent::Played {
            player,
            card,
            declared_color,
        });

        match (card.color(), declared_color) {
            (Some(color), _) => state.active_color = color,
            // The color choice resolves inside this transition.
            (None, Some(color)) => state.active_color = color,
            (None, None) => {
                return Err(RulesError::InvariantViolation(format!(
                    "{card} played without a declared color"
                )))
            }
        }

        if remaining == 0 {
            state.phase = TurnPhase::Terminal;
            state.winner = Some(player);
            state.pending_draw = 0;
            state.challenge = None;
            state.record(GameEvent::Won { player });
            tracing::info!(
                target: "uno.rules",
                winner = %player,
                turn = state.turn_number + 1,
                "game won"
            );
            return Ok(());
        }

        if remaining == 1 && !state.uno_called.contains(&player) {
            state.missed_uno = Some(player);
            tracing::debug!(
                target: "uno.rules",
                player = %player,
                "down to one card without calling uno"
            );
        }
        if remaining > 1 {
            state.uno_called.remove(&player);
        }

        let player_count = state.player_count();
        match card.rank() {
            Rank::Skip => self.advance(state, 2),
            Rank::Reverse => {
                state.direction = state.direction.reversed();
                self.advance(state, if player_count == 2 { 2 } else { 1 });
            }
            Rank::DrawTwo => {
                state.pending_draw += 2;
                self.advance(state, 1);
            }
            Rank::WildDrawFour => {
                state.pending_draw += 4;
                let challenger = player.step(state.direction, 1, player_count);
                state.challenge = Some(ChallengeWindow {
                    offender: player,
                    challenger,
                    offender_had_match,
                });
                state.phase = TurnPhase::AwaitingChallengeDecision;
                state.current_player = challenger;
            }
            Rank::Number(_) | Rank::Wild => self.advance(state, 1),
        }
        Ok(())
    }

    fn draw(&mut self, state: &mut GameState, player: PlayerId) -> Result<(), RulesError> {
        state.missed_uno = None;

        if state.drawn_card.take().is_some() {
            state.record(GameEvent::KeptDrawnCard { player });
            self.advance(state, 1);
            return Ok(());
        }

        if state.pending_draw > 0 {
            let count = std::mem::take(&mut state.pending_draw);
            self.give_cards(state, player, count, DrawReason::Penalty);
            self.advance(state, 1);
            return Ok(());
        }

        let drawn = state.deck.draw_up_to(1, &mut self.rng);
        if drawn.is_empty() {
            state.record(GameEvent::Passed { player });
            tracing::debug!(
                target: "uno.rules",
                player = %player,
                "nothing left to draw, turn passes"
            );
            self.advance(state, 1);
            return Ok(());
        }
        state.hands[player].extend(drawn.iter().copied());
        state.uno_called.remove(&player);
        state.record(GameEvent::Drew {
            player,
            count: 1,
            reason: DrawReason::Voluntary,
        });

        let playable = match (drawn.first(), state.deck.top()) {
            (Some(&card), Some(top)) => card.matches(top, state.active_color).then_some(card),
            _ => None,
        };
        match playable {
            Some(card) if state.rules.draw_then_play_allowed => state.drawn_card = Some(card),
            _ => self.advance(state, 1),
        }
        Ok(())
    }

    fn call_uno(&mut self, state: &mut GameState, player: PlayerId) -> Result<(), RulesError> {
        match state.missed_uno.take() {
            Some(offender) if offender != player => {
                let penalty = state.rules.missed_uno_penalty;
                self.give_cards(state, offender, penalty, DrawReason::MissedUno);
                state.record(GameEvent::CaughtMissedUno {
                    caller: player,
                    offender,
                    penalty,
                });
                tracing::debug!(
                    target: "uno.rules",
                    caller = %player,
                    offender = %offender,
                    penalty,
                    "missed uno caught"
                );
            }
            _ => {
                state.uno_called.insert(player);
                state.record(GameEvent::CalledUno { player });
            }
        }
        Ok(())
    }

    fn resolve_challenge(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        challenge: bool,
    ) -> Result<(), RulesError> {
        let window = state.challenge.take().ok_or_else(|| {
            RulesError::InvariantViolation("challenge answered with no open window".to_string())
        })?;
        state.missed_uno = None;
        let pending = std::mem::take(&mut state.pending_draw);

        if !challenge {
            state.record(GameEvent::AcceptedDrawFour { player });
            self.give_cards(state, player, pending, DrawReason::Penalty);
        } else {
            let succeeded = window.offender_had_match;
            let loser = if succeeded { window.offender } else { player };
            state.record(GameEvent::Challenged {
                challenger: player,
                offender: window.offender,
                succeeded,
            });
            self.give_cards(state, loser, pending + 2, DrawReason::Challenge);
            tracing::debug!(
                target: "uno.rules",
                challenger = %player,
                offender = %window.offender,
                succeeded,
                "draw four challenged"
            );
        }

        state.phase = TurnPhase::AwaitingPlay;
        state.current_player = window.challenger;
        self.advance(state, 1);
        Ok(())
    }

    /// Move up to `count` cards from the deck into `player`'s hand.
    fn give_cards(
        &mut self,
        state: &mut GameState,
        player: PlayerId,
        count: u32,
        reason: DrawReason,
    ) {
        let cards = state.deck.draw_up_to(count as usize, &mut self.rng);
        if cards.len() < count as usize {
            tracing::debug!(
                target: "uno.rules",
                player = %player,
                owed = count,
                drawn = cards.len(),
                "deck ran short"
            );
        }
        let drawn = cards.len() as u32;
        state.hands[player].extend(cards);
        state.uno_called.remove(&player);
        state.record(GameEvent::Drew {
            player,
            count: drawn,
            reason,
        });
    }

    fn advance(&self, state: &mut GameState, steps: usize) {
        state.current_player = state
            .current_player
            .step(state.direction, steps, state.player_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HouseRules;

    fn red(n: u8) -> Card {
        Card::number(Color::Red, n)
    }

    #[test]
    fn test_new_game_deals_and_flips() {
        let mut engine = UnoEngine::seeded(GameConfig::default(), 42);
        let state = engine.new_game(4).unwrap();

        for player in PlayerId::all(4) {
            assert_eq!(state.hand(player).len(), 7);
        }
        let top = state.top_card().unwrap();
        assert!(!top.is_wild());
        assert_eq!(Some(state.active_color()), top.color());
        assert_eq!(state.deck().draw_len(), 108 - 28 - 1);
        assert_eq!(state.card_census(), Deck::standard_composition());
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn test_new_game_rejects_bad_player_count() {
        let mut engine = UnoEngine::seeded(GameConfig::default(), 1);
        assert_eq!(
            engine.new_game(1),
            Err(RulesError::Config(ConfigError::PlayerCount(1)))
        );
    }

    #[test]
    fn test_same_seed_same_deal() {
        let a = UnoEngine::seeded(GameConfig::default(), 5).new_game(3).unwrap();
        let b = UnoEngine::seeded(GameConfig::default(), 5).new_game(3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_deal_is_round_robin() {
        let config = GameConfig::new().with_hand_size(2);
        let mut engine = UnoEngine::seeded(config, 0);
        let deck = Deck::from_cards((0..=6).map(red));

        let state = engine.deal(2, deck).unwrap();

        assert_eq!(state.hand(PlayerId::new(0)), &[red(0), red(2)]);
        assert_eq!(state.hand(PlayerId::new(1)), &[red(1), red(3)]);
        assert_eq!(state.top_card(), Some(red(4)));
    }

    #[test]
    fn test_illegal_apply_leaves_state_untouched() {
        let mut engine = UnoEngine::seeded(GameConfig::default(), 0);
        let mut state = GameState::from_table(
            vec![vec![red(1), red(2)], vec![red(3)]],
            Deck::from_piles([red(4)], [Card::number(Color::Blue, 9)]),
            HouseRules::default(),
        );
        let before = state.clone();

        let err = engine
            .apply(&mut state, PlayerId::new(0), &Move::play(red(1)))
            .unwrap_err();

        assert!(matches!(err, RulesError::InvariantViolation(_)));
        assert_eq!(state, before);
    }

    #[test]
    fn test_number_play_advances_turn() {
        let mut engine = UnoEngine::seeded(GameConfig::default(), 0);
        let mut state = GameState::from_table(
            vec![vec![red(1), red(2)], vec![red(3)], vec![red(4)]],
            Deck::from_piles([red(5)], [red(9)]),
            HouseRules::default(),
        );

        engine
            .apply(&mut state, PlayerId::new(0), &Move::play(red(1)))
            .unwrap();

        assert_eq!(state.current_player(), PlayerId::new(1));
        assert_eq!(state.top_card(), Some(red(1)));
        assert_eq!(state.turn_number(), 1);
        assert_eq!(state.missed_uno(), Some(PlayerId::new(0)));
    }
}
