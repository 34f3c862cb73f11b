//! Draw pile and discard pile.
//!
//! The draw pile is drawn from the front; the discard pile grows at the back,
//! so its last card is the active card. Both piles are `im::Vector`s so a
//! whole deck snapshot clones in O(1).
//!
//! When the draw pile runs dry, everything under the top discard is shuffled
//! back into it. Cards are never created or destroyed after construction.

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::card::{Card, Color, Rank};
use crate::core::GameRng;

/// Cards in a standard UNO deck.
pub const DECK_SIZE: usize = 108;

/// Multiset of cards: card -> copies.
pub type CardCensus = FxHashMap<Card, u32>;

/// Deck errors. Only a deal from a short deck raises these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeckError {
    #[error("deck exhausted: requested {requested} cards, {available} available")]
    Exhausted { requested: usize, available: usize },
}

/// Draw pile plus discard pile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    draw_pile: Vector<Card>,
    discard_pile: Vector<Card>,
}

impl Deck {
    /// The 108 cards of a standard deck, unshuffled.
    ///
    /// Per color: one 0, two each of 1-9, Skip, Reverse and Draw Two.
    /// Plus four Wild and four Wild Draw Four.
    #[must_use]
    pub fn standard_cards() -> Vec<Card> {
        let mut cards = Vec::with_capacity(DECK_SIZE);

        for color in Color::ALL {
            cards.push(Card::number(color, 0));
            for _ in 0..2 {
                for n in 1..=9 {
                    cards.push(Card::number(color, n));
                }
                cards.push(Card::new(color, Rank::Skip));
                cards.push(Card::new(color, Rank::Reverse));
                cards.push(Card::new(color, Rank::DrawTwo));
            }
        }

        for _ in 0..4 {
            cards.push(Card::wild());
            cards.push(Card::wild_draw_four());
        }

        cards
    }

    /// Census of the standard deck, for invariant checks.
    #[must_use]
    pub fn standard_composition() -> CardCensus {
        census(Self::standard_cards())
    }

    /// A standard deck in random order with an empty discard pile.
    #[must_use]
    pub fn new_shuffled(rng: &mut GameRng) -> Self {
        let mut cards = Self::standard_cards();
        rng.shuffle(&mut cards);
        Self::from_cards(cards)
    }

    /// A deck whose draw pile is exactly `cards`, front first.
    ///
    /// Useful for scripted scenarios; no composition check is made.
    #[must_use]
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            draw_pile: cards.into_iter().collect(),
            discard_pile: Vector::new(),
        }
    }

    /// Build from explicit piles. The discard pile's last card is the top.
    #[must_use]
    pub fn from_piles(
        draw_pile: impl IntoIterator<Item = Card>,
        discard_pile: impl IntoIterator<Item = Card>,
    ) -> Self {
        Self {
            draw_pile: draw_pile.into_iter().collect(),
            discard_pile: discard_pile.into_iter().collect(),
        }
    }

    /// Cards left in the draw pile.
    #[must_use]
    pub fn draw_len(&self) -> usize {
        self.draw_pile.len()
    }

    /// Cards in the discard pile, including the top card.
    #[must_use]
    pub fn discard_len(&self) -> usize {
        self.discard_pile.len()
    }

    /// The active card.
    #[must_use]
    pub fn top(&self) -> Option<Card> {
        self.discard_pile.back().copied()
    }

    /// Cards a draw could deliver: the draw pile plus everything under the top discard.
    #[must_use]
    pub fn available(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len().saturating_sub(1)
    }

    /// Draw `n` cards from the front of the draw pile.
    ///
    /// Reshuffles the discard pile (minus its top card) into the draw pile
    /// whenever the draw pile empties mid-draw. Fails without touching the
    /// deck if fewer than `n` cards are available at all.
    pub fn draw(&mut self, n: usize, rng: &mut GameRng) -> Result<Vec<Card>, DeckError> {
        let available = self.available();
        if n > available {
            return Err(DeckError::Exhausted {
                requested: n,
                available,
            });
        }

        let mut drawn = Vec::with_capacity(n);
        while drawn.len() < n {
            if self.draw_pile.is_empty() {
                self.reshuffle(rng);
            }
            match self.draw_pile.pop_front() {
                Some(card) => drawn.push(card),
                None => {
                    return Err(DeckError::Exhausted {
                        requested: n,
                        available: drawn.len(),
                    })
                }
            }
        }
        Ok(drawn)
    }

    /// Draw at most `n` cards; fewer when the piles together hold fewer.
    ///
    /// Every card can be in players' hands at once, so in-game draws take
    /// whatever is left rather than failing.
    pub fn draw_up_to(&mut self, n: usize, rng: &mut GameRng) -> Vec<Card> {
        let n = n.min(self.available());
        let mut drawn = Vec::with_capacity(n);
        while drawn.len() < n {
            if self.draw_pile.is_empty() {
                self.reshuffle(rng);
            }
            match self.draw_pile.pop_front() {
                Some(card) => drawn.push(card),
                None => break,
            }
        }
        drawn
    }

    /// Put a played card on top of the discard pile.
    pub fn discard(&mut self, card: Card) {
        self.discard_pile.push_back(card);
    }

    /// Reveal the starting card: the first non-wild card of the draw pile.
    ///
    /// Wild-family cards turned up on the way go to the bottom of the draw pile.
    pub fn flip_starter(&mut self) -> Result<Card, DeckError> {
        let mut set_aside = Vec::new();
        let starter = loop {
            match self.draw_pile.pop_front() {
                Some(card) if card.is_wild() => set_aside.push(card),
                Some(card) => break Some(card),
                None => break None,
            }
        };
        self.draw_pile.extend(set_aside);

        let starter = starter.ok_or(DeckError::Exhausted {
            requested: 1,
            available: 0,
        })?;
        self.discard(starter);
        Ok(starter)
    }

    /// Census of both piles.
    #[must_use]
    pub fn composition(&self) -> CardCensus {
        census(self.draw_pile.iter().chain(self.discard_pile.iter()).copied())
    }

    fn reshuffle(&mut self, rng: &mut GameRng) {
        let Some(top) = self.discard_pile.pop_back() else {
            return;
        };
        let mut recycled: Vec<Card> = std::mem::take(&mut self.discard_pile).into_iter().collect();
        rng.shuffle(&mut recycled);

        tracing::debug!(
            target: "uno.deck",
            recycled = recycled.len(),
            top = %top,
            "reshuffled discard pile"
        );

        self.draw_pile.extend(recycled);
        self.discard_pile.push_back(top);
    }
}

/// Count cards into a multiset.
pub fn census(cards: impl IntoIterator<Item = Card>) -> CardCensus {
    let mut counts = CardCensus::default();
    for card in cards {
        *counts.entry(card).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_deck_composition() {
        let cards = Deck::standard_cards();
        assert_eq!(cards.len(), DECK_SIZE);

        let counts = census(cards);
        assert_eq!(counts[&Card::number(Color::Red, 0)], 1);
        assert_eq!(counts[&Card::number(Color::Blue, 9)], 2);
        assert_eq!(counts[&Card::new(Color::Green, Rank::DrawTwo)], 2);
        assert_eq!(counts[&Card::wild()], 4);
        assert_eq!(counts[&Card::wild_draw_four()], 4);
    }

    #[test]
    fn test_shuffle_reproducible() {
        let d1 = Deck::new_shuffled(&mut GameRng::new(123));
        let d2 = Deck::new_shuffled(&mut GameRng::new(123));
        let d3 = Deck::new_shuffled(&mut GameRng::new(124));

        assert_eq!(d1, d2);
        assert_ne!(d1, d3);
        assert_eq!(d1.composition(), Deck::standard_composition());
    }

    #[test]
    fn test_draw_from_front() {
        let mut rng = GameRng::new(0);
        let mut deck = Deck::from_cards([
            Card::number(Color::Red, 1),
            Card::number(Color::Red, 2),
            Card::number(Color::Red, 3),
        ]);

        let drawn = deck.draw(2, &mut rng).unwrap();
        assert_eq!(drawn, vec![Card::number(Color::Red, 1), Card::number(Color::Red, 2)]);
        assert_eq!(deck.draw_len(), 1);
    }

    #[test]
    fn test_draw_reshuffles_all_but_top() {
        let mut rng = GameRng::new(9);
        let top = Card::number(Color::Green, 4);
        let mut deck = Deck::from_piles(
            [Card::number(Color::Red, 1)],
            [
                Card::number(Color::Blue, 2),
                Card::number(Color::Blue, 3),
                top,
            ],
        );

        let drawn = deck.draw(3, &mut rng).unwrap();

        assert_eq!(drawn.len(), 3);
        assert_eq!(drawn[0], Card::number(Color::Red, 1));
        assert!(!drawn.contains(&top));
        assert_eq!(deck.top(), Some(top));
        assert_eq!(deck.discard_len(), 1);
        assert_eq!(deck.draw_len(), 0);
    }

    #[test]
    fn test_draw_exhausted_leaves_deck_untouched() {
        let mut rng = GameRng::new(1);
        let mut deck = Deck::from_piles(
            [Card::number(Color::Red, 1)],
            [Card::number(Color::Blue, 2)],
        );
        let before = deck.clone();

        let err = deck.draw(2, &mut rng).unwrap_err();

        assert_eq!(
            err,
            DeckError::Exhausted {
                requested: 2,
                available: 1
            }
        );
        assert_eq!(deck, before);
    }

    #[test]
    fn test_draw_up_to_takes_what_is_left() {
        let mut rng = GameRng::new(4);
        let top = Card::number(Color::Green, 4);
        let mut deck = Deck::from_piles(
            [Card::number(Color::Red, 1)],
            [Card::number(Color::Blue, 2), top],
        );

        let drawn = deck.draw_up_to(5, &mut rng);

        assert_eq!(drawn.len(), 2);
        assert_eq!(deck.top(), Some(top));
        assert_eq!(deck.available(), 0);
        assert!(deck.draw_up_to(1, &mut rng).is_empty());
        assert_eq!(deck.discard_len(), 1);
    }

    #[test]
    fn test_flip_starter_skips_wilds() {
        let mut deck = Deck::from_cards([
            Card::wild(),
            Card::wild_draw_four(),
            Card::number(Color::Yellow, 8),
            Card::number(Color::Red, 1),
        ]);

        let starter = deck.flip_starter().unwrap();

        assert_eq!(starter, Card::number(Color::Yellow, 8));
        assert_eq!(deck.top(), Some(starter));
        assert_eq!(deck.draw_len(), 3);
        assert_eq!(deck.composition().values().sum::<u32>(), 4);
    }

    #[test]
    fn test_flip_starter_all_wild_fails() {
        let mut deck = Deck::from_cards([Card::wild()]);
        assert!(deck.flip_starter().is_err());
        assert_eq!(deck.draw_len(), 1);
    }
}
