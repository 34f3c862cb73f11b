//! Card model: card values, the standard deck, and the two piles.
//!
//! ## Key Types
//!
//! - `Color`: the four playable colors
//! - `Rank`: numbers, action ranks and the wild family
//! - `Card`: an immutable `(color, rank)` value
//! - `Deck`: draw pile plus discard pile, with reshuffle-on-empty

pub mod card;
pub mod deck;

pub use card::{Card, CardParseError, Color, Rank};
pub use deck::{census, CardCensus, Deck, DeckError, DECK_SIZE};
