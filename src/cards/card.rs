//! UNO card value types.
//!
//! A card is a `(color, rank)` pair. Wild-family cards have no color of their
//! own (`color() == None`); the color they stand for once played lives in the
//! game state as the active color.
//!
//! Cards are `Copy` and compare by value. Their canonical text form
//! (`red_7`, `blue_skip`, `yellow_draw_two`, `wild_draw_four`) is used for
//! display, for agent prompts, for serialization, and for ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the four playable colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
}

impl Color {
    /// All playable colors, in deck-building order.
    pub const ALL: [Color; 4] = [Color::Red, Color::Yellow, Color::Green, Color::Blue];

    /// Lowercase name used in the text form.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = CardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Color::Red),
            "yellow" => Ok(Color::Yellow),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            other => Err(CardParseError::Color(other.to_string())),
        }
    }
}

/// Card rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Number card, 0 through 9.
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl Rank {
    /// Wild and Wild Draw Four.
    #[must_use]
    pub const fn is_wild(self) -> bool {
        matches!(self, Rank::Wild | Rank::WildDrawFour)
    }

    /// Cards that add to the pending draw count.
    #[must_use]
    pub const fn draw_penalty(self) -> u32 {
        match self {
            Rank::DrawTwo => 2,
            Rank::WildDrawFour => 4,
            _ => 0,
        }
    }

    /// Text form of the rank.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Rank::Number(n) => n.to_string(),
            Rank::Skip => "skip".to_string(),
            Rank::Reverse => "reverse".to_string(),
            Rank::DrawTwo => "draw_two".to_string(),
            Rank::Wild => "wild".to_string(),
            Rank::WildDrawFour => "wild_draw_four".to_string(),
        }
    }
}

/// Errors from parsing card text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardParseError {
    #[error("unknown color `{0}`")]
    Color(String),
    #[error("unknown rank `{0}`")]
    Rank(String),
    #[error("`{0}` is not a card")]
    Card(String),
}

/// An UNO card.
///
/// Fields are private so that only valid cards exist: colored cards never
/// carry a wild rank and wild cards never carry a color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Card {
    color: Option<Color>,
    rank: Rank,
}

impl Card {
    /// A colored card.
    ///
    /// Panics on wild ranks or on numbers above 9; use [`Card::wild`] and
    /// [`Card::wild_draw_four`] for the wild family.
    #[must_use]
    pub fn new(color: Color, rank: Rank) -> Self {
        assert!(!rank.is_wild(), "wild ranks carry no color");
        if let Rank::Number(n) = rank {
            assert!(n <= 9, "number cards run 0..=9");
        }
        Self {
            color: Some(color),
            rank,
        }
    }

    /// Number card shorthand.
    #[must_use]
    pub fn number(color: Color, n: u8) -> Self {
        Self::new(color, Rank::Number(n))
    }

    /// Wild card.
    #[must_use]
    pub const fn wild() -> Self {
        Self {
            color: None,
            rank: Rank::Wild,
        }
    }

    /// Wild Draw Four card.
    #[must_use]
    pub const fn wild_draw_four() -> Self {
        Self {
            color: None,
            rank: Rank::WildDrawFour,
        }
    }

    /// Printed color; `None` for the wild family.
    #[must_use]
    pub const fn color(self) -> Option<Color> {
        self.color
    }

    #[must_use]
    pub const fn rank(self) -> Rank {
        self.rank
    }

    #[must_use]
    pub const fn is_wild(self) -> bool {
        self.rank.is_wild()
    }

    /// Color used for matching when this card is on top of the discard pile.
    #[must_use]
    pub fn effective_color(self, active_color: Color) -> Color {
        self.color.unwrap_or(active_color)
    }

    /// Whether this card may be played on `top` given the active color.
    ///
    /// Wild-family cards always match; other cards match on color or rank.
    #[must_use]
    pub fn matches(self, top: Card, active_color: Color) -> bool {
        if self.is_wild() {
            return true;
        }
        self.color == Some(top.effective_color(active_color)) || self.rank == top.rank
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color {
            Some(color) => write!(f, "{}_{}", color, self.rank.name()),
            None => f.write_str(&self.rank.name()),
        }
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn parse_rank(s: &str) -> Result<Rank, CardParseError> {
    match s {
        "skip" => Ok(Rank::Skip),
        "reverse" => Ok(Rank::Reverse),
        "draw_two" | "draw_2" | "draw2" | "drawtwo" | "+2" => Ok(Rank::DrawTwo),
        digit if digit.len() == 1 && digit.as_bytes()[0].is_ascii_digit() => {
            Ok(Rank::Number(digit.as_bytes()[0] - b'0'))
        }
        other => Err(CardParseError::Rank(other.to_string())),
    }
}

impl FromStr for Card {
    type Err = CardParseError;

    /// Parse the text form. Separators may be `_`, `-` or spaces, case is
    /// ignored, and `+2`, `draw2`, `wild4`, `+4` are accepted as aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");

        match normalized.as_str() {
            "" => return Err(CardParseError::Card(s.to_string())),
            "wild" => return Ok(Card::wild()),
            "wild_draw_four" | "wild_draw_4" | "wild4" | "wild_4" | "+4" | "wild_+4" => {
                return Ok(Card::wild_draw_four())
            }
            _ => {}
        }

        let (color, rank) = normalized
            .split_once('_')
            .ok_or_else(|| CardParseError::Card(s.to_string()))?;
        let color: Color = color.parse()?;
        Ok(Card::new(color, parse_rank(rank)?))
    }
}

impl TryFrom<String> for Card {
    type Error = CardParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_text_form() {
        assert_eq!(Card::number(Color::Red, 7).to_string(), "red_7");
        assert_eq!(Card::new(Color::Blue, Rank::Skip).to_string(), "blue_skip");
        assert_eq!(
            Card::new(Color::Yellow, Rank::DrawTwo).to_string(),
            "yellow_draw_two"
        );
        assert_eq!(Card::wild().to_string(), "wild");
        assert_eq!(Card::wild_draw_four().to_string(), "wild_draw_four");
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("RED 7".parse::<Card>(), Ok(Card::number(Color::Red, 7)));
        assert_eq!(
            "green-reverse".parse::<Card>(),
            Ok(Card::new(Color::Green, Rank::Reverse))
        );
        assert_eq!(
            "blue +2".parse::<Card>(),
            Ok(Card::new(Color::Blue, Rank::DrawTwo))
        );
        assert_eq!("Wild Draw Four".parse::<Card>(), Ok(Card::wild_draw_four()));
        assert_eq!("+4".parse::<Card>(), Ok(Card::wild_draw_four()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "purple_3".parse::<Card>(),
            Err(CardParseError::Color("purple".to_string()))
        );
        assert_eq!(
            "red_12".parse::<Card>(),
            Err(CardParseError::Rank("12".to_string()))
        );
        assert!("skip".parse::<Card>().is_err());
        assert!("".parse::<Card>().is_err());
    }

    #[test]
    fn test_matching() {
        let top = Card::number(Color::Red, 5);

        assert!(Card::number(Color::Red, 9).matches(top, Color::Red));
        assert!(Card::number(Color::Blue, 5).matches(top, Color::Red));
        assert!(!Card::number(Color::Blue, 6).matches(top, Color::Red));
        assert!(Card::wild().matches(top, Color::Red));
    }

    #[test]
    fn test_matching_wild_top_uses_active_color() {
        let top = Card::wild();

        assert!(Card::number(Color::Green, 1).matches(top, Color::Green));
        assert!(!Card::number(Color::Red, 1).matches(top, Color::Green));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut cards = vec![
            Card::wild(),
            Card::number(Color::Red, 2),
            Card::new(Color::Blue, Rank::Skip),
            Card::number(Color::Green, 0),
        ];
        cards.sort();

        let names: Vec<_> = cards.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["blue_skip", "green_0", "red_2", "wild"]);
    }

    #[test]
    fn test_serde_uses_text_form() {
        let card = Card::new(Color::Yellow, Rank::Reverse);
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, "\"yellow_reverse\"");

        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
        assert!(serde_json::from_str::<Card>("\"red_wild\"").is_err());
    }

    #[test]
    #[should_panic(expected = "wild ranks carry no color")]
    fn test_colored_wild_is_unrepresentable() {
        let _ = Card::new(Color::Red, Rank::Wild);
    }
}
