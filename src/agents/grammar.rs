//! Reply grammar shared by LLM and human agents.
//!
//! ```text
//! PLAY <card> [<color>]
//! DRAW
//! UNO
//! CHALLENGE YES|NO
//! ```
//!
//! Matching is case-insensitive. The parser takes the first line whose first
//! word is a command, so chatty replies ("Sure! I'll play...\nPLAY red_7")
//! still parse. Markdown decoration and a leading `MOVE:` or `ANSWER:` label
//! are ignored. Cards use their text form (`red_7`, `wild_draw_four`), with
//! spaces, dashes and the usual aliases (`+2`, `draw2`, `wild4`) accepted.
//!
//! ```
//! use uno_arena::agents::grammar::parse_reply;
//! use uno_arena::cards::{Card, Color};
//! use uno_arena::rules::Move;
//!
//! let mv = parse_reply("**MOVE:** play wild draw four blue").unwrap();
//! assert_eq!(mv, Move::play_wild(Card::wild_draw_four(), Color::Blue));
//! ```

use thiserror::Error;

use crate::cards::{Card, Color};
use crate::rules::Move;

/// Why a reply could not be read as a move.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty reply")]
    Empty,
    #[error("no command found (expected PLAY, DRAW, UNO or CHALLENGE), got `{0}`")]
    UnknownCommand(String),
    #[error("PLAY needs a card")]
    MissingCard,
    #[error("`{0}` is not a card")]
    UnknownCard(String),
    #[error("`{0}` is not a color (red, yellow, green, blue)")]
    UnknownColor(String),
    #[error("CHALLENGE needs YES or NO")]
    MissingChallengeAnswer,
    #[error("unexpected trailing input `{0}`")]
    TrailingInput(String),
}

const KEYWORDS: [&str; 4] = ["play", "draw", "uno", "challenge"];
const LABELS: [&str; 2] = ["move:", "answer:"];

/// Parse a free-form reply into a move.
pub fn parse_reply(text: &str) -> Result<Move, ParseError> {
    let mut first_words = None;

    for line in text.lines() {
        let words = clean_line(line);
        let Some(head) = words.first() else {
            continue;
        };
        if KEYWORDS.contains(&head.as_str()) {
            return parse_command(&words);
        }
        first_words.get_or_insert_with(|| words.join(" "));
    }

    match first_words {
        Some(words) => Err(ParseError::UnknownCommand(words)),
        None => Err(ParseError::Empty),
    }
}

/// Lowercase words of one line, with decoration and labels removed.
fn clean_line(line: &str) -> Vec<String> {
    let stripped: String = line
        .chars()
        .map(|c| match c {
            '*' | '`' | '>' | '"' | '\'' | '#' | '|' => ' ',
            other => other.to_ascii_lowercase(),
        })
        .collect();

    let mut rest = stripped.trim_start().trim_start_matches('-').trim_start();
    for label in LABELS {
        if let Some(after) = rest.strip_prefix(label) {
            rest = after;
        }
    }

    rest.split_whitespace()
        .map(|word| word.trim_end_matches(['.', ',', '!', ';', ':']).to_string())
        .filter(|word| !word.is_empty())
        .collect()
}

fn parse_command(words: &[String]) -> Result<Move, ParseError> {
    let args = &words[1..];
    match words[0].as_str() {
        "play" => parse_play(args),
        "draw" => no_arguments(args, Move::DrawCard),
        "uno" => no_arguments(args, Move::CallUno),
        "challenge" => {
            let (answer, rest) = args.split_first().ok_or(ParseError::MissingChallengeAnswer)?;
            let challenge = match answer.as_str() {
                "yes" | "y" | "true" => true,
                "no" | "n" | "false" => false,
                _ => return Err(ParseError::MissingChallengeAnswer),
            };
            no_arguments(rest, Move::ChallengeDrawFour { challenge })
        }
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

fn no_arguments(rest: &[String], mv: Move) -> Result<Move, ParseError> {
    match rest {
        [] => Ok(mv),
        extra => Err(ParseError::TrailingInput(extra.join(" "))),
    }
}

/// `PLAY` arguments: the longest run of words that forms a card, then an
/// optional color.
fn parse_play(args: &[String]) -> Result<Move, ParseError> {
    if args.is_empty() {
        return Err(ParseError::MissingCard);
    }

    let (card, rest) = (1..=args.len())
        .rev()
        .find_map(|split| {
            let card: Card = args[..split].join("_").parse().ok()?;
            Some((card, &args[split..]))
        })
        .ok_or_else(|| ParseError::UnknownCard(args.join(" ")))?;

    match rest {
        [] => Ok(Move::PlayCard {
            card,
            declared_color: None,
        }),
        [color] => {
            let color: Color = color
                .parse()
                .map_err(|_| ParseError::UnknownColor(color.clone()))?;
            Ok(Move::PlayCard {
                card,
                declared_color: Some(color),
            })
        }
        [_, extra @ ..] => Err(ParseError::TrailingInput(extra.join(" "))),
    }
}
