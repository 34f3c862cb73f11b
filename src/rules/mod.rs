//! UNO rules: moves, validation, player views and the transition function.
//!
//! ## Key Types
//!
//! - `Move`: a proposed play, draw, Uno call or challenge answer
//! - `RejectReason`: the closed set of reasons a move can be refused
//! - `TableView`: what the validator reads; implemented by `GameState` and `PlayerView`
//! - `PlayerView`: one player's projection of the table
//! - `UnoEngine`: deals games and applies validated moves

pub mod engine;
pub mod moves;
pub mod validator;
pub mod view;

pub use engine::{RulesError, UnoEngine};
pub use moves::{Move, RejectReason};
pub use validator::{legal_moves, playable_cards, validate, TableView};
pub use view::{PlayerView, RECENT_EVENTS};
