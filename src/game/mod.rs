pub mod cards;
pub mod deck;
pub mod engine;
pub mod player;
pub mod view;

pub use cards::{Card, CardError, Color, Figure};
pub use deck::{Deck, STANDARD_DECK_SIZE};
pub use engine::{
    Direction, Game, GameError, GameResult, GameState, Notice, PlayOutcome,
};
pub use player::{Hand, Player, PlayerId};
pub use view::{AvailableAction, GameView, OtherPlayer, WireGameState};
