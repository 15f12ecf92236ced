pub mod mocks;

use jedna::game::{Card, Game, PlayerId};

pub fn card(notation: &str) -> Card {
    notation.parse().expect("test notation is valid")
}

pub fn cards(notations: &[&str]) -> Vec<Card> {
    notations.iter().map(|n| card(n)).collect()
}

/// A running two-or-more player game with forced hands and top card.
pub fn game_with(hands: &[(&str, &[&str])], top: &str) -> Game {
    Game::from_setup(
        "test-game",
        hands
            .iter()
            .map(|(id, hand)| (PlayerId::from(*id), cards(hand)))
            .collect(),
        card(top),
    )
    .expect("test setup uses cards from the standard composition")
}

pub fn pid(id: &str) -> PlayerId {
    PlayerId::from(id)
}
