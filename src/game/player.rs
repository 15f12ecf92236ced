use std::fmt;

use serde::{Deserialize, Serialize};

use super::cards::Card;

/// Opaque player identity, stable for the life of a game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Ordered collection of cards held by one player. Lookups go through card
/// identity (color + figure) so a wild requested as `wr` still finds the
/// bare wild in hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Sum of the point values of every held card.
    pub fn total_value(&self) -> u32 {
        self.cards.iter().map(Card::value).sum()
    }

    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn add_all(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.iter().any(|c| c.same_identity(card))
    }

    /// How many copies of this identity the hand holds.
    pub fn count(&self, card: &Card) -> usize {
        self.cards.iter().filter(|c| c.same_identity(card)).count()
    }

    /// Remove one copy of the given identity, returning the held card.
    pub fn remove(&mut self, card: &Card) -> Option<Card> {
        let pos = self.cards.iter().position(|c| c.same_identity(card))?;
        Some(self.cards.remove(pos))
    }
}

/// A seated player. Two players are the same player iff their identities
/// match; hands never take part in the comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    hand: Hand,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            hand: Hand::new(),
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub(crate) fn hand_mut(&mut self) -> &mut Hand {
        &mut self.hand
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}
