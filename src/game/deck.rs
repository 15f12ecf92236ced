use rand::seq::SliceRandom;
use strum::IntoEnumIterator;

use super::cards::{Card, Color, Figure};

/// Number of cards in the standard set: per color one 0, two each of 1..9,
/// DrawTwo, Skip and Reverse, plus four Wild and four WildDrawFour.
pub const STANDARD_DECK_SIZE: usize = 108;

/// Face-down draw pile. Cards are drawn from the back of the vector.
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// The full 108-card composition, unshuffled.
    pub fn build_standard() -> Self {
        let mut cards = Vec::with_capacity(STANDARD_DECK_SIZE);
        for color in Color::iter().filter(|c| !c.is_wild()) {
            let colored = |figure| {
                Card::new(color, figure).expect("non-wild composition is valid")
            };
            cards.push(colored(Figure::Number(0)));
            for n in 1..=9 {
                cards.push(colored(Figure::Number(n)));
                cards.push(colored(Figure::Number(n)));
            }
            for figure in [Figure::DrawTwo, Figure::Skip, Figure::Reverse] {
                cards.push(colored(figure));
                cards.push(colored(figure));
            }
        }
        for _ in 0..4 {
            cards.push(Card::wild());
            cards.push(Card::wild_draw_four());
        }
        Self { cards }
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Take the top card, if any.
    pub fn draw_top(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Return a card to the bottom of the pile.
    pub fn put_under(&mut self, card: Card) {
        self.cards.insert(0, card);
    }

    /// Draw `n` cards, refilling from `discard` when the pile runs dry: all
    /// but the discard's top card are reclaimed, chosen colors on wilds are
    /// cleared, the batch is shuffled and slid under whatever remains of the
    /// pile. If the combined supply still cannot cover `n`, returns what is
    /// available.
    pub fn draw(&mut self, n: usize, discard: &mut Vec<Card>) -> Vec<Card> {
        if self.cards.len() < n && discard.len() > 1 {
            let mut reclaimed: Vec<Card> =
                discard.drain(..discard.len() - 1).collect();
            for card in &mut reclaimed {
                card.clear_chosen();
            }
            reclaimed.shuffle(&mut rand::rng());
            reclaimed.append(&mut self.cards);
            self.cards = reclaimed;
        }

        let take = n.min(self.cards.len());
        self.cards.split_off(self.cards.len() - take)
    }

    #[cfg(test)]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
