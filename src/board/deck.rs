use crate::CardId;
use rand::seq::SliceRandom;

/// the dealer's card stock. owned exclusively by the dealer thread,
/// shrinks as cards hit the table, reshuffled between rounds.
#[derive(Debug)]
pub struct Deck {
    stock: Vec<CardId>,
}

impl Deck {
    pub fn new(size: usize) -> Self {
        Self {
            stock: (0..size).collect(),
        }
    }

    /// uniformly random permutation of whatever is left
    pub fn shuffle(&mut self) {
        self.stock.shuffle(&mut rand::rng());
    }

    /// next card off the top, if any
    pub fn draw(&mut self) -> Option<CardId> {
        self.stock.pop()
    }

    pub fn remaining(&self) -> &[CardId] {
        &self.stock
    }

    pub fn len(&self) -> usize {
        self.stock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_every_card_once() {
        let mut deck = Deck::new(81);
        deck.shuffle();
        assert_eq!(deck.len(), 81);
        let mut seen = vec![false; 81];
        while let Some(card) = deck.draw() {
            assert!(!seen[card]);
            seen[card] = true;
        }
        assert!(seen.into_iter().all(|s| s));
        assert!(deck.is_empty());
        assert_eq!(deck.len(), 0);
    }

    #[test]
    fn shuffle_preserves_the_stock() {
        let mut deck = Deck::new(30);
        for _ in 0..10 {
            deck.draw();
        }
        let mut before = deck.remaining().to_vec();
        deck.shuffle();
        let mut after = deck.remaining().to_vec();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }
}
