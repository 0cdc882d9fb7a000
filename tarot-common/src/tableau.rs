use crate::card::Card;
use crate::error::GameError;

use smallvec::SmallVec;

const COLUMN_SIZE: usize = 24;

pub type Run = SmallVec<[Card; COLUMN_SIZE]>;

/// One of the 11 tableau columns, stored bottom to top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Column {
    cards: SmallVec<[Card; COLUMN_SIZE]>,
}

impl Column {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn top(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Pushes without an adjacency check. Only for building the initial
    /// deal and for codec decoding.
    pub fn push_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn can_place(&self, card: &Card) -> bool {
        match self.top() {
            None => true,
            Some(top) => top.is_adjacent_to(card),
        }
    }

    pub fn place(&mut self, card: Card) -> Result<(), GameError> {
        if !self.can_place(&card) {
            return Err(GameError::IllegalState(
                "card cannot rest on the top of the destination column",
            ));
        }
        self.cards.push(card);
        Ok(())
    }

    /// Places a run card by card, in the order returned by `take_run`.
    pub fn place_run(&mut self, run: &[Card]) -> Result<(), GameError> {
        for card in run {
            self.place(*card)?;
        }
        Ok(())
    }

    pub fn take_card(&mut self) -> Result<Card, GameError> {
        self.cards
            .pop()
            .ok_or(GameError::IllegalState("cannot take cards from an empty column"))
    }

    /// Removes the maximal suffix of mutually adjacent cards and returns it
    /// top first, the order in which the cards promote or re-stack.
    pub fn take_run(&mut self) -> Result<Run, GameError> {
        let top = self
            .cards
            .last()
            .copied()
            .ok_or(GameError::IllegalState("cannot take cards from an empty column"))?;
        let mut run = Run::new();
        run.push(top);
        let mut index = self.cards.len() - 1;
        while index > 0 && self.cards[index - 1].is_adjacent_to(&self.cards[index]) {
            index -= 1;
            run.push(self.cards[index]);
        }
        self.cards.truncate(index);
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Suit;

    fn column(cards: &[Card]) -> Column {
        let mut column = Column::new();
        for &card in cards {
            column.push_card(card);
        }
        column
    }

    #[test]
    fn test_take_run_maximal_suffix() {
        let mut col = column(&[
            Card::Minor(Suit::Coins, 9),
            Card::Major(5),
            Card::Major(4),
            Card::Major(3),
        ]);
        let run = col.take_run().unwrap();
        assert_eq!(
            run.as_slice(),
            &[Card::Major(3), Card::Major(4), Card::Major(5)]
        );
        assert_eq!(col.cards(), &[Card::Minor(Suit::Coins, 9)]);
    }

    #[test]
    fn test_take_run_whole_column() {
        let mut col = column(&[Card::Major(7), Card::Major(6)]);
        let run = col.take_run().unwrap();
        assert_eq!(run.as_slice(), &[Card::Major(6), Card::Major(7)]);
        assert!(col.is_empty());
    }

    #[test]
    fn test_take_run_single_card() {
        let mut col = column(&[Card::Major(9), Card::Minor(Suit::Wands, 2)]);
        let run = col.take_run().unwrap();
        assert_eq!(run.as_slice(), &[Card::Minor(Suit::Wands, 2)]);
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn test_take_from_empty_column() {
        let mut col = Column::new();
        assert!(col.take_card().is_err());
        assert!(col.take_run().is_err());
    }

    #[test]
    fn test_place_requires_adjacency() {
        let mut col = column(&[Card::Major(5)]);
        col.place(Card::Major(6)).unwrap();
        assert!(col.place(Card::Major(9)).is_err());
        assert!(col.place(Card::Minor(Suit::Coins, 7)).is_err());

        let mut empty = Column::new();
        empty.place(Card::Minor(Suit::Coins, 7)).unwrap();
    }

    #[test]
    fn test_place_run_reverses_onto_destination() {
        // Moving the run 3,4,5 (3 exposed) onto a 2 leaves 5 exposed.
        let mut source = column(&[Card::Major(5), Card::Major(4), Card::Major(3)]);
        let mut dest = column(&[Card::Major(2)]);
        let run = source.take_run().unwrap();
        dest.place_run(&run).unwrap();
        assert_eq!(
            dest.cards(),
            &[Card::Major(2), Card::Major(3), Card::Major(4), Card::Major(5)]
        );
    }
}
