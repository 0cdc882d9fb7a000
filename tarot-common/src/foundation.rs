use crate::card::{MAJOR_MAX, MAJOR_MIN, MINOR_MAX, MINOR_MIN, Suit};
use crate::error::GameError;

/// The two-ended major arcana foundation. Cards promote from 0 upward on
/// the left end and from 21 downward on the right end until the ends meet.
///
/// `left == right` (both set) is the merged sentinel: all 22 majors are
/// promoted and the single meeting card is recorded once, on both ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MajorFoundation {
    pub left: Option<u8>,
    pub right: Option<u8>,
}

impl MajorFoundation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_merged(&self) -> bool {
        self.left.is_some() && self.left == self.right
    }

    fn accepts_left(&self, value: u8) -> bool {
        match self.left {
            None => value == MAJOR_MIN,
            Some(left) => value == left + 1,
        }
    }

    fn accepts_right(&self, value: u8) -> bool {
        match self.right {
            None => value == MAJOR_MAX,
            Some(right) => right > 0 && value == right - 1,
        }
    }

    pub fn can_promote(&self, value: u8) -> bool {
        if self.is_merged() {
            return false;
        }
        self.accepts_left(value) || self.accepts_right(value)
    }

    /// Promotes a major arcana, updating whichever ends accept it. At the
    /// final card both ends accept and the foundation merges.
    pub fn promote(&mut self, value: u8) -> Result<(), GameError> {
        if !self.can_promote(value) {
            return Err(GameError::IllegalState(
                "major arcana ineligible for promotion",
            ));
        }
        if self.accepts_left(value) {
            self.left = Some(value);
        }
        if self.accepts_right(value) {
            self.right = Some(value);
        }
        Ok(())
    }
}

/// A single ascending minor arcana stack, one per suit, starting at the Ace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinorStack {
    pub suit: Suit,
    pub top: u8,
}

impl MinorStack {
    pub fn new(suit: Suit) -> Self {
        Self {
            suit,
            top: MINOR_MIN,
        }
    }

    pub fn can_promote(&self, suit: Suit, value: u8) -> bool {
        suit == self.suit && self.top < MINOR_MAX && value == self.top + 1
    }

    /// The suit check takes priority over any value check, and a full stack
    /// is reported distinctly from a value mismatch.
    pub fn promote(&mut self, suit: Suit, value: u8) -> Result<(), GameError> {
        if suit != self.suit {
            return Err(GameError::IllegalState("minor arcana suit mismatch"));
        }
        if self.top >= MINOR_MAX {
            return Err(GameError::IllegalState("minor arcana foundation full"));
        }
        if value != self.top + 1 {
            return Err(GameError::IllegalState(
                "minor arcana ineligible for promotion",
            ));
        }
        self.top = value;
        Ok(())
    }
}

/// The four minor arcana stacks, indexed by suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinorFoundation {
    stacks: [MinorStack; 4],
}

impl Default for MinorFoundation {
    fn default() -> Self {
        Self::new()
    }
}

impl MinorFoundation {
    pub fn new() -> Self {
        Self {
            stacks: [
                MinorStack::new(Suit::Coins),
                MinorStack::new(Suit::Goblets),
                MinorStack::new(Suit::Swords),
                MinorStack::new(Suit::Wands),
            ],
        }
    }

    pub fn top(&self, suit: Suit) -> u8 {
        self.stacks[suit.index()].top
    }

    pub fn set_top(&mut self, suit: Suit, top: u8) {
        self.stacks[suit.index()].top = top;
    }

    pub fn can_promote(&self, suit: Suit, value: u8) -> bool {
        self.stacks[suit.index()].can_promote(suit, value)
    }

    pub fn promote(&mut self, suit: Suit, value: u8) -> Result<(), GameError> {
        self.stacks[suit.index()].promote(suit, value)
    }

    pub fn is_full(&self) -> bool {
        self.stacks.iter().all(|s| s.top == MINOR_MAX)
    }
}
