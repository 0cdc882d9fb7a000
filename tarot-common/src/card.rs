use anyhow::{Context, Result, bail};
use std::fmt;

pub const MAJOR_MIN: u8 = 0;
pub const MAJOR_MAX: u8 = 21;
pub const MINOR_MIN: u8 = 1;
pub const MINOR_MAX: u8 = 13;

/// Suits of the minor arcana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Coins,
    Goblets,
    Swords,
    Wands,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Coins, Suit::Goblets, Suit::Swords, Suit::Wands];

    pub fn index(self) -> usize {
        match self {
            Suit::Coins => 0,
            Suit::Goblets => 1,
            Suit::Swords => 2,
            Suit::Wands => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Suit> {
        Suit::ALL.get(index).copied()
    }

    pub fn letter(self) -> char {
        match self {
            Suit::Coins => 'C',
            Suit::Goblets => 'G',
            Suit::Swords => 'S',
            Suit::Wands => 'W',
        }
    }

    pub fn from_letter(letter: char) -> Option<Suit> {
        match letter {
            'C' => Some(Suit::Coins),
            'G' => Some(Suit::Goblets),
            'S' => Some(Suit::Swords),
            'W' => Some(Suit::Wands),
            _ => None,
        }
    }
}

/// A single card: a major arcana valued 0..=21, or a suited minor arcana
/// valued 1..=13.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Card {
    Major(u8),
    Minor(Suit, u8),
}

impl Card {
    /// Two cards are adjacent when one may rest on the other: same variant,
    /// same suit for minors, values differing by exactly 1.
    pub fn is_adjacent_to(&self, other: &Card) -> bool {
        match (self, other) {
            (Card::Major(a), Card::Major(b)) => a.abs_diff(*b) == 1,
            (Card::Minor(sa, a), Card::Minor(sb, b)) => sa == sb && a.abs_diff(*b) == 1,
            _ => false,
        }
    }

    /// Shifts the value by `delta`, preserving variant and suit. Staying in
    /// range is the caller's responsibility.
    pub fn step(&self, delta: i8) -> Card {
        match *self {
            Card::Major(v) => {
                let value = v as i8 + delta;
                debug_assert!((MAJOR_MIN as i8..=MAJOR_MAX as i8).contains(&value));
                Card::Major(value as u8)
            }
            Card::Minor(suit, v) => {
                let value = v as i8 + delta;
                debug_assert!((MINOR_MIN as i8..=MINOR_MAX as i8).contains(&value));
                Card::Minor(suit, value as u8)
            }
        }
    }

    pub fn value(&self) -> u8 {
        match *self {
            Card::Major(v) => v,
            Card::Minor(_, v) => v,
        }
    }

    /// Parses a deal token: a bare number for a major arcana (`"17"`), a
    /// suit letter followed by a value for a minor arcana (`"G12"`).
    pub fn parse(token: &str) -> Result<Card> {
        let token = token.trim();
        if token.is_empty() {
            bail!("empty card token");
        }
        let first = token.chars().next().unwrap_or_default();
        if first.is_ascii_digit() {
            let value: u8 = token
                .parse()
                .with_context(|| format!("invalid major arcana '{token}'"))?;
            if value > MAJOR_MAX {
                bail!("major arcana '{token}' out of range 0..=21");
            }
            Ok(Card::Major(value))
        } else {
            let suit = Suit::from_letter(first)
                .with_context(|| format!("invalid suit letter at card '{token}'"))?;
            let value: u8 = token[1..]
                .parse()
                .with_context(|| format!("invalid minor arcana '{token}'"))?;
            if !(MINOR_MIN..=MINOR_MAX).contains(&value) {
                bail!("minor arcana '{token}' out of range 1..=13");
            }
            Ok(Card::Minor(suit, value))
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Card::Major(v) => write!(f, "{v}"),
            Card::Minor(suit, v) => write!(f, "{}{v}", suit.letter()),
        }
    }
}
