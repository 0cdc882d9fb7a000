//! Board model and move rules for a tarot patience game played with a
//! 74-card deck: 22 major arcana (0..=21) and 4 suits of 13 minor arcana.

pub mod action;
pub mod board;
pub mod card;
pub mod error;
pub mod foundation;
pub mod tableau;
