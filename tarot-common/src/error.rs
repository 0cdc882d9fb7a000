use std::fmt;

/// Errors raised by the board model and the canonical codec.
///
/// The search engine only applies moves it generated itself, so during
/// normal operation none of these fire; they guard direct API misuse and
/// decoding of untrusted byte streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// A column index outside 0..=10.
    OutOfRange { index: usize },
    /// A move or promotion that the current board state forbids.
    IllegalState(&'static str),
    /// A byte stream that cannot be decoded into a card, move or board.
    InvalidEncoding(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::OutOfRange { index } => {
                write!(f, "column index {index} out of range (0..=10)")
            }
            GameError::IllegalState(msg) => write!(f, "{msg}"),
            GameError::InvalidEncoding(msg) => write!(f, "invalid encoding: {msg}"),
        }
    }
}

impl std::error::Error for GameError {}
