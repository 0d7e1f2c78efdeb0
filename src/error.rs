//! Errors surfaced to the adapter. None of these mutate board state: a
//! rejected FEN or move leaves the previous position in place.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed FEN: bad character, missing king, illegal ep rank, or a
    /// position where the side to move could capture the enemy king.
    InvalidFen(String),
    /// Malformed or illegal coordinate move.
    InvalidMove(String),
    /// Go/Perft called before Initialize.
    NotInitialized,
    /// Transposition table allocation failed for the given megabytes.
    AllocationFailure(i64),
    UnknownOption(String),
    InvalidOptionValue { name: &'static str, value: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidFen(msg) => write!(f, "invalid fen: {msg}"),
            EngineError::InvalidMove(mv) => write!(f, "invalid move: {mv}"),
            EngineError::NotInitialized => write!(f, "engine not initialized"),
            EngineError::AllocationFailure(mb) => {
                write!(f, "cannot allocate hash table of {mb} MB")
            }
            EngineError::UnknownOption(name) => write!(f, "unknown option: {name}"),
            EngineError::InvalidOptionValue { name, value } => {
                write!(f, "invalid value for option {name}: {value}")
            }
        }
    }
}

impl Error for EngineError {}
