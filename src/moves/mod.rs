pub mod execute;
pub mod movegen;
pub mod perft;
pub mod types;

pub use types::{Move, MoveType, HISTORY_SIZE, MAX_MOVES};
