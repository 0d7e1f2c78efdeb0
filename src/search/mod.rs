pub mod eval;
pub mod psq;
pub mod search;
pub mod see;
pub mod stats;
pub mod tt;

pub use stats::Stats;
pub use tt::{TranspositionTable, TtEntry};
