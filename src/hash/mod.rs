pub mod zobrist;

pub use zobrist::{piece_hash, position_key, state_ep_hash, zobrist_keys, ZobristKeys};
