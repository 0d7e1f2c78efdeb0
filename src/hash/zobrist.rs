//! Zobrist hashing over (piece code, mailbox square).
//!
//! The table has one 128-entry row per piece code. Rows 0 and 1 hold no
//! pieces, so row 0 is reused for the non-piece hash terms: indices 0..31
//! cover the five hashed state bits (side to move + castling rights) and
//! the en passant square hashes through its own mailbox index. Index 0x7F
//! stands in for "no en passant square"; it can never collide with a real
//! ep square (rank 3 or 6) nor with the state-bit range.

use crate::board::{Position, HASHED_STATE_MASK, PIECE_CODES};
use crate::square::Square;
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

const EP_NONE_IDX: usize = 0x7F;

#[cfg(feature = "deterministic_zobrist")]
const ZOBRIST_SEED: u64 = 0xC2B2_AE3D_27D4_EB4F;

fn make_zobrist_rng() -> StdRng {
    #[cfg(feature = "deterministic_zobrist")]
    {
        StdRng::seed_from_u64(ZOBRIST_SEED)
    }
    #[cfg(not(feature = "deterministic_zobrist"))]
    {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    }
}

pub struct ZobristKeys {
    /// `[piece code][mailbox square]`; row 0 doubles as state/ep row.
    pub codes: [[u64; 128]; PIECE_CODES],
}

/// Global keys, generated on first use.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| {
        let mut rng = make_zobrist_rng();
        // zero keys would make distinct positions hash alike too easily
        let mut non_zero = || loop {
            let v = rng.next_u64();
            if v != 0 {
                return v;
            }
        };
        let mut keys = ZobristKeys {
            codes: [[0u64; 128]; PIECE_CODES],
        };
        for row in keys.codes.iter_mut() {
            for slot in row.iter_mut() {
                *slot = non_zero();
            }
        }
        keys
    })
}

#[inline(always)]
pub fn piece_hash(pc: u8, sq: Square) -> u64 {
    zobrist_keys().codes[pc as usize][sq.index()]
}

/// Hash contribution of the non-piece state: the five hashed state bits
/// and the en passant square.
#[inline(always)]
pub fn state_ep_hash(state: u8, ep: Option<Square>) -> u64 {
    let keys = zobrist_keys();
    let ep_idx = ep.map_or(EP_NONE_IDX, Square::index);
    keys.codes[0][(state & HASHED_STATE_MASK) as usize] ^ keys.codes[0][ep_idx]
}

/// Full position key for a given piece key and state.
#[inline(always)]
pub fn position_key(pos: &Position) -> u64 {
    pos.piece_key ^ state_ep_hash(pos.state, pos.ep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CASTLE_WK, SIDE_BIT};

    #[test]
    fn keys_are_stable_and_non_zero() {
        let a = zobrist_keys();
        let b = zobrist_keys();
        assert!(std::ptr::eq(a, b));
        assert!(a.codes.iter().flatten().all(|&k| k != 0));
    }

    #[test]
    fn state_terms_differ() {
        let base = state_ep_hash(0, None);
        assert_ne!(base, state_ep_hash(SIDE_BIT, None));
        assert_ne!(base, state_ep_hash(CASTLE_WK, None));
        assert_ne!(base, state_ep_hash(0, Some(Square::at(4, 2))));
    }
}
