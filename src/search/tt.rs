//! Transposition table: one 16-byte entry per slot, power-of-two sized,
//! always-replace. The full 64-bit position key is the collision check,
//! so a probe either returns the exact position's entry or nothing.

use crate::board::INFINITY;
use crate::moves::Move;

/// Entry flags. Exactly one primary flag is set per entry; the auxiliary
/// bits qualify how the score was obtained.
pub mod flag {
    pub const CHECKMATE: u8 = 0x01;
    pub const STALEMATE: u8 = 0x02;
    pub const UPPER_BOUND: u8 = 0x04;
    pub const EXACT_SCORE: u8 = 0x08;
    pub const LOWER_BOUND: u8 = 0x10;
    pub const PRIMARY_MASK: u8 = 0x1F;

    /// The stored search was extended at this node.
    pub const EXTENDED: u8 = 0x20;
    /// The entry was stored from a PV node.
    pub const FROM_PV: u8 = 0x40;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TtEntry {
    pub position_key: u64,
    pub move_bits: u32,
    pub score: i16,
    pub depth: u8,
    pub flags: u8,
}

impl TtEntry {
    #[inline(always)]
    pub fn primary_flag(&self) -> u8 {
        self.flags & flag::PRIMARY_MASK
    }

    #[inline(always)]
    pub fn from_pv(&self) -> bool {
        self.flags & flag::FROM_PV != 0
    }

    #[inline(always)]
    pub fn extended(&self) -> bool {
        self.flags & flag::EXTENDED != 0
    }

    #[inline(always)]
    pub fn best_move(&self) -> Move {
        Move::from_bits(self.move_bits, self.score as i32)
    }
}

#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: Vec<TtEntry>,
    key_mask: usize,
    stores: u64,
    hits: u64,
    checkmates: u64,
    stalemates: u64,
}

impl TranspositionTable {
    pub fn new() -> TranspositionTable {
        TranspositionTable::default()
    }

    /// Allocate the largest power-of-two entry count that fits in `mbytes`.
    /// Zero megabytes frees the table. Returns false if allocation failed.
    pub fn resize(&mut self, mbytes: i64) -> bool {
        self.entries = Vec::new();
        self.key_mask = 0;

        if mbytes <= 0 {
            return true;
        }

        let bytes = (mbytes as usize).saturating_mul(1024 * 1024);
        let count = bytes / std::mem::size_of::<TtEntry>();
        if count == 0 {
            return false;
        }
        let slots = (count + 1).next_power_of_two() >> 1;
        if slots < 2 {
            return false;
        }

        let mut entries = Vec::new();
        if entries.try_reserve_exact(slots).is_err() {
            return false;
        }
        entries.resize(slots, TtEntry::default());

        self.key_mask = slots - 1;
        self.entries = entries;
        self.reset_counters();
        true
    }

    pub fn clear(&mut self) {
        self.reset_counters();
        self.entries.fill(TtEntry::default());
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    pub fn probe(&mut self, key: u64) -> Option<TtEntry> {
        if key != 0 && !self.entries.is_empty() {
            let entry = self.entries[(key as usize) & self.key_mask];
            if entry.position_key == key {
                self.hits += 1;
                return Some(entry);
            }
        }
        None
    }

    /// Always-replace store of a scored best move.
    pub fn store(&mut self, key: u64, best: Move, depth: i32, primary: u8, aux: u8) {
        debug_assert!(best.is_valid());
        debug_assert!(best.score().abs() < INFINITY);
        debug_assert!((0..256).contains(&depth));
        debug_assert!(
            primary == flag::LOWER_BOUND
                || primary == flag::UPPER_BOUND
                || primary == flag::EXACT_SCORE
        );

        if key != 0 && !self.entries.is_empty() {
            self.stores += 1;
            self.entries[(key as usize) & self.key_mask] = TtEntry {
                position_key: key,
                move_bits: best.bits(),
                score: best.score() as i16,
                depth: depth as u8,
                flags: primary | aux,
            };
        }
    }

    pub fn store_checkmate(&mut self, key: u64) {
        if key != 0 && !self.entries.is_empty() {
            self.checkmates += 1;
            self.entries[(key as usize) & self.key_mask] = TtEntry {
                position_key: key,
                move_bits: 0,
                score: INFINITY as i16,
                depth: 0,
                flags: flag::CHECKMATE,
            };
        }
    }

    pub fn store_stalemate(&mut self, key: u64) {
        if key != 0 && !self.entries.is_empty() {
            self.stalemates += 1;
            self.entries[(key as usize) & self.key_mask] = TtEntry {
                position_key: key,
                move_bits: 0,
                score: 0,
                depth: 0,
                flags: flag::STALEMATE,
            };
        }
    }

    pub fn reset_counters(&mut self) {
        self.stores = 0;
        self.hits = 0;
        self.checkmates = 0;
        self.stalemates = 0;
    }

    pub fn stores(&self) -> u64 {
        self.stores
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn checkmates(&self) -> u64 {
        self.checkmates
    }

    pub fn stalemates(&self) -> u64 {
        self.stalemates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_rounds_down_to_power_of_two() {
        let mut tt = TranspositionTable::new();
        assert!(tt.resize(1));
        let one_mb = 1024 * 1024 / std::mem::size_of::<TtEntry>();
        assert_eq!(tt.capacity(), one_mb.next_power_of_two());
        assert!(tt.capacity().is_power_of_two());

        assert!(tt.resize(3));
        assert!(tt.capacity().is_power_of_two());
        assert!(tt.capacity() * std::mem::size_of::<TtEntry>() <= 3 * 1024 * 1024);

        assert!(tt.resize(0));
        assert_eq!(tt.capacity(), 0);
        assert!(tt.probe(0xABCD).is_none());
    }
}
