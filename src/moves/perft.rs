//! Perft: legal-move leaf counting to validate the generator. The root
//! iterates moves in coordinate order and logs a divide-style subtotal per
//! move, which is what you diff against a known-good engine when a count
//! is off.

use crate::engine::{Engine, MAX_PLIES};
use crate::error::EngineError;

impl Engine {
    /// Count leaf nodes of the legal move tree to `depth`.
    pub fn perft(&mut self, depth: i32) -> Result<u64, EngineError> {
        if !self.is_initialized() {
            return Err(EngineError::NotInitialized);
        }
        self.init_search();

        let depth = depth.min(MAX_PLIES as i32);
        let count = self.perft_root(depth);

        let msecs = self.start_time.elapsed().as_millis() as u64;
        let kleafs_per_sec = if msecs > 0 { count / msecs } else { 0 };
        tracing::info!(depth, leafs = count, msecs, kleafs_per_sec, "perft");
        Ok(count)
    }

    fn perft_root(&mut self, depth: i32) -> u64 {
        self.generate_moves(0, false, depth);
        self.nodes[0]
            .moves
            .sort_by_key(|mv| mv.to_string());

        let mut count = 0u64;
        if depth > 1 && self.has_child(0) {
            for idx in 0..self.nodes[0].moves.len() {
                if self.stopped() {
                    break;
                }
                let mv = self.nodes[0].moves[idx];
                self.exec(0, mv);
                let subtotal = self.perft_search(1, depth - 1);
                self.undo(0, mv);
                tracing::debug!(%mv, subtotal, "perft divide");
                count += subtotal;
            }
        } else {
            for mv in &self.nodes[0].moves {
                tracing::debug!(%mv, subtotal = 1u64, "perft divide");
                count += 1;
            }
        }
        count
    }

    fn perft_search(&mut self, ply: usize, depth: i32) -> u64 {
        self.generate_moves(ply, false, depth);
        if !self.has_child(ply) || depth <= 1 {
            return self.nodes[ply].moves.len() as u64;
        }

        let mut count = 0u64;
        for idx in 0..self.nodes[ply].moves.len() {
            if self.stopped() {
                break;
            }
            let mv = self.nodes[ply].moves[idx];
            self.exec(ply, mv);
            count += self.perft_search(ply + 1, depth - 1);
            self.undo(ply, mv);
        }
        count
    }
}
