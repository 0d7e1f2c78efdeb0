//! Search counters. Cleared per search, summed into lifetime totals so a
//! long session can report averaged behaviour of the pruning heuristics.

use std::ops::AddAssign;

#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    /// Main search node count.
    pub snodes: u64,
    /// Quiescence node count.
    pub qnodes: u64,
    pub execs: u64,
    pub qexecs: u64,
    pub chk_exts: u64,
    pub one_reply_exts: u64,
    pub hash_exts: u64,
    pub delta_count: u64,
    pub rzr_count: u64,
    pub rzr_cutoffs: u64,
    pub iid_count: u64,
    pub null_moves: u64,
    pub nm_cutoffs: u64,
    pub late_moves: u64,
    pub lm_candidates: u64,
    pub lm_reductions: u64,
    pub lm_researches: u64,
    pub lm_confirmed: u64,
    pub lm_alpha_incs: u64,
    /// Number of searches summed into this instance.
    pub stat_count: u64,
}

impl Stats {
    pub fn clear(&mut self) {
        *self = Stats::default();
    }

    /// Per-search averages of the accumulated totals.
    pub fn average(&self) -> Stats {
        let n = self.stat_count.max(1);
        let mut avg = *self;
        avg.snodes /= n;
        avg.qnodes /= n;
        avg.execs /= n;
        avg.qexecs /= n;
        avg.chk_exts /= n;
        avg.one_reply_exts /= n;
        avg.hash_exts /= n;
        avg.delta_count /= n;
        avg.rzr_count /= n;
        avg.rzr_cutoffs /= n;
        avg.iid_count /= n;
        avg.null_moves /= n;
        avg.nm_cutoffs /= n;
        avg.late_moves /= n;
        avg.lm_candidates /= n;
        avg.lm_reductions /= n;
        avg.lm_researches /= n;
        avg.lm_confirmed /= n;
        avg.lm_alpha_incs /= n;
        avg.stat_count = 1;
        avg
    }

    pub fn log(&self) {
        tracing::debug!(
            snodes = self.snodes,
            qnodes = self.qnodes,
            execs = self.execs,
            qexecs = self.qexecs,
            chk_exts = self.chk_exts,
            one_reply_exts = self.one_reply_exts,
            hash_exts = self.hash_exts,
            delta = self.delta_count,
            razor = self.rzr_count,
            razor_cutoffs = self.rzr_cutoffs,
            iid = self.iid_count,
            null_moves = self.null_moves,
            null_cutoffs = self.nm_cutoffs,
            late_moves = self.late_moves,
            lmr = self.lm_reductions,
            lmr_researches = self.lm_researches,
            lmr_confirmed = self.lm_confirmed,
            "search stats"
        );
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Stats) {
        self.snodes += rhs.snodes;
        self.qnodes += rhs.qnodes;
        self.execs += rhs.execs;
        self.qexecs += rhs.qexecs;
        self.chk_exts += rhs.chk_exts;
        self.one_reply_exts += rhs.one_reply_exts;
        self.hash_exts += rhs.hash_exts;
        self.delta_count += rhs.delta_count;
        self.rzr_count += rhs.rzr_count;
        self.rzr_cutoffs += rhs.rzr_cutoffs;
        self.iid_count += rhs.iid_count;
        self.null_moves += rhs.null_moves;
        self.nm_cutoffs += rhs.nm_cutoffs;
        self.late_moves += rhs.late_moves;
        self.lm_candidates += rhs.lm_candidates;
        self.lm_reductions += rhs.lm_reductions;
        self.lm_researches += rhs.lm_researches;
        self.lm_confirmed += rhs.lm_confirmed;
        self.lm_alpha_incs += rhs.lm_alpha_incs;
        self.stat_count += 1;
    }
}
