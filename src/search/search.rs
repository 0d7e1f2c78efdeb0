//! Quiescence search, the main alpha-beta search and the iterative
//! deepening root driver. The recursion walks the preallocated node
//! stack; `exec` at ply N materializes the child position in node N+1 and
//! `undo` restores the shared board on the way back up.
//!
//! Cancellation is cooperative: the stop flag is polled after every child
//! call and the current node then returns beta, a value its caller will
//! not trust further than the already-completed work.

use crate::board::{kind_of, INFINITY, MATE_SCORE, PAWN, WINNING_SCORE};
use crate::engine::{Engine, GoLimits, MAX_PLIES};
use crate::error::EngineError;
use crate::moves::Move;
use crate::search::tt::flag;

impl Engine {
    /// Quiescence search: stand pat or resolve captures, promotions and
    /// (at depth 0) quiet checks. In check, every evasion is searched.
    pub(crate) fn qsearch(&mut self, ply: usize, mut alpha: i32, beta: i32, depth: i32) -> i32 {
        debug_assert!(alpha < beta);
        debug_assert!(alpha.abs() <= INFINITY && beta.abs() <= INFINITY);
        debug_assert!(depth <= 0);

        self.stats.qnodes += 1;
        if ply as i32 > self.seldepth {
            self.seldepth = ply as i32;
        }

        self.nodes[ply].pv.clear();
        let pos = self.nodes[ply].pos;
        let color = pos.to_move();
        if self.is_draw(ply) {
            return self.draw_score[color.idx()];
        }

        let check = self.in_check(ply);
        let stand_pat = self.nodes[ply].stand_pat;
        let mut best = if check {
            ply as i32 - INFINITY
        } else {
            stand_pat
        };
        if best >= beta || !self.has_child(ply) {
            return best;
        }
        if best > alpha {
            alpha = best;
        }

        let mut first_move = Move::NONE;
        if let Some(entry) = self.tt.probe(pos.position_key) {
            match entry.primary_flag() {
                flag::CHECKMATE => return ply as i32 - INFINITY,
                flag::STALEMATE => return self.draw_score[color.idx()],
                flag::UPPER_BOUND => {
                    first_move = entry.best_move();
                    debug_assert!(self.validate_move(ply, first_move));
                    if (entry.score as i32) <= alpha {
                        self.set_pv1(ply, first_move);
                        return entry.score as i32;
                    }
                }
                flag::EXACT_SCORE => {
                    first_move = entry.best_move();
                    debug_assert!(self.validate_move(ply, first_move));
                    self.set_pv1(ply, first_move);
                    if (entry.score as i32) >= beta && !first_move.is_cap_or_promo() {
                        self.add_killer(ply, first_move);
                    }
                    return entry.score as i32;
                }
                flag::LOWER_BOUND => {
                    first_move = entry.best_move();
                    debug_assert!(self.validate_move(ply, first_move));
                    if (entry.score as i32) >= beta {
                        self.set_pv1(ply, first_move);
                        if !first_move.is_cap_or_promo() {
                            self.add_killer(ply, first_move);
                        }
                        return entry.score as i32;
                    }
                }
                _ => debug_assert!(false, "corrupt tt flags"),
            }
            // quiet hash moves are not volatile; drop them unless in check
            if !check && !first_move.is_cap_or_promo() {
                first_move = Move::NONE;
            }
        }

        let orig_alpha = alpha;
        if first_move.is_valid() {
            self.stats.qexecs += 1;
            self.exec(ply, first_move);
            let score = -self.qsearch(ply + 1, -beta, -alpha, depth - 1);
            self.undo(ply, first_move);
            if self.stopped() {
                return beta;
            }
            if score >= best {
                best = score;
                let fm = first_move.with_score(score);
                self.update_pv(ply, fm);
                if score >= beta {
                    if !fm.is_cap_or_promo() {
                        self.add_killer(ply, fm);
                    }
                    if check {
                        self.tt
                            .store(pos.position_key, fm.with_score(beta), 0, flag::LOWER_BOUND, 0);
                    }
                    return best;
                }
                if score > alpha {
                    alpha = score;
                }
            }
        }

        self.generate_moves(ply, true, depth);
        if self.nodes[ply].moves.is_empty() {
            debug_assert!(!first_move.is_valid());
            if check {
                // no evasions: mate, and worth remembering
                self.tt.store_checkmate(pos.position_key);
                return ply as i32 - INFINITY;
            }
            // quiet position, not necessarily stalemate: there may be
            // non-volatile moves we never generated
            return stand_pat;
        }

        let delta = self.opts.delta_margin;
        while let Some(mv) = self.next_move(ply) {
            if mv == first_move {
                continue;
            }
            self.stats.qexecs += 1;
            self.exec(ply, mv);

            if delta != 0
                && !check
                && depth < 0
                && mv.promo() == 0
                && stand_pat + crate::board::value_of(mv.cap()) + delta <= alpha
                && !self.in_check(ply + 1)
            {
                self.undo(ply, mv);
                if self.stopped() {
                    return beta;
                }
                self.stats.delta_count += 1;
                continue;
            }

            let score = -self.qsearch(ply + 1, -beta, -alpha, depth - 1);
            self.undo(ply, mv);
            if self.stopped() {
                return beta;
            }

            if score > best {
                best = score;
                let mvs = mv.with_score(score);
                self.update_pv(ply, mvs);
                if score >= beta {
                    if !mvs.is_cap_or_promo() {
                        self.add_killer(ply, mvs);
                    }
                    if check {
                        self.tt.store(
                            pos.position_key,
                            mvs.with_score(beta),
                            0,
                            flag::LOWER_BOUND,
                            0,
                        );
                    }
                    return best;
                }
                if score > alpha {
                    alpha = score;
                }
            }
        }

        debug_assert!(best <= alpha && alpha < beta);

        // in-check nodes searched every reply, so the result is bookable
        if check && !self.nodes[ply].pv.is_empty() {
            let pv0 = self.nodes[ply].pv[0];
            if alpha > orig_alpha {
                self.tt
                    .store(pos.position_key, pv0, 0, flag::EXACT_SCORE, 0);
            } else {
                self.tt
                    .store(pos.position_key, pv0.with_score(alpha), 0, flag::UPPER_BOUND, 0);
            }
        }

        best
    }

    /// Principal variation search with check extensions, razoring, null
    /// move pruning, internal iterative deepening, one-reply extensions
    /// and late move reductions.
    pub(crate) fn search(
        &mut self,
        ply: usize,
        mut alpha: i32,
        beta: i32,
        mut depth: i32,
        cut_node: bool,
    ) -> i32 {
        debug_assert!(ply >= 1);
        debug_assert!(alpha < beta);
        debug_assert!(alpha.abs() <= INFINITY && beta.abs() <= INFINITY);
        debug_assert!(depth > 0);

        self.stats.snodes += 1;
        {
            let node = &mut self.nodes[ply];
            node.extended = 0;
            node.reduced = 0;
            node.moves.clear();
            node.move_index = 0;
            node.pv.clear();
        }

        let pos = self.nodes[ply].pos;
        let color = pos.to_move();
        if self.is_draw(ply) {
            return self.draw_score[color.idx()];
        }

        // mate distance pruning
        let mut best = ply as i32 - INFINITY;
        if best >= beta || !self.has_child(ply) {
            return best;
        }
        if best > alpha {
            alpha = best;
        }

        let check = self.in_check(ply);
        if self.opts.check_extensions && check && self.nodes[ply - 1].extended == 0 {
            self.stats.chk_exts += 1;
            self.nodes[ply].extended += 1;
            depth += 1;
        }

        let pv_node = alpha + 1 != beta;
        let stand_pat = self.nodes[ply].stand_pat;
        let mut first_move = Move::NONE;

        if let Some(entry) = self.tt.probe(pos.position_key) {
            let entry_score = entry.score as i32;
            let entry_depth = entry.depth as i32;
            match entry.primary_flag() {
                flag::CHECKMATE => return ply as i32 - INFINITY,
                flag::STALEMATE => return self.draw_score[color.idx()],
                flag::UPPER_BOUND => {
                    first_move = entry.best_move();
                    debug_assert!(self.validate_move(ply, first_move));
                    if entry_depth >= depth
                        && entry_score <= alpha
                        && (!pv_node || entry.from_pv())
                    {
                        self.set_pv1(ply, first_move);
                        return entry_score;
                    }
                    if entry_depth >= depth - 3 && entry_score < beta {
                        self.nodes[ply].null_move_ok = false;
                    }
                }
                flag::EXACT_SCORE => {
                    first_move = entry.best_move();
                    debug_assert!(self.validate_move(ply, first_move));
                    if entry_depth >= depth {
                        self.set_pv1(ply, first_move);
                        if entry_score >= beta && !first_move.is_cap_or_promo() {
                            self.inc_history(first_move, check, entry_depth);
                            self.add_killer(ply, first_move);
                        }
                        return entry_score;
                    }
                    if entry_depth >= depth - 3 && entry_score < beta {
                        self.nodes[ply].null_move_ok = false;
                    }
                }
                flag::LOWER_BOUND => {
                    first_move = entry.best_move();
                    debug_assert!(self.validate_move(ply, first_move));
                    if entry_depth >= depth
                        && entry_score >= beta
                        && (!pv_node || entry.from_pv())
                    {
                        self.set_pv1(ply, first_move);
                        if !first_move.is_cap_or_promo() {
                            self.inc_history(first_move, check, entry_depth);
                            self.add_killer(ply, first_move);
                        }
                        return entry_score;
                    }
                }
                _ => debug_assert!(false, "corrupt tt flags"),
            }
            if entry.extended() && self.nodes[ply].extended == 0 && self.nodes[ply - 1].extended == 0
            {
                self.stats.hash_exts += 1;
                self.nodes[ply].extended += 1;
                depth += 1;
            }
        }

        // razoring: far below alpha at the frontier, let quiescence prove
        // there is no saving tactic
        if self.opts.razor_margin != 0
            && !check
            && !pv_node
            && !first_move.is_valid()
            && depth <= 2
            && alpha.abs() < WINNING_SCORE
            && stand_pat + self.opts.razor_margin + 64 * (depth - 1) <= alpha
        {
            self.stats.rzr_count += 1;
            let eval = self.qsearch(ply, alpha, beta, 0);
            if self.stopped() {
                return beta;
            }
            if eval <= alpha {
                self.stats.rzr_cutoffs += 1;
                return eval;
            }
        }

        // null move: hand the opponent a free shot; surviving it above
        // beta ends the node
        if self.opts.nmp
            && self.nodes[ply].null_move_ok
            && !check
            && !pv_node
            && depth > 1
            && stand_pat >= beta
            && beta.abs() < WINNING_SCORE
            && self.nodes[ply].piece_count[color.idx()] > 1
        {
            self.exec_null(ply);
            self.nodes[ply + 1].null_move_ok = false;
            let rdepth =
                0.max(depth - 3 - depth / 6 - i32::from(stand_pat - beta >= 400));
            let eval = if rdepth > 0 {
                -self.search(ply + 1, -beta, 1 - beta, rdepth, false)
            } else {
                -self.qsearch(ply + 1, -beta, 1 - beta, 0)
            };
            if self.stopped() {
                return beta;
            }
            if eval >= beta {
                self.nodes[ply].pv.clear();
                self.stats.nm_cutoffs += 1;
                return beta;
            }
        }

        // internal iterative deepening to get a first move when the table
        // has none
        if self.opts.iid
            && !check
            && !first_move.is_valid()
            && beta < INFINITY
            && depth > if pv_node { 3 } else { 5 }
        {
            self.stats.iid_count += 1;
            let saved = self.nodes[ply].null_move_ok;
            self.nodes[ply].null_move_ok = false;
            let eval = self.search(ply, beta - 1, beta, depth - if pv_node { 2 } else { 4 }, true);
            self.nodes[ply].null_move_ok = saved;
            if self.stopped() || self.nodes[ply].pv.is_empty() {
                return eval;
            }
            first_move = self.nodes[ply].pv[0];
        }

        if !first_move.is_valid() {
            self.generate_moves(ply, false, depth);
            if self.nodes[ply].moves.is_empty() {
                if check {
                    self.tt.store_checkmate(pos.position_key);
                    return ply as i32 - INFINITY;
                }
                self.tt.store_stalemate(pos.position_key);
                return self.draw_score[color.idx()];
            }
            first_move = self.next_move(ply).expect("non-empty move list");
            if self.opts.one_reply_extensions
                && self.nodes[ply].moves.len() == 1
                && self.nodes[ply].extended == 0
            {
                self.stats.one_reply_exts += 1;
                self.nodes[ply].extended += 1;
                depth += 1;
            }
        }

        // the first move gets the full window
        let orig_alpha = alpha;
        self.exec(ply, first_move);
        self.nodes[ply + 1].null_move_ok = true;
        let mut eval = if depth > 1 {
            -self.search(ply + 1, -beta, -alpha, depth - 1, !cut_node)
        } else {
            -self.qsearch(ply + 1, -beta, -alpha, 0)
        };
        self.undo(ply, first_move);
        if self.stopped() {
            return beta;
        }
        if eval > alpha {
            alpha = eval;
        }
        if eval >= best {
            best = eval;
            let fm = first_move.with_score(eval);
            self.update_pv(ply, fm);
            if eval >= beta {
                if !fm.is_cap_or_promo() {
                    self.inc_history(fm, check, depth);
                    self.add_killer(ply, fm);
                }
                let aux = self.aux_flags(ply, pv_node);
                self.tt
                    .store(pos.position_key, fm.with_score(beta), depth, flag::LOWER_BOUND, aux);
                return best;
            }
        } else if !first_move.is_cap_or_promo() {
            self.dec_history(first_move, check);
        }

        if self.nodes[ply].moves.is_empty() {
            self.generate_moves(ply, false, depth);
            debug_assert!(!self.nodes[ply].moves.is_empty());
            if self.opts.one_reply_extensions
                && self.nodes[ply].moves.len() == 1
                && self.nodes[ply].extended == 0
            {
                self.stats.one_reply_exts += 1;
                self.nodes[ply].extended += 1;
                depth += 1;
            }
        }

        let lmr = self.opts.lmr;
        let lmr_ok = lmr != 0 && !pv_node && !check && depth > lmr + 1;
        let mut pv_depth = depth;

        self.nodes[ply].move_index = 0;
        while let Some(mv) = self.next_move(ply) {
            if mv == first_move {
                continue;
            }

            self.exec(ply, mv);

            self.stats.late_moves += 1;
            if lmr_ok {
                self.stats.lm_candidates += 1;
            }

            // reduce quiet, unexciting, historically poor moves
            let mut reduced = 0;
            if lmr_ok
                && !mv.is_cap_or_promo()
                && !self.is_killer(ply, mv)
                && !(kind_of(mv.pc()) == PAWN && mv.to().rank() == color.seventh_rank())
                && !self.in_check(ply + 1)
                && self.hist[mv.history_index()] < 0
            {
                self.stats.lm_reductions += 1;
                reduced = lmr;
                if depth > reduced + 1 && self.hist[mv.history_index()] < -1 {
                    reduced += 1;
                }
            }
            self.nodes[ply].reduced = reduced;

            // null window first: most late moves just need refuting
            let new_depth = depth - 1 - reduced;
            self.nodes[ply + 1].null_move_ok = true;
            eval = if new_depth > 0 {
                -self.search(ply + 1, -(alpha + 1), -alpha, new_depth, true)
            } else {
                -self.qsearch(ply + 1, -(alpha + 1), -alpha, 0)
            };
            self.nodes[ply + 1].null_move_ok = false;

            // a reduced move that improves alpha must prove it at full depth
            if !self.stopped() && reduced > 0 && eval > alpha {
                self.stats.lm_researches += 1;
                reduced = 0;
                self.nodes[ply].reduced = 0;
                eval = -self.search(ply + 1, -(alpha + 1), -alpha, depth - 1, false);
                if !self.stopped() && eval > alpha {
                    self.stats.lm_confirmed += 1;
                }
            }

            if !self.stopped() && pv_node && eval > alpha {
                eval = if depth > 1 {
                    -self.search(ply + 1, -beta, -alpha, depth - 1, false)
                } else {
                    -self.qsearch(ply + 1, -beta, -alpha, 0)
                };
            }

            self.undo(ply, mv);
            if self.stopped() {
                return beta;
            }
            if eval > alpha {
                alpha = eval;
                self.stats.lm_alpha_incs += 1;
            }
            if eval > best {
                best = eval;
                let mvs = mv.with_score(eval);
                self.update_pv(ply, mvs);
                pv_depth = depth - reduced;
                if eval >= beta {
                    if !mvs.is_cap_or_promo() {
                        self.inc_history(mvs, check, pv_depth);
                        self.add_killer(ply, mvs);
                    }
                    let aux = self.aux_flags(ply, pv_node);
                    self.tt.store(
                        pos.position_key,
                        mvs.with_score(beta),
                        pv_depth,
                        flag::LOWER_BOUND,
                        aux,
                    );
                    return best;
                }
            } else if !mv.is_cap_or_promo() {
                self.dec_history(mv, check);
            }
        }

        debug_assert!(best <= alpha && alpha < beta);

        if !self.nodes[ply].pv.is_empty() {
            let pv0 = self.nodes[ply].pv[0].with_score(alpha);
            self.nodes[ply].pv[0] = pv0;
            let aux = self.aux_flags(ply, pv_node);
            if alpha > orig_alpha {
                if !pv0.is_cap_or_promo() {
                    self.inc_history(pv0, check, pv_depth);
                }
                self.tt
                    .store(pos.position_key, pv0, pv_depth, flag::EXACT_SCORE, aux);
            } else {
                self.tt
                    .store(pos.position_key, pv0, pv_depth, flag::UPPER_BOUND, aux);
            }
        }

        best
    }

    #[inline(always)]
    fn aux_flags(&self, ply: usize, pv_node: bool) -> u8 {
        let mut aux = 0;
        if self.nodes[ply].extended > 0 {
            aux |= flag::EXTENDED;
        }
        if pv_node {
            aux |= flag::FROM_PV;
        }
        aux
    }

    /// Iterative deepening with aspiration windows. Returns the best move
    /// in coordinate notation, or `None` when there is no legal move.
    pub(crate) fn search_root(&mut self, max_depth: i32) -> Option<String> {
        self.nodes[0].extended = 0;
        self.nodes[0].reduced = 0;

        self.generate_moves(0, false, 1);
        if self.nodes[0].moves.is_empty() {
            self.sink.send("info string no legal moves");
            return None;
        }
        // selection-sort the root list by initial score
        while self.next_move(0).is_some() {}

        if self.nodes[0].moves.len() > 1
            && let Some(entry) = self.tt.probe(self.nodes[0].pos.position_key)
        {
            let primary = entry.primary_flag();
            if primary == flag::UPPER_BOUND
                || primary == flag::EXACT_SCORE
                || primary == flag::LOWER_BOUND
            {
                let tt_move = entry.best_move();
                if let Some(idx) = self.nodes[0].moves.iter().position(|m| *m == tt_move) {
                    self.scoot_move_to_front(0, idx);
                }
            }
        }

        let first = self.nodes[0].moves[0];
        self.set_pv1(0, first);
        if self.nodes[0].moves.len() == 1 {
            self.output_pv(first.score(), 0);
            return Some(first.to_string());
        }

        let mut show_pv = true;
        let mut best = self.nodes[0].stand_pat;

        for d in 0..max_depth {
            if self.stopped() {
                break;
            }
            self.depth = d + 1;
            self.seldepth = d + 1;
            self.nodes[1].null_move_ok = d > 0;

            show_pv = true;
            let mut delta = 25;
            let mut alpha = (best - delta).max(-INFINITY);
            let mut beta = (best + delta).min(INFINITY);

            let mut idx = 0;
            while !self.stopped() && idx < self.nodes[0].moves.len() {
                let mv = self.nodes[0].moves[idx];
                self.currmove = mv.to_string();
                self.movenum = idx as i32 + 1;

                self.exec(0, mv);
                let mut score;
                loop {
                    score = if self.depth > 1 {
                        -self.search(1, -beta, -alpha, self.depth - 1, false)
                    } else {
                        -self.qsearch(1, -beta, -alpha, 0)
                    };

                    // fail high, or fail low on the expected best: widen
                    // the window and try again
                    if !self.stopped() && (score >= beta || (score <= alpha && self.movenum == 1)) {
                        delta *= 20;
                        if score >= beta {
                            beta = (score + delta).min(INFINITY);
                            if self.start_time.elapsed().as_millis() > 1000 {
                                self.output_pv(score, 1);
                            }
                        } else {
                            alpha = (score - delta).max(-INFINITY);
                            if self.start_time.elapsed().as_millis() > 1000 {
                                self.output_pv(score, -1);
                            }
                        }
                        continue;
                    }
                    delta = 25;
                    break;
                }
                self.undo(0, mv);
                self.nodes[0].moves[idx].set_score(score);

                if !self.stopped() && (self.movenum == 1 || score > best) {
                    let mvs = mv.with_score(score);
                    self.update_pv(0, mvs);
                    self.output_pv(score, 0);
                    show_pv = false;
                    self.tt.store(
                        self.nodes[0].pos.position_key,
                        mvs,
                        self.depth,
                        flag::EXACT_SCORE,
                        flag::FROM_PV,
                    );

                    // null aspiration window around the new best
                    best = score;
                    alpha = score;
                    beta = alpha + 1;
                    self.scoot_move_to_front(0, idx);
                }
                idx += 1;
            }
        }

        if show_pv {
            self.output_pv(self.nodes[0].pv[0].score(), 0);
        }
        Some(self.nodes[0].pv[0].to_string())
    }

    /// Emit an `info` line for the current PV or aspiration bound.
    /// `bound`: 0 exact, +1 lowerbound, -1 upperbound.
    pub(crate) fn output_pv(&mut self, score: i32, bound: i32) {
        if self.nodes[0].pv.is_empty() {
            return;
        }
        let msecs = self.start_time.elapsed().as_millis() as u64;
        let nodes = self.stats.snodes + self.stats.qnodes;
        let nps = if msecs > 0 { nodes * 1000 / msecs } else { 0 };

        let mut line = format!(
            "info depth {} seldepth {} nodes {} time {} nps {}",
            self.depth, self.seldepth, nodes, msecs, nps
        );
        if bound != 0 {
            line.push_str(&format!(
                " currmovenumber {} currmove {}",
                self.movenum, self.currmove
            ));
        }
        if score.abs() < MATE_SCORE {
            line.push_str(&format!(" score cp {score}"));
        } else {
            let plies = INFINITY - score.abs();
            let mate = (plies + 1) / 2;
            line.push_str(&format!(
                " score mate {}",
                if score < 0 { -mate } else { mate }
            ));
        }
        match bound {
            b if b < 0 => line.push_str(" upperbound"),
            b if b > 0 => line.push_str(" lowerbound"),
            _ => {
                line.push_str(" pv");
                for mv in &self.nodes[0].pv {
                    line.push(' ');
                    line.push_str(&mv.to_string());
                }
            }
        }
        self.sink.send(&line);
    }

    /// Reset the per-search bookkeeping and the draw score for the side
    /// to move.
    pub(crate) fn init_search(&mut self) {
        self.currmove.clear();
        self.stats.clear();
        self.tt.reset_counters();
        self.depth = 0;
        self.movenum = 0;
        self.seldepth = 0;
        let stm = self.nodes[0].pos.to_move();
        self.draw_score[stm.idx()] = -self.opts.contempt;
        self.draw_score[stm.opposite().idx()] = self.opts.contempt;
        self.start_time = std::time::Instant::now();
    }

    /// Search the current position and return the best move found, if
    /// any. Only `limits.depth` is consumed here; the clock fields are
    /// the adapter's business (it arms the stop flag).
    pub fn go(&mut self, limits: &GoLimits) -> Result<Option<String>, EngineError> {
        if !self.is_initialized() {
            return Err(EngineError::NotInitialized);
        }
        self.init_search();

        let mut depth = limits.depth.min(MAX_PLIES as i32);
        if depth <= 0 {
            depth = MAX_PLIES as i32;
        }

        let best = self.search_root(depth);

        self.total_stats += self.stats;
        tracing::debug!(
            stores = self.tt.stores(),
            hits = self.tt.hits(),
            checkmates = self.tt.checkmates(),
            stalemates = self.tt.stalemates(),
            "tt counters"
        );
        self.stats.log();
        Ok(best)
    }
}
