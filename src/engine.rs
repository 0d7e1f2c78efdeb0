//! The engine context: one object owning the mailbox board, the
//! preallocated node stack, the transposition table, the history table and
//! the repetition multiset. Search, move generation and evaluation are
//! implemented as `impl Engine` blocks in their own modules; everything
//! they share lives here.

use crate::board::{
    color_of, kind_of, CheckState, Color, Position, BISHOP, KING, KNIGHT, PAWN, PIECE_CODES,
    QUEEN, ROOK,
};
use crate::config::{OptionAction, Options};
use crate::error::EngineError;
use crate::moves::{Move, MoveType, HISTORY_SIZE, MAX_MOVES};
use crate::output::{InfoSink, StdoutSink};
use crate::search::stats::Stats;
use crate::search::tt::TranspositionTable;
use crate::square::Square;
use arrayvec::ArrayVec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Depth of the preallocated node stack.
pub const MAX_PLIES: usize = 100;

pub const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Per-ply search record. The root of the current game is node 0; `exec`
/// at ply N writes the resulting position into node N+1.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub pos: Position,
    /// Static eval from the side to move's perspective.
    pub stand_pat: i32,
    /// Plies the search at this node was extended.
    pub extended: i32,
    /// Plies the current move's search was reduced.
    pub reduced: i32,
    pub null_move_ok: bool,
    pub moves: ArrayVec<Move, MAX_MOVES>,
    pub move_index: usize,
    pub killer: [Move; 2],
    pub pv: ArrayVec<Move, MAX_PLIES>,
    /// Indexed by piece code; slots 0 and 1 count non-pawn pieces per color.
    pub piece_count: [i32; PIECE_CODES],
    /// `open_file[color][file]`: no pawn of `color` on `file`.
    pub open_file: [[bool; 8]; 2],
    /// 2 marks a passer, 1 a semi-passer.
    pub passers: [u8; 128],
}

impl Node {
    fn new() -> Node {
        Node {
            pos: Position::default(),
            stand_pat: 0,
            extended: 0,
            reduced: 0,
            null_move_ok: false,
            moves: ArrayVec::new(),
            move_index: 0,
            killer: [Move::NONE; 2],
            pv: ArrayVec::new(),
            piece_count: [0; PIECE_CODES],
            open_file: [[true; 8]; 2],
            passers: [0; 128],
        }
    }
}

/// Clock and depth limits handed to `go`. The engine itself only consumes
/// `depth`; the clock fields are for the adapter's time allocation and are
/// carried here so one struct travels from the command parser to both.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoLimits {
    pub depth: i32,
    pub movestogo: u64,
    pub movetime: u64,
    pub wtime: u64,
    pub winc: u64,
    pub btime: u64,
    pub binc: u64,
    pub infinite: bool,
}

/// Snapshot of the running (or last) search.
#[derive(Debug, Default, Clone)]
pub struct SearchSnapshot {
    pub depth: i32,
    pub seldepth: i32,
    pub nodes: u64,
    pub qnodes: u64,
    pub msecs: u64,
    pub movenum: i32,
    pub currmove: String,
}

pub struct Engine {
    pub(crate) board: [u8; 128],
    pub(crate) nodes: Vec<Node>,
    /// Multiset of position keys on the current path (game + search).
    pub(crate) seen: HashMap<u64, u32>,
    pub(crate) tt: TranspositionTable,
    pub(crate) hist: Box<[i8]>,
    pub(crate) stats: Stats,
    pub(crate) total_stats: Stats,
    pub(crate) opts: Options,
    pub(crate) draw_score: [i32; 2],
    /// Current root iteration depth.
    pub(crate) depth: i32,
    pub(crate) seldepth: i32,
    pub(crate) movenum: i32,
    pub(crate) currmove: String,
    pub(crate) start_time: Instant,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) sink: Box<dyn InfoSink + Send>,
    initialized: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Engine {
        Engine {
            board: [0; 128],
            nodes: Vec::new(),
            seen: HashMap::new(),
            tt: TranspositionTable::new(),
            hist: vec![0i8; HISTORY_SIZE].into_boxed_slice(),
            stats: Stats::default(),
            total_stats: Stats::default(),
            opts: Options::default(),
            draw_score: [0; 2],
            depth: 0,
            seldepth: 0,
            movenum: 0,
            currmove: String::new(),
            start_time: Instant::now(),
            stop: Arc::new(AtomicBool::new(false)),
            sink: Box::new(StdoutSink),
            initialized: false,
        }
    }

    /// Allocate the node stack and transposition table, then load the
    /// start position. Must run before `go`, `perft` or `make_move`.
    pub fn initialize(&mut self) {
        self.nodes = (0..=MAX_PLIES).map(|_| Node::new()).collect();
        self.clear_history();
        self.set_hash_size(self.opts.hash_mb);
        self.initialized = true;
        self.set_position(STARTPOS)
            .expect("start position must parse");
        tracing::info!(hash_mb = self.opts.hash_mb, "engine initialized");
    }

    #[inline(always)]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Apply a UCI option by name. The hash options take effect here; the
    /// rest are plain value updates read by the next search.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        match self.opts.set(name, value)? {
            OptionAction::None => Ok(()),
            OptionAction::ClearHash => {
                self.tt.clear();
                Ok(())
            }
            OptionAction::ResizeHash(mb) => {
                if self.tt.resize(mb) {
                    Ok(())
                } else {
                    Err(EngineError::AllocationFailure(mb))
                }
            }
        }
    }

    /// Resize the transposition table; on failure the engine keeps running
    /// without one.
    pub fn set_hash_size(&mut self, mbytes: i64) {
        if !self.tt.resize(mbytes) {
            tracing::warn!(mbytes, "cannot allocate hash table");
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn InfoSink + Send>) {
        self.sink = sink;
    }

    /// Current stop flag. The search polls it at recursion boundaries.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Install a fresh stop flag and return it, so a stale timer from a
    /// previous search can never abort the next one.
    pub fn reset_stop(&mut self) -> Arc<AtomicBool> {
        self.stop = Arc::new(AtomicBool::new(false));
        Arc::clone(&self.stop)
    }

    #[inline(always)]
    pub(crate) fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn white_to_move(&self) -> bool {
        self.nodes[0].pos.white_to_move()
    }

    /// Root position state.
    pub fn position(&self) -> &Position {
        &self.nodes[0].pos
    }

    /// Raw mailbox snapshot, for invariant checks.
    pub fn board_snapshot(&self) -> [u8; 128] {
        self.board
    }

    /// Static eval of the root position from the side to move.
    pub fn stand_pat(&self) -> i32 {
        self.nodes[0].stand_pat
    }

    pub fn get_stats(&self) -> SearchSnapshot {
        SearchSnapshot {
            depth: self.depth,
            seldepth: self.seldepth,
            nodes: self.stats.snodes + self.stats.qnodes,
            qnodes: self.stats.qnodes,
            msecs: self.start_time.elapsed().as_millis() as u64,
            movenum: self.movenum,
            currmove: self.currmove.clone(),
        }
    }

    pub fn reset_stats_totals(&mut self) {
        self.total_stats.clear();
    }

    /// Averaged per-search totals, for end-of-session reporting.
    pub fn stats_totals(&self) -> Stats {
        self.total_stats.average()
    }

    pub fn clear_hash(&mut self) {
        self.tt.clear();
    }

    pub fn clear_history(&mut self) {
        self.hist.fill(0);
    }

    pub fn clear_killers(&mut self) {
        for node in &mut self.nodes {
            node.killer = [Move::NONE; 2];
        }
    }

    /// Reset everything learned between games.
    pub fn clear_search_data(&mut self) {
        self.clear_hash();
        self.clear_history();
        self.clear_killers();
    }

    /// Stop any running search and free the transposition table.
    pub fn quit(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.set_hash_size(0);
    }

    /// Legal moves in the game position, best-scored first order not
    /// guaranteed.
    pub fn legal_moves(&mut self) -> Vec<Move> {
        self.generate_moves(0, false, 1);
        self.nodes[0].moves.to_vec()
    }

    /// Apply a coordinate move (`e2e4`, `e7e8q`) to the game position.
    /// Returns the unconsumed remainder of the input.
    pub fn make_move<'a>(&mut self, input: &'a str) -> Result<&'a str, EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        let err = || EngineError::InvalidMove(input.trim().to_string());
        let b = input.as_bytes();
        if b.len() < 4 {
            return Err(err());
        }
        let from = parse_square(b[0], b[1]).ok_or_else(err)?;
        let to = parse_square(b[2], b[3]).ok_or_else(err)?;

        let color = self.nodes[0].pos.to_move();
        let mut consumed = 4;
        let promo = match b.get(4).copied() {
            Some(b'b') => {
                consumed = 5;
                color.piece(BISHOP)
            }
            Some(b'n') => {
                consumed = 5;
                color.piece(KNIGHT)
            }
            Some(b'q') => {
                consumed = 5;
                color.piece(QUEEN)
            }
            Some(b'r') => {
                consumed = 5;
                color.piece(ROOK)
            }
            _ => 0,
        };
        if b.get(consumed).is_some_and(|c| !c.is_ascii_whitespace()) {
            return Err(err());
        }

        let pc = self.board[from.index()];
        let cap = self.board[to.index()];
        if pc == 0
            || from == to
            || color_of(pc) != color
            || (cap != 0 && color_of(cap) == color)
            || kind_of(cap) == KING
            || kind_of(promo) == PAWN
            || kind_of(promo) == KING
            || (promo != 0 && kind_of(pc) != PAWN)
        {
            return Err(err());
        }

        self.generate_moves(0, false, 1);
        let found = self.nodes[0]
            .moves
            .iter()
            .find(|m| m.from() == from && m.to() == to && m.promo() == promo)
            .copied();
        let Some(mv) = found else {
            return Err(err());
        };

        self.commit_game_move(mv);
        Ok(&input[consumed..])
    }

    /// Execute a move at the game root and make the child position the new
    /// root. The parent key stays in the seen set as game history.
    pub(crate) fn commit_game_move(&mut self, mv: Move) {
        self.exec(0, mv);
        self.nodes[0].pos = self.nodes[1].pos;
        self.evaluate(0);
    }

    /// Rank-by-rank diagram with the headline position facts.
    pub fn board_string(&self) -> String {
        use crate::board::{CASTLE_BK, CASTLE_BQ, CASTLE_MASK, CASTLE_WK, CASTLE_WQ, DRAW_BIT};
        let pos = &self.nodes[0].pos;
        let mut out = String::new();
        for rank in (0u8..8).rev() {
            for file in 0u8..8 {
                let sq = Square::at(file, rank);
                let pc = self.board[sq.index()];
                out.push(' ');
                out.push(piece_char(pc).unwrap_or(if (file ^ rank) & 1 == 1 { '-' } else { ' ' }));
            }
            match rank {
                7 => out.push_str(if pos.white_to_move() {
                    "  White to move"
                } else {
                    "  Black to move"
                }),
                6 if pos.state & DRAW_BIT != 0 => out.push_str("  DRAW"),
                5 => out.push_str(&format!("  Move Number       : {}", pos.mcount / 2)),
                4 => out.push_str(&format!("  Reversible Moves  : {}", pos.rcount)),
                3 => {
                    out.push_str("  Castling Rights   : ");
                    if pos.state & CASTLE_MASK != 0 {
                        if pos.state & CASTLE_WK != 0 {
                            out.push('K');
                        }
                        if pos.state & CASTLE_WQ != 0 {
                            out.push('Q');
                        }
                        if pos.state & CASTLE_BK != 0 {
                            out.push('k');
                        }
                        if pos.state & CASTLE_BQ != 0 {
                            out.push('q');
                        }
                    } else {
                        out.push('-');
                    }
                }
                2 => {
                    out.push_str("  En Passant Square : ");
                    match pos.ep {
                        Some(sq) => out.push_str(&sq.to_string()),
                        None => out.push('-'),
                    }
                }
                0 => {
                    let eval = if pos.white_to_move() {
                        self.nodes[0].stand_pat
                    } else {
                        -self.nodes[0].stand_pat
                    };
                    out.push_str(&format!("  Static Evaluation : {eval}"));
                }
                _ => {}
            }
            out.push('\n');
        }
        out
    }

    // ----- shared node plumbing -----

    #[inline(always)]
    pub(crate) fn has_child(&self, ply: usize) -> bool {
        ply + 1 < self.nodes.len()
    }

    /// Lazily resolve whether the side to move is in check at this node.
    pub(crate) fn in_check(&mut self, ply: usize) -> bool {
        let pos = self.nodes[ply].pos;
        match pos.check_state {
            CheckState::InCheck => true,
            CheckState::NotInCheck => false,
            CheckState::Unknown => {
                let color = pos.to_move();
                let attacked = self.attacked_by(!color, pos.king[color.idx()]);
                self.nodes[ply].pos.check_state = if attacked {
                    CheckState::InCheck
                } else {
                    CheckState::NotInCheck
                };
                attacked
            }
        }
    }

    /// Draw by the flag set in evaluation, the fifty-move rule, or a
    /// repetition of any position on the current path.
    #[inline(always)]
    pub(crate) fn is_draw(&self, ply: usize) -> bool {
        use crate::board::DRAW_BIT;
        let pos = &self.nodes[ply].pos;
        pos.state & DRAW_BIT != 0
            || pos.rcount >= 100
            || self.seen.contains_key(&pos.position_key)
    }

    /// Selection-sort step: pick the best-scored remaining move.
    pub(crate) fn next_move(&mut self, ply: usize) -> Option<Move> {
        let node = &mut self.nodes[ply];
        if node.move_index >= node.moves.len() {
            return None;
        }
        let mut best = node.move_index;
        for i in (node.move_index + 1)..node.moves.len() {
            if node.moves[i].score() > node.moves[best].score() {
                best = i;
            }
        }
        if best > node.move_index {
            node.moves.swap(node.move_index, best);
        }
        let mv = node.moves[node.move_index];
        node.move_index += 1;
        Some(mv)
    }

    pub(crate) fn scoot_move_to_front(&mut self, ply: usize, idx: usize) {
        self.nodes[ply].moves[..=idx].rotate_right(1);
    }

    /// Adopt `mv` plus the child's PV as this node's PV.
    pub(crate) fn update_pv(&mut self, ply: usize, mv: Move) {
        if ply + 1 < self.nodes.len() {
            let (head, tail) = self.nodes.split_at_mut(ply + 1);
            let node = &mut head[ply];
            let child = &tail[0];
            node.pv.clear();
            node.pv.push(mv);
            for &m in child.pv.iter().take(MAX_PLIES - 1) {
                node.pv.push(m);
            }
        } else {
            let node = &mut self.nodes[ply];
            node.pv.clear();
            node.pv.push(mv);
        }
    }

    #[inline(always)]
    pub(crate) fn set_pv1(&mut self, ply: usize, mv: Move) {
        let node = &mut self.nodes[ply];
        node.pv.clear();
        node.pv.push(mv);
    }

    pub(crate) fn add_killer(&mut self, ply: usize, mv: Move) {
        let node = &mut self.nodes[ply];
        if mv != node.killer[0] {
            node.killer[1] = node.killer[0];
            node.killer[0] = mv;
        }
    }

    #[inline(always)]
    pub(crate) fn is_killer(&self, ply: usize, mv: Move) -> bool {
        let node = &self.nodes[ply];
        mv == node.killer[0] || mv == node.killer[1]
    }

    /// Reward a quiet move that improved alpha or cut off.
    pub(crate) fn inc_history(&mut self, mv: Move, check: bool, depth: i32) {
        if !check && depth > 0 {
            let idx = mv.history_index();
            let val = self.hist[idx] as i32 + depth + 2;
            self.hist[idx] = val.min(40) as i8;
        }
    }

    /// Penalize a quiet move that was searched and failed.
    pub(crate) fn dec_history(&mut self, mv: Move, check: bool) {
        if !check {
            let idx = mv.history_index();
            let val = self.hist[idx] as i32 - 1;
            self.hist[idx] = val.max(-2) as i8;
        }
    }

    /// Full recompute of the piece key, for parity checks.
    pub fn compute_piece_key(&self) -> u64 {
        let mut key = 0u64;
        for sq in Square::all() {
            let pc = self.board[sq.index()];
            if pc != 0 {
                key ^= crate::hash::piece_hash(pc, sq);
            }
        }
        key
    }

    /// Full recompute of one side's material, for parity checks.
    pub fn compute_material(&self, color: Color) -> i32 {
        let mut total = 0;
        for sq in Square::all() {
            let pc = self.board[sq.index()];
            if pc != 0 && color_of(pc) == color && kind_of(pc) != KING {
                total += crate::board::value_of(pc);
            }
        }
        total
    }

    /// Debug-build sanity check on a move about to execute at `ply`.
    pub(crate) fn validate_move(&self, ply: usize, mv: Move) -> bool {
        let pos = &self.nodes[ply].pos;
        let color = pos.to_move();
        if !mv.is_valid() {
            return false;
        }
        let from = mv.from();
        let to = mv.to();
        let pc = self.board[from.index()];
        if pc == 0 || color_of(pc) != color || pc != mv.pc() {
            return false;
        }
        let cap = mv.cap();
        if cap != 0 && (kind_of(cap) == KING || color_of(cap) == color) {
            return false;
        }
        match mv.move_type() {
            MoveType::Invalid => false,
            MoveType::Normal => {
                self.board[to.index()] == cap
                    && mv.promo() == 0
                    && match kind_of(pc) {
                        KNIGHT => from.knight_jump_to(to),
                        BISHOP => matches!(from.ray_to(to), Some(d) if crate::square::DIAG_DIRS.contains(&d)),
                        ROOK => matches!(from.ray_to(to), Some(d) if crate::square::LATERAL_DIRS.contains(&d)),
                        QUEEN => from.ray_to(to).is_some(),
                        _ => false,
                    }
            }
            MoveType::PawnPush => {
                kind_of(pc) == PAWN
                    && cap == 0
                    && to.offset(-color.pawn_dir()) == Some(from)
                    && (mv.promo() != 0) == (to.rank() == color.promo_rank())
            }
            MoveType::PawnLung => {
                kind_of(pc) == PAWN
                    && cap == 0
                    && mv.promo() == 0
                    && from.rank() == color.pawn_rank()
            }
            MoveType::PawnCapture => {
                kind_of(pc) == PAWN
                    && cap != 0
                    && self.board[to.index()] == cap
                    && (mv.promo() != 0) == (to.rank() == color.promo_rank())
            }
            MoveType::EnPassant => {
                kind_of(pc) == PAWN && mv.promo() == 0 && pos.ep == Some(to)
            }
            MoveType::KingMove => {
                kind_of(pc) == KING && mv.promo() == 0 && from.distance(to) == 1
            }
            MoveType::CastleShort | MoveType::CastleLong => {
                kind_of(pc) == KING && cap == 0 && mv.promo() == 0
            }
        }
    }
}

fn parse_square(file: u8, rank: u8) -> Option<Square> {
    let f = file.wrapping_sub(b'a');
    let r = rank.wrapping_sub(b'1');
    if f > 7 || r > 7 {
        return None;
    }
    Some(Square::at(f, r))
}

pub(crate) fn piece_char(pc: u8) -> Option<char> {
    use crate::board::Color::*;
    let c = match (color_of(pc), kind_of(pc)) {
        (White, PAWN) => 'P',
        (White, KNIGHT) => 'N',
        (White, BISHOP) => 'B',
        (White, ROOK) => 'R',
        (White, QUEEN) => 'Q',
        (White, KING) => 'K',
        (Black, PAWN) => 'p',
        (Black, KNIGHT) => 'n',
        (Black, BISHOP) => 'b',
        (Black, ROOK) => 'r',
        (Black, QUEEN) => 'q',
        (Black, KING) => 'k',
        _ => return None,
    };
    Some(c)
}
