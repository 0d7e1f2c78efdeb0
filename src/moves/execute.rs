//! Make and unmake. `exec` applies a move to the board and writes the
//! resulting position into the child node, updating the Zobrist keys
//! incrementally per move type; `undo` restores only the board squares,
//! since the parent node's state was never touched. The parent's position
//! key enters the repetition multiset on exec and leaves it on undo.

use crate::board::{
    color_of, touched_castle_rights, value_of, CheckState, Color, BLACK_CASTLE_MASK, ROOK,
    SIDE_BIT, WHITE_CASTLE_MASK,
};
use crate::engine::Engine;
use crate::hash::{piece_hash, state_ep_hash};
use crate::moves::{Move, MoveType};
use crate::square::Square;

impl Engine {
    /// Execute `mv` on the position at `ply`; the resulting position lands
    /// in node `ply + 1` and gets a fresh static evaluation.
    pub(crate) fn exec(&mut self, ply: usize, mv: Move) {
        debug_assert!(self.validate_move(ply, mv), "exec of invalid move {mv}");

        let pos = self.nodes[ply].pos;
        let color = pos.to_move();
        let from = mv.from();
        let to = mv.to();
        let pc = mv.pc();
        let cap = mv.cap();
        let promo = mv.promo();

        self.stats.execs += 1;
        *self.seen.entry(pos.position_key).or_insert(0) += 1;

        let mut dest = pos;
        dest.ep = None;
        dest.mcount = pos.mcount + 1;
        dest.state = pos.state ^ SIDE_BIT;
        dest.check_state = CheckState::Unknown;

        match mv.move_type() {
            MoveType::Invalid => {
                tracing::error!(%mv, "cannot execute invalid move");
                return;
            }
            MoveType::Normal => {
                self.board[from.index()] = 0;
                self.board[to.index()] = pc;
                dest.material[color.opposite().idx()] -= value_of(cap);
                dest.rcount = if cap != 0 { 0 } else { pos.rcount + 1 };
                dest.state &= !touched_castle_rights(from.index());
                dest.state &= !touched_castle_rights(to.index());
                dest.piece_key = pos.piece_key ^ piece_hash(pc, from) ^ piece_hash(pc, to);
                if cap != 0 {
                    dest.piece_key ^= piece_hash(cap, to);
                }
            }
            MoveType::PawnPush => {
                let placed = if promo != 0 { promo } else { pc };
                self.board[from.index()] = 0;
                self.board[to.index()] = placed;
                if promo != 0 {
                    dest.material[color.idx()] =
                        pos.material[color.idx()] - crate::board::PAWN_VALUE + value_of(promo);
                }
                dest.rcount = 0;
                dest.piece_key = pos.piece_key ^ piece_hash(pc, from) ^ piece_hash(placed, to);
            }
            MoveType::PawnLung => {
                self.board[from.index()] = 0;
                self.board[to.index()] = pc;
                dest.rcount = 0;
                dest.ep = from.offset(color.pawn_dir());
                dest.piece_key = pos.piece_key ^ piece_hash(pc, from) ^ piece_hash(pc, to);
            }
            MoveType::PawnCapture => {
                let placed = if promo != 0 { promo } else { pc };
                self.board[from.index()] = 0;
                self.board[to.index()] = placed;
                if promo != 0 {
                    dest.material[color.idx()] =
                        pos.material[color.idx()] - crate::board::PAWN_VALUE + value_of(promo);
                }
                dest.material[color.opposite().idx()] -= value_of(cap);
                dest.rcount = 0;
                dest.state &= !touched_castle_rights(to.index());
                dest.piece_key = pos.piece_key
                    ^ piece_hash(pc, from)
                    ^ piece_hash(placed, to)
                    ^ piece_hash(cap, to);
            }
            MoveType::EnPassant => {
                // the captured pawn sits behind the destination square
                let cap_sq = to
                    .offset(-color.pawn_dir())
                    .expect("en passant capture square on board");
                self.board[from.index()] = 0;
                self.board[to.index()] = pc;
                self.board[cap_sq.index()] = 0;
                dest.material[color.opposite().idx()] -= crate::board::PAWN_VALUE;
                dest.rcount = 0;
                dest.piece_key = pos.piece_key
                    ^ piece_hash(pc, from)
                    ^ piece_hash(pc, to)
                    ^ piece_hash(cap, cap_sq);
            }
            MoveType::KingMove => {
                self.board[from.index()] = 0;
                self.board[to.index()] = pc;
                dest.king[color.idx()] = to;
                dest.material[color.opposite().idx()] -= value_of(cap);
                dest.rcount = if cap != 0 { 0 } else { pos.rcount + 1 };
                dest.state &= !touched_castle_rights(to.index());
                dest.state &= match color {
                    Color::White => !WHITE_CASTLE_MASK,
                    Color::Black => !BLACK_CASTLE_MASK,
                };
                dest.piece_key = pos.piece_key ^ piece_hash(pc, from) ^ piece_hash(pc, to);
                if cap != 0 {
                    dest.piece_key ^= piece_hash(cap, to);
                }
            }
            MoveType::CastleShort => {
                let (rook_from, rook_to) = match color {
                    Color::White => (Square::H1, Square::F1),
                    Color::Black => (Square::H8, Square::F8),
                };
                let rook = color.piece(ROOK);
                self.board[from.index()] = 0;
                self.board[to.index()] = pc;
                self.board[rook_from.index()] = 0;
                self.board[rook_to.index()] = rook;
                dest.king[color.idx()] = to;
                dest.rcount = pos.rcount + 1;
                dest.state &= match color {
                    Color::White => !WHITE_CASTLE_MASK,
                    Color::Black => !BLACK_CASTLE_MASK,
                };
                dest.piece_key = pos.piece_key
                    ^ piece_hash(pc, from)
                    ^ piece_hash(pc, to)
                    ^ piece_hash(rook, rook_from)
                    ^ piece_hash(rook, rook_to);
            }
            MoveType::CastleLong => {
                let (rook_from, rook_to) = match color {
                    Color::White => (Square::A1, Square::D1),
                    Color::Black => (Square::A8, Square::D8),
                };
                let rook = color.piece(ROOK);
                self.board[from.index()] = 0;
                self.board[to.index()] = pc;
                self.board[rook_from.index()] = 0;
                self.board[rook_to.index()] = rook;
                dest.king[color.idx()] = to;
                dest.rcount = pos.rcount + 1;
                dest.state &= match color {
                    Color::White => !WHITE_CASTLE_MASK,
                    Color::Black => !BLACK_CASTLE_MASK,
                };
                dest.piece_key = pos.piece_key
                    ^ piece_hash(pc, from)
                    ^ piece_hash(pc, to)
                    ^ piece_hash(rook, rook_from)
                    ^ piece_hash(rook, rook_to);
            }
        }

        dest.position_key = dest.piece_key ^ state_ep_hash(dest.state, dest.ep);
        self.nodes[ply + 1].pos = dest;
        self.evaluate(ply + 1);
    }

    /// Undo the last move executed at `ply`, restoring board squares only.
    pub(crate) fn undo(&mut self, ply: usize, mv: Move) {
        let from = mv.from();
        let to = mv.to();
        let color = color_of(mv.pc());

        match mv.move_type() {
            MoveType::Invalid => {
                tracing::error!(%mv, "cannot undo invalid move");
                return;
            }
            MoveType::Normal | MoveType::PawnCapture | MoveType::KingMove => {
                self.board[to.index()] = mv.cap();
            }
            MoveType::PawnPush | MoveType::PawnLung => {
                self.board[to.index()] = 0;
            }
            MoveType::EnPassant => {
                let cap_sq = to
                    .offset(-color.pawn_dir())
                    .expect("en passant capture square on board");
                self.board[to.index()] = 0;
                self.board[cap_sq.index()] = mv.cap();
            }
            MoveType::CastleShort => {
                let (rook_from, rook_to) = match color {
                    Color::White => (Square::H1, Square::F1),
                    Color::Black => (Square::H8, Square::F8),
                };
                self.board[to.index()] = 0;
                self.board[rook_from.index()] = color.piece(ROOK);
                self.board[rook_to.index()] = 0;
            }
            MoveType::CastleLong => {
                let (rook_from, rook_to) = match color {
                    Color::White => (Square::A1, Square::D1),
                    Color::Black => (Square::A8, Square::D8),
                };
                self.board[to.index()] = 0;
                self.board[rook_from.index()] = color.piece(ROOK);
                self.board[rook_to.index()] = 0;
            }
        }
        self.board[from.index()] = mv.pc();

        let key = self.nodes[ply].pos.position_key;
        if let Some(count) = self.seen.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.seen.remove(&key);
            }
        }
    }

    /// Flip the side to move without touching the board. Material, king
    /// squares and the move counters carry over; the ep square clears.
    pub(crate) fn exec_null(&mut self, ply: usize) {
        let pos = self.nodes[ply].pos;
        debug_assert!({
            let color = pos.to_move();
            !self.attacked_by(!color, pos.king[color.idx()])
        });

        self.stats.null_moves += 1;

        let mut dest = pos;
        dest.state = pos.state ^ SIDE_BIT;
        dest.ep = None;
        dest.check_state = CheckState::Unknown;
        dest.position_key = dest.piece_key ^ state_ep_hash(dest.state, dest.ep);
        self.nodes[ply + 1].pos = dest;
        self.evaluate(ply + 1);
    }
}
