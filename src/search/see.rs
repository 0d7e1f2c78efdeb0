//! Static exchange evaluation. The board is mutated in place while the
//! capture sequence recurses and restored square-for-square on the way
//! back out; the nesting is strictly LIFO so the restore is exact.

use crate::board::{color_of, kind_of, value_of, Color, BISHOP, KING, KNIGHT, PAWN, QUEEN, ROOK};
use crate::engine::Engine;
use crate::square::{
    Square, DIAG_DIRS, KNIGHT_DIRS, LATERAL_DIRS, NORTH_EAST, NORTH_WEST, SOUTH_EAST, SOUTH_WEST,
};

impl Engine {
    /// Square of the least valuable piece of `color` attacking `to`, or
    /// `None`. The king only counts when `to` is otherwise undefended.
    pub fn smallest_attacker(&self, color: Color, to: Square) -> Option<Square> {
        // pawns first
        let pawn = color.piece(PAWN);
        let pawn_dirs = match color {
            Color::White => [SOUTH_WEST, SOUTH_EAST],
            Color::Black => [NORTH_WEST, NORTH_EAST],
        };
        for d in pawn_dirs {
            if let Some(t) = to.offset(d)
                && self.board[t.index()] == pawn
            {
                return Some(t);
            }
        }

        let knight = color.piece(KNIGHT);
        for &d in &KNIGHT_DIRS {
            if let Some(t) = to.offset(d)
                && self.board[t.index()] == knight
            {
                return Some(t);
            }
        }

        let mut queen: Option<Square> = None;
        let mut king: Option<Square> = None;

        for &dir in &DIAG_DIRS {
            let mut cur = to.offset(dir);
            while let Some(t) = cur {
                let pc = self.board[t.index()];
                if pc != 0 {
                    if pc == color.piece(BISHOP) {
                        return Some(t);
                    }
                    if pc == color.piece(QUEEN) {
                        queen = Some(t);
                    } else if pc == color.piece(KING) && to.distance(t) == 1 {
                        king = Some(t);
                    }
                    break;
                }
                cur = t.offset(dir);
            }
        }

        for &dir in &LATERAL_DIRS {
            let mut cur = to.offset(dir);
            while let Some(t) = cur {
                let pc = self.board[t.index()];
                if pc != 0 {
                    if pc == color.piece(ROOK) {
                        return Some(t);
                    }
                    if pc == color.piece(QUEEN) {
                        queen = Some(t);
                    } else if pc == color.piece(KING) && to.distance(t) == 1 {
                        king = Some(t);
                    }
                    break;
                }
                cur = t.offset(dir);
            }
        }

        if queen.is_some() {
            return queen;
        }
        if let Some(k) = king
            && !self.attacked_by(!color, to)
        {
            return Some(k);
        }
        None
    }

    /// Material `color` gains by starting a capture sequence on `to`, both
    /// sides always answering with their smallest attacker. Never
    /// negative: the side to move can stop capturing instead.
    pub fn static_exchange(&mut self, color: Color, to: Square) -> i32 {
        debug_assert!(self.board[to.index()] != 0);
        debug_assert!(kind_of(self.board[to.index()]) != KING);
        debug_assert!(color_of(self.board[to.index()]) != color);

        let Some(from) = self.smallest_attacker(color, to) else {
            return 0;
        };
        let piece = self.board[from.index()];
        let cap = self.board[to.index()];
        let mut value = value_of(cap);
        if kind_of(piece) != KING && value_of(piece) >= value {
            // simulate the capture, ask what the opponent gets back
            self.board[to.index()] = piece;
            self.board[from.index()] = 0;
            value = 0.max(value - self.static_exchange(!color, to));
            self.board[from.index()] = piece;
            self.board[to.index()] = cap;
        }
        value
    }
}
