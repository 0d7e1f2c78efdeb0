//! Static evaluation. One pawn pass populates the open-file and passer
//! maps, then the pieces are scored against those maps. The result lands
//! in the node as `stand_pat`, from the side to move's perspective, and
//! drawn material configurations raise the position's draw flag.

use crate::board::{
    color_of, kind_of, Color, BISHOP, BLACK_CASTLE_MASK, DRAW_BIT, KING, KNIGHT, PAWN, QUEEN,
    ROOK, WHITE_CASTLE_MASK,
};
use crate::engine::Engine;
use crate::search::psq;
use crate::square::{Square, DIAG_DIRS, EAST, LATERAL_DIRS, WEST};
use arrayvec::ArrayVec;

/// Passer bonus by rank-to-go, ranks 2..7 for White.
const PASSER: [i32; 6] = [16, 24, 36, 52, 68, 80];

/// King-side file groups for the shelter scan: files checked for open
/// lanes and pawn cover, by the king's file.
fn king_files(file: i32) -> std::ops::Range<u8> {
    match file {
        0..=2 => 0..3,
        3..=4 => 2..6,
        _ => 5..8,
    }
}

impl Engine {
    /// Evaluate the position at `ply`, filling the node's caches and
    /// `stand_pat`.
    pub(crate) fn evaluate(&mut self, ply: usize) {
        let mut pos = self.nodes[ply].pos;
        let tempo = self.opts.tempo;
        let mut eval = pos.material[0] - pos.material[1]
            + if pos.white_to_move() { tempo } else { -tempo };

        let mut piece_count = [0i32; crate::board::PIECE_CODES];
        let mut open_file = [[true; 8]; 2];
        let mut passers = [0u8; 128];
        let mut piece_stack: ArrayVec<Square, 32> = ArrayVec::new();

        // pawns first so the file and passer maps exist for the pieces
        for sq in Square::all() {
            let pc = self.board[sq.index()];
            if pc == 0 {
                continue;
            }
            match kind_of(pc) {
                PAWN => {
                    let color = color_of(pc);
                    let v = self.pawn_eval(color, sq, &pos, &mut open_file, &mut passers);
                    if color == Color::White {
                        eval += v;
                    } else {
                        eval -= v;
                    }
                    piece_count[pc as usize] += 1;
                }
                KING => piece_stack.push(sq),
                _ => {
                    piece_count[color_of(pc).idx()] += 1;
                    piece_count[pc as usize] += 1;
                    piece_stack.push(sq);
                }
            }
        }

        let can_win = |c: Color| {
            let p = |kind: u8| piece_count[c.piece(kind) as usize];
            p(PAWN) > 0
                || p(KNIGHT) > 2
                || p(BISHOP) > 1
                || (p(KNIGHT) > 0 && p(BISHOP) > 0)
                || p(ROOK) > 0
                || p(QUEEN) > 0
        };
        let white_can_win = can_win(Color::White);
        let black_can_win = can_win(Color::Black);

        if !white_can_win && !black_can_win {
            pos.state |= DRAW_BIT;
            let node = &mut self.nodes[ply];
            node.pos = pos;
            node.stand_pat = self.draw_score[pos.to_move().idx()];
            node.piece_count = piece_count;
            node.open_file = open_file;
            node.passers = passers;
            return;
        }

        let count = |c: Color, kind: u8| piece_count[c.piece(kind) as usize];

        // pawnless positions are hard to win
        if count(Color::White, PAWN) == 0 {
            eval -= 50;
        }
        if count(Color::Black, PAWN) == 0 {
            eval += 50;
        }

        // a lone minor piece does little
        if piece_count[0] == 1 && (count(Color::White, KNIGHT) > 0 || count(Color::White, BISHOP) > 0)
        {
            eval -= 50;
        }
        if piece_count[1] == 1 && (count(Color::Black, KNIGHT) > 0 || count(Color::Black, BISHOP) > 0)
        {
            eval += 50;
        }

        // redundant knights
        if count(Color::White, KNIGHT) > 1 {
            eval -= 16 * (count(Color::White, KNIGHT) - 1);
        }
        if count(Color::Black, KNIGHT) > 1 {
            eval += 16 * (count(Color::Black, KNIGHT) - 1);
        }

        let pawns = count(Color::White, PAWN) + count(Color::Black, PAWN);
        if pawns > 0 {
            // knights like crowded boards, rooks and the bishop pair like
            // empty ones
            let mut pc = (4 * pawns) / 3;
            if count(Color::White, KNIGHT) > 0 {
                eval += pc;
            }
            if count(Color::Black, KNIGHT) > 0 {
                eval -= pc;
            }
            pc = (4 * pc) / 3;
            if count(Color::White, ROOK) > 0 {
                eval += 28 - pc;
            }
            if count(Color::Black, ROOK) > 0 {
                eval -= 28 - pc;
            }
            if count(Color::White, BISHOP) >= 2 {
                eval += 48 - pc;
            }
            if count(Color::Black, BISHOP) >= 2 {
                eval -= 48 - pc;
            }
        }

        for &sq in &piece_stack {
            let pc = self.board[sq.index()];
            let color = color_of(pc);
            let v = match kind_of(pc) {
                KNIGHT => self.knight_eval(color, sq, &pos),
                BISHOP => self.bishop_eval(color, sq, &pos),
                ROOK => self.rook_eval(color, sq, &pos, &open_file),
                QUEEN => psq::square_value(&pos, pc, sq),
                KING => self.king_eval(color, sq, &pos, &open_file),
                _ => 0,
            };
            if color == Color::White {
                eval += v;
            } else {
                eval -= v;
            }
        }

        // damp a winning score the winner cannot convert
        if eval > 0 && !white_can_win {
            eval = 50.min(eval / 4);
        } else if eval < 0 && !black_can_win {
            eval = (-50).max(eval / 4);
        }

        // drift toward the draw score as the fifty-move counter climbs;
        // rcount is not in the position key, so this blurs hashed scores
        if pos.rcount > 25 && eval.abs() > 8 {
            eval = (eval as f32 * (25.0 / pos.rcount as f32)) as i32;
        }

        eval = (eval / 8) * 8;

        let node = &mut self.nodes[ply];
        node.pos = pos;
        node.stand_pat = if pos.white_to_move() { eval } else { -eval };
        node.piece_count = piece_count;
        node.open_file = open_file;
        node.passers = passers;
    }

    fn pawn_eval(
        &self,
        color: Color,
        sq: Square,
        pos: &crate::board::Position,
        open_file: &mut [[bool; 8]; 2],
        passers: &mut [u8; 128],
    ) -> i32 {
        let me = color.piece(PAWN);
        let their = (!color).piece(PAWN);
        let forward = color.pawn_dir();
        let backward = -forward;
        let x = sq.file();
        let y = sq.rank();
        let mut score = psq::square_value(pos, me, sq);

        open_file[color.idx()][x as usize] = false;

        // nearest friendly pawn on each adjacent file, at or behind us
        let flank_pawn = |start: i32| -> Option<Square> {
            let mut cur = sq.offset(start);
            while let Some(t) = cur {
                if self.board[t.index()] == me {
                    return Some(t);
                }
                cur = t.offset(backward);
            }
            None
        };
        let left = flank_pawn(WEST);
        let right = flank_pawn(EAST);

        // a blocked central pawn still at home cramps the opening
        if (x == 3 || x == 4)
            && y == color.pawn_rank()
            && sq.offset(forward).is_some_and(|t| self.board[t.index()] != 0)
        {
            score -= 16;
        }

        // scan the file ahead: a friendly pawn means doubled, any pawn
        // means not passed
        let mut passed = true;
        let mut cur = sq.offset(forward);
        while let Some(t) = cur {
            let pc = self.board[t.index()];
            if pc == me {
                score -= 32;
                passed = false;
                break;
            }
            if pc == their {
                passed = false;
                break;
            }
            cur = t.offset(forward);
        }

        if passed {
            // enemy pawns ahead on the adjacent files degrade the passer
            // to a semi-passer
            let op_flank = |cap_dir: i32| -> bool {
                if y == color.seventh_rank() {
                    return false;
                }
                let mut cur = sq.offset(cap_dir);
                while let Some(t) = cur {
                    if self.board[t.index()] == their {
                        return true;
                    }
                    cur = t.offset(forward);
                }
                false
            };
            let (left_cap, right_cap) = match color {
                Color::White => (crate::square::NORTH_WEST, crate::square::NORTH_EAST),
                Color::Black => (crate::square::SOUTH_WEST, crate::square::SOUTH_EAST),
            };
            let op_flanks = op_flank(left_cap) as i32 + op_flank(right_cap) as i32;

            let near = |p: Option<Square>| p.is_some_and(|t| sq.distance(t) < 2);
            let flanks = near(left) as i32 + near(right) as i32;

            let diff = flanks - op_flanks;
            if diff >= 0 {
                // the pawn table already pays for plain advancement
                let idx = match color {
                    Color::White => y - 1,
                    Color::Black => 6 - y,
                };
                let mut bonus = PASSER[idx as usize];
                if op_flanks > 0 {
                    bonus /= 2;
                    passed = false;
                    passers[sq.index()] = 1;
                } else {
                    if diff > 0 {
                        bonus += bonus / 3;
                    }
                    passers[sq.index()] = 2;
                }
                if sq.offset(forward).is_some_and(|t| self.board[t.index()] != 0) {
                    bonus /= 2;
                    passed = false;
                }
                score += bonus;
            } else {
                passed = false;
            }
        }

        // backward or isolated pawns on the rim files
        if !passed && (x < 3 || x > 4) {
            let dist = |p: Option<Square>| p.map_or(8, |t| sq.distance(t));
            let nearest = dist(left).min(dist(right));
            if nearest > 2 {
                score -= 2 * nearest;
                if let Some(t) = sq.offset(forward) {
                    let blocker = self.board[t.index()];
                    if blocker == (!color).piece(KNIGHT) || blocker == (!color).piece(BISHOP) {
                        score -= 8;
                    }
                }
            }
        }

        score
    }

    fn knight_eval(&self, color: Color, sq: Square, pos: &crate::board::Position) -> i32 {
        let mut score = psq::square_value(pos, color.piece(KNIGHT), sq);
        // stay near the action, assumed centered on the kings
        score += 2 * (8 - (sq.distance(pos.king[0]) + sq.distance(pos.king[1])));
        score
    }

    fn bishop_eval(&self, color: Color, sq: Square, pos: &crate::board::Position) -> i32 {
        let mut score = psq::square_value(pos, color.piece(BISHOP), sq);

        // shepherd the friendly king as material comes off
        let own_king = pos.king[color.idx()];
        score += (psq::end_game(pos, color) * (2 * (8 - sq.distance(own_king))) as f32) as i32;

        if let Some(d) = sq.ray_to(pos.king[(!color).idx()])
            && DIAG_DIRS.contains(&d)
        {
            score += 8;
        }
        score
    }

    fn rook_eval(
        &self,
        color: Color,
        sq: Square,
        pos: &crate::board::Position,
        open_file: &[[bool; 8]; 2],
    ) -> i32 {
        let mut score = psq::square_value(pos, color.piece(ROOK), sq);

        let own_king = pos.king[color.idx()];
        score += (psq::end_game(pos, color) * (2 * (8 - sq.distance(own_king))) as f32) as i32;

        let x = sq.file() as usize;
        if open_file[color.idx()][x] {
            score += if open_file[(!color).idx()][x] { 12 } else { 8 };
            if let Some(d) = sq.ray_to(pos.king[(!color).idx()])
                && LATERAL_DIRS.contains(&d)
            {
                score += 8;
            }
        } else {
            // stuck on the wrong side of a king that can no longer castle
            let castle_mask = match color {
                Color::White => WHITE_CASTLE_MASK,
                Color::Black => BLACK_CASTLE_MASK,
            };
            if pos.state & castle_mask == 0 {
                let kx = own_king.file() as usize;
                if (kx >= 4 && x >= kx) || (kx < 4 && x <= kx) {
                    score -= 20;
                }
            }
        }
        score
    }

    fn king_eval(
        &self,
        color: Color,
        sq: Square,
        pos: &crate::board::Position,
        open_file: &[[bool; 8]; 2],
    ) -> i32 {
        let forward = color.pawn_dir();
        let mut score = psq::square_value(pos, color.piece(KING), sq);

        // standing in front of your own pieces blocks them
        let mut cur = sq.offset(forward);
        while let Some(t) = cur {
            let pc = self.board[t.index()];
            if pc != 0 {
                if pc == color.piece(PAWN) {
                    score -= 16;
                } else if color_of(pc) == color && kind_of(pc) != KING {
                    score -= 8;
                }
                break;
            }
            cur = t.offset(forward);
        }

        // shelter and storm over the king-side files: open lanes and
        // advancing enemy pawns are liabilities, an intact shield an asset
        let mut val = 0i32;
        let files = king_files(sq.file());
        for f in files.clone() {
            val -= 8
                * (open_file[color.idx()][f as usize] as i32
                    + open_file[(!color).idx()][f as usize] as i32);
        }
        let shield_rank = sq.rank() + forward.signum();
        if (0..8).contains(&shield_rank) {
            for f in files {
                let r1 = Square::at(f, shield_rank as u8);
                match self.board[r1.index()] {
                    pc if pc == color.piece(PAWN) => val += 10,
                    pc if pc == (!color).piece(PAWN) => val -= 10,
                    _ => {}
                }
                if let Some(r2) = r1.offset(forward) {
                    match self.board[r2.index()] {
                        pc if pc == color.piece(PAWN) => val += 5,
                        pc if pc == (!color).piece(PAWN) => val -= 8,
                        _ => {}
                    }
                    if let Some(r3) = r2.offset(forward)
                        && self.board[r3.index()] == (!color).piece(PAWN)
                    {
                        val -= 6;
                    }
                }
            }
        }
        if val != 0 {
            score += (psq::mid_game(pos, color) * val as f32) as i32;
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use crate::board::Color;
    use crate::engine::Engine;
    use crate::square::Square;

    fn pawn_term(fen: &str, sq: Square) -> i32 {
        let mut engine = Engine::new();
        engine.initialize();
        engine.set_position(fen).expect("valid fen");
        let pos = engine.nodes[0].pos;
        let mut open_file = [[true; 8]; 2];
        let mut passers = [0u8; 128];
        engine.pawn_eval(Color::White, sq, &pos, &mut open_file, &mut passers)
    }

    #[test]
    fn backward_pawn_penalty_is_rim_only() {
        // blocked, unsupported a-pawn: square value 0, isolation -16
        let rim = pawn_term("4k3/8/8/p7/P7/8/8/4K3 w - - 0 1", Square::at(0, 3));
        assert_eq!(rim, -16);

        // the same shape on the d-file is central and escapes the penalty
        let centre = pawn_term("4k3/8/8/3p4/3P4/8/8/4K3 w - - 0 1", Square::at(3, 3));
        assert_eq!(centre, 16);
    }

    #[test]
    fn doubled_pawn_penalty() {
        // rear pawn of a doubled rim pair: -8 square value, -32 doubled,
        // -16 isolated
        let rear = pawn_term("4k3/8/8/8/8/P7/P7/4K3 w - - 0 1", Square::at(0, 1));
        assert_eq!(rear, -56);
    }

    #[test]
    fn passer_ladder_by_rank() {
        // unopposed pawn on a5: square value 0 plus the rank-5 passer bonus
        let passer = pawn_term("4k3/8/8/P7/8/8/8/4K3 w - - 0 1", Square::at(0, 4));
        assert_eq!(passer, 52);

        // one rank further the ladder pays more
        let further = pawn_term("4k3/8/P7/8/8/8/8/4K3 w - - 0 1", Square::at(0, 5));
        assert_eq!(further, 12 + 68);
    }
}
