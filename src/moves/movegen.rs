//! Move generation on the mailbox board: attack scans, the pin filter,
//! check-evasion generation and the per-piece generators in three modes.
//! Generated moves are pseudo-legal except for pins and king safety, which
//! are filtered here so the search never executes an illegal move.

use crate::board::{
    color_of, kind_of, value_of, CheckState, Color, BISHOP, CASTLE_BK, CASTLE_BQ, CASTLE_WK,
    CASTLE_WQ, KING, KNIGHT, PAWN, PAWN_VALUE, QUEEN, ROOK,
};
use crate::engine::Engine;
use crate::moves::{Move, MoveType, MAX_MOVES};
use crate::search::psq;
use crate::square::{
    Square, DIAG_DIRS, EAST, KNIGHT_DIRS, LATERAL_DIRS, NORTH, NORTH_EAST, NORTH_WEST,
    QUEEN_DIRS, SOUTH, SOUTH_EAST, SOUTH_WEST, WEST,
};
use arrayvec::ArrayVec;

/// What to generate: everything, captures only, or captures plus quiet
/// checking moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GenMode {
    All,
    CapsAndChecks,
    Captures,
}

/// Squares a pawn of `color` captures toward.
#[inline(always)]
const fn pawn_cap_dirs(color: Color) -> [i32; 2] {
    match color {
        Color::White => [NORTH_WEST, NORTH_EAST],
        Color::Black => [SOUTH_WEST, SOUTH_EAST],
    }
}

#[inline(always)]
const fn is_diag(dir: i32) -> bool {
    matches!(dir, NORTH_WEST | NORTH_EAST | SOUTH_WEST | SOUTH_EAST)
}

#[inline(always)]
const fn is_lateral(dir: i32) -> bool {
    matches!(dir, NORTH | SOUTH | EAST | WEST)
}

impl Engine {
    /// Is `sq` attacked by any piece of `by`?
    pub(crate) fn attacked_by(&self, by: Color, sq: Square) -> bool {
        let knight = by.piece(KNIGHT);
        for &d in &KNIGHT_DIRS {
            if let Some(t) = sq.offset(d)
                && self.board[t.index()] == knight
            {
                return true;
            }
        }

        for &dir in &QUEEN_DIRS {
            let mut cur = sq.offset(dir);
            while let Some(t) = cur {
                let pc = self.board[t.index()];
                if pc != 0 {
                    if color_of(pc) == by {
                        match kind_of(pc) {
                            PAWN => {
                                // pawns attack diagonally forward only
                                let hit = match by {
                                    Color::White => matches!(dir, SOUTH_WEST | SOUTH_EAST),
                                    Color::Black => matches!(dir, NORTH_WEST | NORTH_EAST),
                                };
                                if hit && sq.distance(t) == 1 {
                                    return true;
                                }
                            }
                            BISHOP => {
                                if is_diag(dir) {
                                    return true;
                                }
                            }
                            ROOK => {
                                if is_lateral(dir) {
                                    return true;
                                }
                            }
                            QUEEN => return true,
                            KING => {
                                if sq.distance(t) == 1 {
                                    return true;
                                }
                            }
                            _ => {}
                        }
                    }
                    break;
                }
                cur = t.offset(dir);
            }
        }
        false
    }

    /// Is a `from -> to` move illegal because it exposes `color`'s king on
    /// `king_sq` to a slider? En passant needs the extra care that two
    /// squares on the capturing pawn's rank clear at once.
    pub(crate) fn pinned_at(
        &self,
        color: Color,
        king_sq: Square,
        from: Square,
        to: Square,
        mtype: MoveType,
    ) -> bool {
        let Some(kdir) = from.ray_to(king_sq) else {
            return false;
        };
        // moves along the pin ray keep the king covered
        if let Some(mdir) = from.ray_to(to)
            && (mdir == kdir || mdir == -kdir)
        {
            return false;
        }

        let ep_clears = mtype == MoveType::EnPassant && is_lateral(kdir);
        let ep_square = Square::at(to.file() as u8, from.rank() as u8);

        // toward the king: the first piece must be our own king
        let mut cur = from.offset(kdir);
        if ep_clears && cur == Some(ep_square) {
            cur = ep_square.offset(kdir);
        }
        let mut pc = 0;
        while let Some(t) = cur {
            pc = self.board[t.index()];
            if pc != 0 {
                break;
            }
            cur = t.offset(kdir);
        }
        if pc != color.piece(KING) {
            return false;
        }

        // away from the king: a matching enemy slider pins
        let back = -kdir;
        let enemy = !color;
        let mut cur = from.offset(back);
        if ep_clears && cur == Some(ep_square) {
            cur = ep_square.offset(back);
        }
        while let Some(t) = cur {
            let pc = self.board[t.index()];
            if pc != 0 {
                let slider = if is_diag(kdir) {
                    enemy.piece(BISHOP)
                } else {
                    enemy.piece(ROOK)
                };
                return pc == slider || pc == enemy.piece(QUEEN);
            }
            cur = t.offset(back);
        }
        false
    }

    /// Pin check against the mover's own king at `ply`.
    #[inline(always)]
    pub(crate) fn pinned(
        &self,
        ply: usize,
        color: Color,
        from: Square,
        to: Square,
        mtype: MoveType,
    ) -> bool {
        let king_sq = self.nodes[ply].pos.king[color.idx()];
        self.pinned_at(color, king_sq, from, to, mtype)
    }

    /// Does moving `from -> to` uncover a check on the enemy king? Shares
    /// the pin scan, applied to the opponent's king.
    #[inline(always)]
    fn discovers_check(&self, ply: usize, color: Color, from: Square, to: Square) -> bool {
        let enemy = !color;
        let king_sq = self.nodes[ply].pos.king[enemy.idx()];
        self.pinned_at(enemy, king_sq, from, to, MoveType::Normal)
    }

    /// Append a scored move to the node's list. The initial score is the
    /// square-value delta plus capture gain net of the opponent's best
    /// recapture sequence; quiet moves fold in killer and history bonuses.
    pub(crate) fn add_move(
        &mut self,
        ply: usize,
        color: Color,
        from: Square,
        to: Square,
        mtype: MoveType,
        cap: u8,
        promo: u8,
    ) {
        let pc = self.board[from.index()];
        debug_assert!(pc != 0 && color_of(pc) == color);
        let pos = self.nodes[ply].pos;

        let mut score = psq::square_value(&pos, pc, to) - psq::square_value(&pos, pc, from);
        if promo != 0 {
            debug_assert!(mtype == MoveType::PawnCapture || mtype == MoveType::PawnPush);
            score += value_of(cap) + value_of(promo) - PAWN_VALUE;
        } else {
            match mtype {
                MoveType::EnPassant => score += PAWN_VALUE,
                MoveType::Normal
                | MoveType::PawnPush
                | MoveType::PawnLung
                | MoveType::PawnCapture => {
                    self.board[to.index()] = pc;
                    self.board[from.index()] = 0;
                    score += value_of(cap) - self.static_exchange(!color, to);
                    self.board[from.index()] = pc;
                    self.board[to.index()] = cap;
                }
                MoveType::KingMove => score += value_of(cap),
                MoveType::CastleShort | MoveType::CastleLong => {}
                MoveType::Invalid => debug_assert!(false),
            }
        }

        let mut mv = Move::new(mtype, from, to, pc, cap, promo, score);
        if !mv.is_cap_or_promo() {
            if self.is_killer(ply, mv) {
                mv.set_score(score + 50);
            } else {
                mv.set_score(score + self.hist[mv.history_index()] as i32);
            }
        }

        let node = &mut self.nodes[ply];
        if node.moves.len() < MAX_MOVES {
            node.moves.push(mv);
        } else {
            debug_assert!(false, "move list overflow at ply {ply}");
        }
    }

    /// Generate all legal moves out of check. Returns false (generating
    /// nothing) when the king turns out not to be attacked, so the caller
    /// falls through to normal generation.
    pub(crate) fn get_check_evasions(&mut self, ply: usize, color: Color) -> bool {
        let pos = self.nodes[ply].pos;
        let king_sq = pos.king[color.idx()];
        let ep = pos.ep;
        let enemy = !color;

        let mut attackers = 0usize;
        let mut squares: ArrayVec<Square, 40> = ArrayVec::new();
        let mut xray: [Option<Square>; 2] = [None, None];
        let mut xray_count = 0usize;

        // knights giving check
        let enemy_knight = enemy.piece(KNIGHT);
        for &d in &KNIGHT_DIRS {
            if let Some(t) = king_sq.offset(d)
                && self.board[t.index()] == enemy_knight
            {
                attackers += 1;
                squares.push(t);
            }
        }

        // sliding checkers and the squares between them and the king
        for &dir in &QUEEN_DIRS {
            let diag = is_diag(dir);
            let Some(first) = king_sq.offset(dir) else {
                continue;
            };
            let mark = squares.len();
            let mut committed = false;
            let mut cur = first;
            loop {
                squares.push(cur);
                let pc = self.board[cur.index()];
                if pc != 0 {
                    let pawn_check = diag
                        && cur == first
                        && pc == enemy.piece(PAWN)
                        && match color {
                            Color::White => dir > 0,
                            Color::Black => dir < 0,
                        };
                    let slider_check = if diag {
                        pc == enemy.piece(BISHOP) || pc == enemy.piece(QUEEN)
                    } else {
                        is_lateral(dir)
                            && (pc == enemy.piece(ROOK) || pc == enemy.piece(QUEEN))
                    };
                    if pawn_check || slider_check {
                        attackers += 1;
                        committed = true;
                        if slider_check && xray_count < 2 {
                            // the king cannot step straight back along the ray
                            xray[xray_count] = king_sq.offset(-dir);
                            xray_count += 1;
                        }
                    }
                    break;
                }
                match cur.offset(dir) {
                    Some(next) => cur = next,
                    None => break,
                }
            }
            if !committed {
                squares.truncate(mark);
            }
        }

        if attackers == 0 {
            self.nodes[ply].pos.check_state = CheckState::NotInCheck;
            return false;
        }

        self.nodes[ply].moves.clear();
        self.nodes[ply].move_index = 0;

        if attackers == 1 {
            // block or capture with a non-king piece
            for i in 0..squares.len() {
                let to = squares[i];

                // en passant capture of a checking pawn that just lunged
                if self.board[to.index()] == enemy.piece(PAWN)
                    && ep.is_some()
                    && ep == to.offset(color.pawn_dir())
                {
                    let ep_sq = ep.unwrap();
                    let cap_dirs = match color {
                        Color::White => [SOUTH_WEST, SOUTH_EAST],
                        Color::Black => [NORTH_WEST, NORTH_EAST],
                    };
                    for d in cap_dirs {
                        if let Some(from) = ep_sq.offset(d)
                            && self.board[from.index()] == color.piece(PAWN)
                            && !self.pinned(ply, color, from, ep_sq, MoveType::EnPassant)
                        {
                            self.add_move(
                                ply,
                                color,
                                from,
                                ep_sq,
                                MoveType::EnPassant,
                                enemy.piece(PAWN),
                                0,
                            );
                        }
                    }
                }

                // knights that reach the square
                let own_knight = color.piece(KNIGHT);
                for &d in &KNIGHT_DIRS {
                    if let Some(from) = to.offset(d)
                        && self.board[from.index()] == own_knight
                        && !self.pinned(ply, color, from, to, MoveType::Normal)
                    {
                        self.add_move(
                            ply,
                            color,
                            from,
                            to,
                            MoveType::Normal,
                            self.board[to.index()],
                            0,
                        );
                    }
                }

                for &dir in &QUEEN_DIRS {
                    // pieces between the king and the square cannot exist
                    if Some(dir) == to.ray_to(king_sq) {
                        continue;
                    }
                    let Some(from) = to.offset(dir) else {
                        continue;
                    };
                    let pc = self.board[from.index()];

                    if is_diag(dir) {
                        if pc == color.piece(PAWN) {
                            // pawns capture toward the checker only
                            let capture_dir = match color {
                                Color::White => dir < 0,
                                Color::Black => dir > 0,
                            };
                            let cap = self.board[to.index()];
                            if capture_dir
                                && cap != 0
                                && !self.pinned(ply, color, from, to, MoveType::Normal)
                            {
                                if to.rank() == color.promo_rank() {
                                    for kind in [QUEEN, ROOK, BISHOP, KNIGHT] {
                                        self.add_move(
                                            ply,
                                            color,
                                            from,
                                            to,
                                            MoveType::PawnCapture,
                                            cap,
                                            color.piece(kind),
                                        );
                                    }
                                } else {
                                    self.add_move(
                                        ply,
                                        color,
                                        from,
                                        to,
                                        MoveType::PawnCapture,
                                        cap,
                                        0,
                                    );
                                }
                            }
                        } else if pc == color.piece(BISHOP) || pc == color.piece(QUEEN) {
                            if !self.pinned(ply, color, from, to, MoveType::Normal) {
                                self.add_move(
                                    ply,
                                    color,
                                    from,
                                    to,
                                    MoveType::Normal,
                                    self.board[to.index()],
                                    0,
                                );
                            }
                        } else if pc == 0 {
                            let mut cur = from;
                            loop {
                                match cur.offset(dir) {
                                    Some(next) => cur = next,
                                    None => break,
                                }
                                let pc = self.board[cur.index()];
                                if pc != 0 {
                                    if (pc == color.piece(BISHOP) || pc == color.piece(QUEEN))
                                        && !self.pinned(ply, color, cur, to, MoveType::Normal)
                                    {
                                        self.add_move(
                                            ply,
                                            color,
                                            cur,
                                            to,
                                            MoveType::Normal,
                                            self.board[to.index()],
                                            0,
                                        );
                                    }
                                    break;
                                }
                            }
                        }
                    } else if dir == NORTH || dir == SOUTH {
                        if pc == color.piece(PAWN) {
                            // a pawn one step behind the square pushes onto it
                            let push_dir = match color {
                                Color::White => dir < 0,
                                Color::Black => dir > 0,
                            };
                            if push_dir
                                && self.board[to.index()] == 0
                                && !self.pinned(ply, color, from, to, MoveType::Normal)
                            {
                                if to.rank() == color.promo_rank() {
                                    for kind in [QUEEN, ROOK, BISHOP, KNIGHT] {
                                        self.add_move(
                                            ply,
                                            color,
                                            from,
                                            to,
                                            MoveType::PawnPush,
                                            0,
                                            color.piece(kind),
                                        );
                                    }
                                } else {
                                    self.add_move(ply, color, from, to, MoveType::PawnPush, 0, 0);
                                }
                            }
                        } else if pc == color.piece(ROOK) || pc == color.piece(QUEEN) {
                            if !self.pinned(ply, color, from, to, MoveType::Normal) {
                                self.add_move(
                                    ply,
                                    color,
                                    from,
                                    to,
                                    MoveType::Normal,
                                    self.board[to.index()],
                                    0,
                                );
                            }
                        } else if pc == 0 {
                            let lung_rank = match color {
                                Color::White => 3,
                                Color::Black => 4,
                            };
                            let mut cur = from;
                            loop {
                                match cur.offset(dir) {
                                    Some(next) => cur = next,
                                    None => break,
                                }
                                let pc = self.board[cur.index()];
                                if pc != 0 {
                                    if pc == color.piece(PAWN) {
                                        if to.rank() == lung_rank
                                            && cur.rank() == color.pawn_rank()
                                            && self.board[to.index()] == 0
                                            && !self.pinned(ply, color, cur, to, MoveType::Normal)
                                        {
                                            self.add_move(
                                                ply,
                                                color,
                                                cur,
                                                to,
                                                MoveType::PawnLung,
                                                0,
                                                0,
                                            );
                                        }
                                    } else if (pc == color.piece(ROOK)
                                        || pc == color.piece(QUEEN))
                                        && !self.pinned(ply, color, cur, to, MoveType::Normal)
                                    {
                                        self.add_move(
                                            ply,
                                            color,
                                            cur,
                                            to,
                                            MoveType::Normal,
                                            self.board[to.index()],
                                            0,
                                        );
                                    }
                                    break;
                                }
                            }
                        }
                    } else {
                        // west/east: only rooks and queens arrive sideways
                        let mut cur = from;
                        loop {
                            let pc = self.board[cur.index()];
                            if pc != 0 {
                                if (pc == color.piece(ROOK) || pc == color.piece(QUEEN))
                                    && !self.pinned(ply, color, cur, to, MoveType::Normal)
                                {
                                    self.add_move(
                                        ply,
                                        color,
                                        cur,
                                        to,
                                        MoveType::Normal,
                                        self.board[to.index()],
                                        0,
                                    );
                                }
                                break;
                            }
                            match cur.offset(dir) {
                                Some(next) => cur = next,
                                None => break,
                            }
                        }
                    }
                }
            }
        }

        // king steps, excluding the x-ray squares behind it
        for &dir in &QUEEN_DIRS {
            let Some(to) = king_sq.offset(dir) else {
                continue;
            };
            if xray[0] == Some(to) || xray[1] == Some(to) {
                continue;
            }
            if self.attacked_by(enemy, to) {
                continue;
            }
            let cap = self.board[to.index()];
            if cap == 0 || (color_of(cap) == enemy && kind_of(cap) != KING) {
                self.add_move(ply, color, king_sq, to, MoveType::KingMove, cap, 0);
            }
        }

        self.nodes[ply].pos.check_state = CheckState::InCheck;
        true
    }

    /// Pawn promotions from the seventh rank, captures included.
    fn get_promos(&mut self, ply: usize, color: Color, underpromote: bool, from: Square) {
        let enemy = !color;
        for d in pawn_cap_dirs(color) {
            let Some(to) = from.offset(d) else {
                continue;
            };
            if self.pinned(ply, color, from, to, MoveType::PawnCapture) {
                continue;
            }
            let cap = self.board[to.index()];
            if cap != 0 && color_of(cap) == enemy && kind_of(cap) != KING && kind_of(cap) != PAWN {
                self.add_move(
                    ply,
                    color,
                    from,
                    to,
                    MoveType::PawnCapture,
                    cap,
                    color.piece(QUEEN),
                );
                if underpromote {
                    for kind in [ROOK, BISHOP, KNIGHT] {
                        self.add_move(
                            ply,
                            color,
                            from,
                            to,
                            MoveType::PawnCapture,
                            cap,
                            color.piece(kind),
                        );
                    }
                }
            }
        }
        if let Some(to) = from.offset(color.pawn_dir())
            && self.board[to.index()] == 0
            && !self.pinned(ply, color, from, to, MoveType::PawnPush)
        {
            self.add_move(
                ply,
                color,
                from,
                to,
                MoveType::PawnPush,
                0,
                color.piece(QUEEN),
            );
            if underpromote {
                for kind in [ROOK, BISHOP, KNIGHT] {
                    self.add_move(ply, color, from, to, MoveType::PawnPush, 0, color.piece(kind));
                }
            }
        }
    }

    /// Pawn captures including en passant.
    fn get_pawn_caps(&mut self, ply: usize, color: Color, from: Square) {
        let ep = self.nodes[ply].pos.ep;
        let enemy = !color;
        for d in pawn_cap_dirs(color) {
            let Some(to) = from.offset(d) else {
                continue;
            };
            if Some(to) == ep {
                if !self.pinned(ply, color, from, to, MoveType::EnPassant) {
                    self.add_move(
                        ply,
                        color,
                        from,
                        to,
                        MoveType::EnPassant,
                        enemy.piece(PAWN),
                        0,
                    );
                }
            } else if !self.pinned(ply, color, from, to, MoveType::PawnCapture) {
                let cap = self.board[to.index()];
                if cap != 0 && color_of(cap) == enemy && kind_of(cap) != KING {
                    self.add_move(ply, color, from, to, MoveType::PawnCapture, cap, 0);
                }
            }
        }
    }

    /// Quiet pawn pushes and lungs.
    fn get_pawn_moves(&mut self, ply: usize, color: Color, from: Square) {
        let Some(to) = from.offset(color.pawn_dir()) else {
            return;
        };
        if self.board[to.index()] != 0 || self.pinned(ply, color, from, to, MoveType::PawnPush) {
            return;
        }
        self.add_move(ply, color, from, to, MoveType::PawnPush, 0, 0);
        if from.rank() == color.pawn_rank()
            && let Some(lung) = to.offset(color.pawn_dir())
            && self.board[lung.index()] == 0
        {
            self.add_move(ply, color, from, lung, MoveType::PawnLung, 0, 0);
        }
    }

    /// Quiet pawn moves that give check, direct or discovered.
    fn get_pawn_checks(&mut self, ply: usize, color: Color, from: Square) {
        let enemy_king = self.nodes[ply].pos.king[(!color).idx()];
        let Some(to) = from.offset(color.pawn_dir()) else {
            return;
        };
        if self.board[to.index()] != 0 || self.pinned(ply, color, from, to, MoveType::PawnPush) {
            return;
        }
        let cap_dirs = pawn_cap_dirs(color);
        let direct = |sq: Square| {
            cap_dirs
                .iter()
                .any(|&d| sq.offset(d) == Some(enemy_king))
        };
        if direct(to) || self.discovers_check(ply, color, from, to) {
            self.add_move(ply, color, from, to, MoveType::PawnPush, 0, 0);
        }
        if from.rank() != color.pawn_rank() {
            return;
        }
        let Some(lung) = to.offset(color.pawn_dir()) else {
            return;
        };
        if self.board[lung.index()] != 0 {
            return;
        }
        if direct(lung) || self.discovers_check(ply, color, from, lung) {
            self.add_move(ply, color, from, lung, MoveType::PawnLung, 0, 0);
        }
    }

    fn get_knight_moves(&mut self, ply: usize, color: Color, mode: GenMode, from: Square) {
        let enemy = !color;
        for &d in &KNIGHT_DIRS {
            let Some(to) = from.offset(d) else {
                continue;
            };
            if self.pinned(ply, color, from, to, MoveType::Normal) {
                continue;
            }
            let cap = self.board[to.index()];
            if cap == 0 {
                if mode == GenMode::All
                    || (mode == GenMode::CapsAndChecks
                        && self.discovers_check(ply, color, from, to))
                {
                    self.add_move(ply, color, from, to, MoveType::Normal, 0, 0);
                }
            } else if color_of(cap) == enemy && kind_of(cap) != KING {
                self.add_move(ply, color, from, to, MoveType::Normal, cap, 0);
            }
        }
    }

    /// Bishop, rook and queen moves share one ray walker.
    fn get_slider_moves(
        &mut self,
        ply: usize,
        color: Color,
        mode: GenMode,
        from: Square,
        dirs: &[i32],
    ) {
        let enemy = !color;
        for &dir in dirs {
            let Some(first) = from.offset(dir) else {
                continue;
            };
            if self.pinned(ply, color, from, first, MoveType::Normal) {
                continue;
            }
            // whether leaving this ray discovers a check is the same for
            // every destination along it
            let mut discovered = 0u8;
            let mut to = first;
            loop {
                let cap = self.board[to.index()];
                if cap != 0 {
                    if color_of(cap) == enemy && kind_of(cap) != KING {
                        self.add_move(ply, color, from, to, MoveType::Normal, cap, 0);
                    }
                    break;
                }
                if mode == GenMode::All {
                    self.add_move(ply, color, from, to, MoveType::Normal, 0, 0);
                } else if mode == GenMode::CapsAndChecks {
                    if discovered == 0 {
                        discovered = if self.discovers_check(ply, color, from, to) {
                            1
                        } else {
                            2
                        };
                    }
                    if discovered == 1 {
                        self.add_move(ply, color, from, to, MoveType::Normal, 0, 0);
                    }
                }
                match to.offset(dir) {
                    Some(next) => to = next,
                    None => break,
                }
            }
        }
    }

    fn get_king_moves(&mut self, ply: usize, color: Color, mode: GenMode, from: Square) {
        let pos = self.nodes[ply].pos;
        let enemy = !color;

        let (home, short_right, long_right) = match color {
            Color::White => (Square::E1, CASTLE_WK, CASTLE_WQ),
            Color::Black => (Square::E8, CASTLE_BK, CASTLE_BQ),
        };
        if from == home && mode == GenMode::All {
            let (f_sq, g_sq, b_sq, c_sq, d_sq) = match color {
                Color::White => (Square::F1, Square::G1, Square::B1, Square::C1, Square::D1),
                Color::Black => (Square::F8, Square::G8, Square::B8, Square::C8, Square::D8),
            };
            if pos.has_castle(short_right)
                && self.board[f_sq.index()] == 0
                && self.board[g_sq.index()] == 0
                && !self.attacked_by(enemy, home)
                && !self.attacked_by(enemy, f_sq)
                && !self.attacked_by(enemy, g_sq)
            {
                self.add_move(ply, color, from, g_sq, MoveType::CastleShort, 0, 0);
            }
            if pos.has_castle(long_right)
                && self.board[b_sq.index()] == 0
                && self.board[c_sq.index()] == 0
                && self.board[d_sq.index()] == 0
                && !self.attacked_by(enemy, c_sq)
                && !self.attacked_by(enemy, d_sq)
                && !self.attacked_by(enemy, home)
            {
                self.add_move(ply, color, from, c_sq, MoveType::CastleLong, 0, 0);
            }
        }

        for &d in &QUEEN_DIRS {
            let Some(to) = from.offset(d) else {
                continue;
            };
            if self.attacked_by(enemy, to) {
                continue;
            }
            let cap = self.board[to.index()];
            if cap == 0 {
                if mode == GenMode::All
                    || (mode == GenMode::CapsAndChecks
                        && self.discovers_check(ply, color, from, to))
                {
                    self.add_move(ply, color, from, to, MoveType::KingMove, 0, 0);
                }
            } else if color_of(cap) == enemy && kind_of(cap) != KING {
                self.add_move(ply, color, from, to, MoveType::KingMove, cap, 0);
            }
        }
    }

    /// Fill the node's move list. `qsearch` restricts generation to
    /// volatile moves: promotions and captures always, quiet checks when
    /// `depth >= 0`. A side in check gets full legal evasions instead.
    pub(crate) fn generate_moves(&mut self, ply: usize, qsearch: bool, depth: i32) {
        let pos = self.nodes[ply].pos;
        let color = pos.to_move();
        self.nodes[ply].moves.clear();
        self.nodes[ply].move_index = 0;

        if pos.check_state != CheckState::NotInCheck && self.get_check_evasions(ply, color) {
            return;
        }

        let mode = if !qsearch {
            GenMode::All
        } else if depth < 0 {
            GenMode::Captures
        } else {
            GenMode::CapsAndChecks
        };

        for sq in Square::all() {
            let pc = self.board[sq.index()];
            if pc == 0 || color_of(pc) != color {
                continue;
            }
            match kind_of(pc) {
                PAWN => {
                    if sq.rank() == color.seventh_rank() {
                        self.get_promos(ply, color, mode == GenMode::All, sq);
                    } else {
                        self.get_pawn_caps(ply, color, sq);
                        match mode {
                            GenMode::All => self.get_pawn_moves(ply, color, sq),
                            GenMode::CapsAndChecks => self.get_pawn_checks(ply, color, sq),
                            GenMode::Captures => {}
                        }
                    }
                }
                KNIGHT => self.get_knight_moves(ply, color, mode, sq),
                BISHOP => self.get_slider_moves(ply, color, mode, sq, &DIAG_DIRS),
                ROOK => self.get_slider_moves(ply, color, mode, sq, &LATERAL_DIRS),
                QUEEN => self.get_slider_moves(ply, color, mode, sq, &QUEEN_DIRS),
                KING => self.get_king_moves(ply, color, mode, sq),
                _ => debug_assert!(false, "bad piece code {pc}"),
            }
        }
    }
}
