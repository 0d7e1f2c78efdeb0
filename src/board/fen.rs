//! FEN parsing and emission on the engine context. Parsing builds the
//! whole position in scratch storage first; the live board is only
//! replaced once every field has been validated, so a rejected FEN leaves
//! the previous position untouched.

use crate::board::{
    color_of, value_of, CheckState, Color, Position, BISHOP, CASTLE_BK, CASTLE_BQ, CASTLE_MASK,
    CASTLE_WK, CASTLE_WQ, KING, KNIGHT, PAWN, QUEEN, ROOK, SIDE_BIT,
};
use crate::engine::{piece_char, Engine};
use crate::error::EngineError;
use crate::hash::{piece_hash, state_ep_hash};
use crate::square::Square;

fn bad(fen: &str, what: &str) -> EngineError {
    EngineError::InvalidFen(format!("{what} in \"{}\"", fen.trim()))
}

fn piece_from_char(c: char) -> Option<u8> {
    let kind = match c.to_ascii_lowercase() {
        'p' => PAWN,
        'n' => KNIGHT,
        'b' => BISHOP,
        'r' => ROOK,
        'q' => QUEEN,
        'k' => KING,
        _ => return None,
    };
    let color = if c.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    Some(color.piece(kind))
}

/// Take the next whitespace-delimited word, advancing `rest` past it.
fn next_word<'a>(rest: &mut &'a str) -> &'a str {
    let trimmed = rest.trim_start();
    let end = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    let (word, tail) = trimmed.split_at(end);
    *rest = tail;
    word
}

impl Engine {
    /// Load a position from a 6-field FEN. Returns the unconsumed
    /// remainder of the input (e.g. a trailing `moves ...` clause).
    pub fn set_position<'a>(&mut self, fen: &'a str) -> Result<&'a str, EngineError> {
        if fen.trim().is_empty() {
            return Err(bad(fen, "empty fen string"));
        }

        let mut board = [0u8; 128];
        let mut king: [Option<Square>; 2] = [None, None];
        let mut material = [0i32; 2];
        let mut piece_key = 0u64;

        let mut rest = fen;
        let placement = next_word(&mut rest);
        let mut ranks = placement.split('/');
        for rank in (0u8..8).rev() {
            let row = ranks
                .next()
                .ok_or_else(|| bad(fen, "missing rank in piece placement"))?;
            let mut file = 0u8;
            for c in row.chars() {
                match c {
                    '1'..='8' => file += c as u8 - b'0',
                    _ => {
                        let pc = piece_from_char(c)
                            .ok_or_else(|| bad(fen, "invalid piece character"))?;
                        if file > 7 {
                            return Err(bad(fen, "rank overflow in piece placement"));
                        }
                        let sq = Square::at(file, rank);
                        board[sq.index()] = pc;
                        piece_key ^= piece_hash(pc, sq);
                        let color = color_of(pc);
                        if pc == color.piece(KING) {
                            if king[color.idx()].is_some() {
                                return Err(bad(fen, "more than one king per side"));
                            }
                            king[color.idx()] = Some(sq);
                        } else {
                            material[color.idx()] += value_of(pc);
                        }
                        file += 1;
                    }
                }
            }
            if file != 8 {
                return Err(bad(fen, "short rank in piece placement"));
            }
        }
        if ranks.next().is_some() {
            return Err(bad(fen, "too many ranks in piece placement"));
        }
        let king = [
            king[0].ok_or_else(|| bad(fen, "no white king"))?,
            king[1].ok_or_else(|| bad(fen, "no black king"))?,
        ];

        let mut state = match next_word(&mut rest) {
            "w" => 0,
            "b" => SIDE_BIT,
            _ => return Err(bad(fen, "expected side to move")),
        };

        let castling = next_word(&mut rest);
        if castling != "-" {
            for c in castling.chars() {
                state |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(bad(fen, "unexpected castle rights")),
                };
            }
        }

        let ep_word = next_word(&mut rest);
        let ep = if ep_word == "-" || ep_word.is_empty() {
            None
        } else {
            let sq: Square = ep_word
                .parse()
                .map_err(|_| bad(fen, "invalid en passant square"))?;
            let expected = if state & SIDE_BIT != 0 { 2 } else { 5 };
            if sq.rank() != expected {
                return Err(bad(fen, "invalid en passant rank"));
            }
            Some(sq)
        };

        let rcount_word = next_word(&mut rest);
        let rcount = if rcount_word.is_empty() || rcount_word == "-" {
            0
        } else {
            rcount_word
                .parse::<i32>()
                .map_err(|_| bad(fen, "invalid halfmove clock"))?
        };

        let fullmove_word = next_word(&mut rest);
        let fullmove = if fullmove_word.is_empty() {
            1
        } else {
            fullmove_word
                .parse::<i32>()
                .map_err(|_| bad(fen, "invalid fullmove number"))?
        };

        let pos = Position {
            king,
            material,
            mcount: 2 * fullmove + (state & SIDE_BIT) as i32,
            rcount,
            state,
            ep,
            check_state: CheckState::Unknown,
            piece_key,
            position_key: piece_key ^ state_ep_hash(state, ep),
        };

        // commit, then reject positions where the mover could take the
        // enemy king (restoring what was there before)
        let saved_board = self.board;
        let saved_pos = self.nodes[0].pos;
        self.board = board;
        self.nodes[0].pos = pos;
        let mover = pos.to_move();
        if self.attacked_by(mover, pos.king[mover.opposite().idx()]) {
            self.board = saved_board;
            self.nodes[0].pos = saved_pos;
            return Err(bad(fen, "side to move can take enemy king"));
        }

        self.seen.clear();
        self.evaluate(0);
        Ok(rest)
    }

    pub fn get_fen(&self) -> String {
        let pos = &self.nodes[0].pos;
        let mut fen = String::new();

        for rank in (0u8..8).rev() {
            let mut empty = 0;
            for file in 0u8..8 {
                let pc = self.board[Square::at(file, rank).index()];
                match piece_char(pc) {
                    Some(c) => {
                        if empty > 0 {
                            fen.push((b'0' + empty) as char);
                            empty = 0;
                        }
                        fen.push(c);
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push((b'0' + empty) as char);
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if pos.white_to_move() { 'w' } else { 'b' });

        fen.push(' ');
        if pos.state & CASTLE_MASK != 0 {
            if pos.state & CASTLE_WK != 0 {
                fen.push('K');
            }
            if pos.state & CASTLE_WQ != 0 {
                fen.push('Q');
            }
            if pos.state & CASTLE_BK != 0 {
                fen.push('k');
            }
            if pos.state & CASTLE_BQ != 0 {
                fen.push('q');
            }
        } else {
            fen.push('-');
        }

        fen.push(' ');
        match pos.ep {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", pos.rcount, pos.mcount / 2));
        fen
    }
}
