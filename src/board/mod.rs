pub mod components;
pub mod fen;
pub mod zobrist;


use std::fmt::Display;

use components::{BitBoard, CastlingRights, Piece, Side, file_of};
use zobrist::ZOBRIST;

use crate::{
    consts::*,
    moves::{GenMode, Move, MoveList, generate_moves, move_gen::is_square_attacked},
};

/// Per-ply delta pushed on `make_move` and reversed by `undo_move`.
/// Scalar state (rights, counters, keys) is snapshot-restored; piece
/// placement is reversed from the move itself.
#[derive(Debug, Clone, Copy)]
struct Undo {
    mv: Move,
    captured: Option<Piece>,
    castling: CastlingRights,
    halfmove_clock: u8,
    fullmove_number: u16,
    hash: u64,
    pawn_hash: u64,
}

#[derive(Debug, Clone)]
pub struct Board {
    piece_bbs: [[BitBoard; NUM_PIECES]; NUM_SIDES],
    side_bbs: [BitBoard; NUM_SIDES],
    pub stm: Side,
    pub castling: CastlingRights,
    pub halfmove_clock: u8,
    pub fullmove_number: u16,
    /// Zobrist key of the full position
    pub hash: u64,
    /// Zobrist key over pawns only, feeds the eval correction history
    pub pawn_hash: u64,
    undo_stack: Vec<Undo>,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            piece_bbs: [[BitBoard::EMPTY; NUM_PIECES]; NUM_SIDES],
            side_bbs: [BitBoard::EMPTY; NUM_SIDES],
            stm: Side::White,
            castling: CastlingRights(0),
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            pawn_hash: 0,
            undo_stack: Vec::with_capacity(MAX_PLY),
        }
    }

    pub fn from_fen(fen_str: &str) -> miette::Result<Self> {
        fen::parse(fen_str)
    }

    #[inline(always)]
    pub fn piece_bb(&self, side: Side, piece: Piece) -> BitBoard {
        self.piece_bbs[side.index()][piece.index()]
    }

    #[inline(always)]
    pub fn side_bb(&self, side: Side) -> BitBoard {
        self.side_bbs[side.index()]
    }

    #[inline(always)]
    pub fn occupied(&self) -> BitBoard {
        self.side_bbs[0] | self.side_bbs[1]
    }

    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        if !self.occupied().is_set(sq) {
            return None;
        }
        Piece::PIECES
            .into_iter()
            .find(|&p| (self.piece_bbs[0][p.index()] | self.piece_bbs[1][p.index()]).is_set(sq))
    }

    pub fn side_at(&self, sq: u8) -> Option<Side> {
        Side::SIDES.into_iter().find(|&s| self.side_bbs[s.index()].is_set(sq))
    }

    /// Destination lands on an opposing piece. A misread here only degrades
    /// move ordering, never correctness elsewhere.
    #[inline(always)]
    pub fn is_capture(&self, mv: Move) -> bool {
        self.side_bb(self.stm.flip()).is_set(mv.to_sq())
    }

    #[inline]
    pub fn king_square(&self, side: Side) -> u8 {
        self.piece_bb(side, Piece::King)
            .0
            .trailing_zeros()
            .min(63) as u8
    }

    pub fn in_check(&self, side: Side) -> bool {
        is_square_attacked(self, self.king_square(side), side.flip())
    }

    /// Raw placement toggle; callers handle hash bookkeeping
    #[inline(always)]
    fn toggle(&mut self, side: Side, piece: Piece, sq: u8) {
        let mask = BitBoard(1 << sq);
        self.piece_bbs[side.index()][piece.index()] = self.piece_bb(side, piece) ^ mask;
        self.side_bbs[side.index()] = self.side_bb(side) ^ mask;
    }

    /// Placement toggle with incremental key updates
    #[inline(always)]
    fn toggle_hashed(&mut self, side: Side, piece: Piece, sq: u8) {
        self.toggle(side, piece, sq);
        let key = ZOBRIST.piece(side, piece, sq);
        self.hash ^= key;
        if piece == Piece::Pawn {
            self.pawn_hash ^= key;
        }
    }

    pub(crate) fn put_piece(&mut self, side: Side, piece: Piece, sq: u8) {
        self.toggle_hashed(side, piece, sq);
    }

    /// Applies `mv` without validating that it came from the move
    /// generator; this is the trusted path for search-internal moves. Returns
    /// false (with the position unchanged) when the mover's king would
    /// be left attacked.
    pub fn make_move(&mut self, mv: Move) -> bool {
        let us = self.stm;
        let them = us.flip();
        let from = mv.from_sq();
        let to = mv.to_sq();
        let piece = mv.piece();

        let captured = if self.side_bb(them).is_set(to) {
            self.piece_at(to)
        } else {
            None
        };

        self.undo_stack.push(Undo {
            mv,
            captured,
            castling: self.castling,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
            pawn_hash: self.pawn_hash,
        });

        let old_castling = self.castling;

        self.toggle_hashed(us, piece, from);
        if let Some(victim) = captured {
            self.toggle_hashed(them, victim, to);
        }
        self.toggle_hashed(us, mv.promotion().unwrap_or(piece), to);

        // Castling is encoded as the king stepping two files; the rook
        // follows here
        if piece == Piece::King && file_of(from).abs_diff(file_of(to)) == 2 {
            let rank_base = from & 56;
            let (rook_from, rook_to) = if to > from {
                (rank_base + 7, rank_base + 5)
            } else {
                (rank_base, rank_base + 3)
            };
            self.toggle_hashed(us, Piece::Rook, rook_from);
            self.toggle_hashed(us, Piece::Rook, rook_to);
        }

        if piece == Piece::King {
            self.castling.remove(CastlingRights::both(us));
        }
        for sq in [from, to] {
            match sq {
                0 => self.castling.remove(CastlingRights::WHITE_QUEENSIDE),
                7 => self.castling.remove(CastlingRights::WHITE_KINGSIDE),
                56 => self.castling.remove(CastlingRights::BLACK_QUEENSIDE),
                63 => self.castling.remove(CastlingRights::BLACK_KINGSIDE),
                _ => {}
            }
        }
        if self.castling != old_castling {
            self.hash ^= ZOBRIST.castling[old_castling.0 as usize];
            self.hash ^= ZOBRIST.castling[self.castling.0 as usize];
        }

        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Side::Black {
            self.fullmove_number += 1;
        }

        self.stm = them;
        self.hash ^= ZOBRIST.black_to_move;

        if is_square_attacked(self, self.king_square(us), them) {
            self.undo_move();
            return false;
        }
        true
    }

    /// Pops the last delta and reverses it in place
    pub fn undo_move(&mut self) {
        let Some(undo) = self.undo_stack.pop() else {
            return;
        };

        self.stm = self.stm.flip();
        let us = self.stm;
        self.castling = undo.castling;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;
        self.hash = undo.hash;
        self.pawn_hash = undo.pawn_hash;

        let mv = undo.mv;
        if mv.is_null() {
            return;
        }

        let from = mv.from_sq();
        let to = mv.to_sq();
        let piece = mv.piece();

        self.toggle(us, mv.promotion().unwrap_or(piece), to);
        self.toggle(us, piece, from);
        if let Some(victim) = undo.captured {
            self.toggle(us.flip(), victim, to);
        }

        if piece == Piece::King && file_of(from).abs_diff(file_of(to)) == 2 {
            let rank_base = from & 56;
            let (rook_from, rook_to) = if to > from {
                (rank_base + 7, rank_base + 5)
            } else {
                (rank_base, rank_base + 3)
            };
            self.toggle(us, Piece::Rook, rook_to);
            self.toggle(us, Piece::Rook, rook_from);
        }
    }

    /// Passes the turn; used by null-move pruning
    pub fn make_null_move(&mut self) {
        self.undo_stack.push(Undo {
            mv: Move::NULL,
            captured: None,
            castling: self.castling,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
            pawn_hash: self.pawn_hash,
        });
        self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        self.stm = self.stm.flip();
        self.hash ^= ZOBRIST.black_to_move;
    }

    /// Full legality check for moves from untrusted sources
    pub fn is_valid_move(&mut self, mv: Move) -> bool {
        let mut list = MoveList::new();
        generate_moves(self, GenMode::All, &mut list);
        if !list.contains(mv) {
            return false;
        }
        if self.make_move(mv) {
            self.undo_move();
            true
        } else {
            false
        }
    }

    /// Validated application for protocol-supplied moves
    pub fn try_move(&mut self, mv: Move) -> miette::Result<()> {
        miette::ensure!(self.is_valid_move(mv), "illegal move: {mv}");
        self.make_move(mv);
        Ok(())
    }

    pub fn to_fen(&self) -> String {
        fen::render(self)
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                let sq = rank * 8 + file;
                let c = match (self.piece_at(sq), self.side_at(sq)) {
                    (Some(p), Some(s)) => p.to_char(s),
                    _ => '.',
                };
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "{} {} {}", self.stm, self.castling, self.halfmove_clock)
    }
}
