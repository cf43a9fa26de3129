use std::{
    fmt::Display,
    ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not},
};

use crate::consts::*;

#[derive(Debug, Default, Hash, PartialEq, Eq, PartialOrd, Clone, Copy)]
#[repr(transparent)]
pub struct BitBoard(pub u64);

impl BitAnd for BitBoard {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for BitBoard {
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitXor for BitBoard {
    type Output = Self;

    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for BitBoard {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl BitAndAssign for BitBoard {
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0
    }
}

impl BitOrAssign for BitBoard {
    #[inline(always)]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0
    }
}

impl BitBoard {
    pub const EMPTY: Self = Self(0);

    #[inline(always)]
    pub const fn set(&mut self, sq: u8) {
        self.0 |= 1 << sq;
    }

    #[inline(always)]
    pub const fn unset(&mut self, sq: u8) {
        self.0 &= !(1 << sq);
    }

    #[inline(always)]
    pub const fn is_set(&self, sq: u8) -> bool {
        self.0 & (1 << sq) != 0
    }

    #[inline(always)]
    pub const fn any(&self) -> bool {
        self.0 != 0
    }

    #[inline(always)]
    pub const fn pop_count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Removes and returns the lowest set square, if any
    #[inline(always)]
    pub const fn pop_lsb(&mut self) -> Option<u8> {
        if self.0 == 0 {
            return None;
        }
        let sq = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(sq)
    }
}

impl Iterator for BitBoard {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        self.pop_lsb()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.pop_count() as usize;
        (n, Some(n))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    #[default]
    White,
    Black,
}

impl Side {
    pub const SIDES: [Side; NUM_SIDES] = [Side::White, Side::Black];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub const fn flip(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::White => write!(f, "w"),
            Side::Black => write!(f, "b"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Piece {
    #[default]
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    pub const PIECES: [Piece; NUM_PIECES] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(idx: usize) -> Option<Piece> {
        if idx < NUM_PIECES {
            Some(Self::PIECES[idx])
        } else {
            None
        }
    }

    pub const fn to_char(self, side: Side) -> char {
        let c = match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        };
        match side {
            Side::White => c.to_ascii_uppercase(),
            Side::Black => c,
        }
    }

    pub const fn from_char(c: char) -> Option<(Side, Piece)> {
        let side = if c.is_ascii_uppercase() {
            Side::White
        } else {
            Side::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            'q' => Piece::Queen,
            'k' => Piece::King,
            _ => return None,
        };
        Some((side, piece))
    }
}

/// Castling availability as a 4-bit mask, white kingside in the low bit
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights(pub u8);

impl CastlingRights {
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;
    pub const ALL: u8 = 0b1111;

    #[inline(always)]
    pub const fn has(self, right: u8) -> bool {
        self.0 & right != 0
    }

    #[inline(always)]
    pub const fn remove(&mut self, right: u8) {
        self.0 &= !right;
    }

    pub const fn kingside(side: Side) -> u8 {
        match side {
            Side::White => Self::WHITE_KINGSIDE,
            Side::Black => Self::BLACK_KINGSIDE,
        }
    }

    pub const fn queenside(side: Side) -> u8 {
        match side {
            Side::White => Self::WHITE_QUEENSIDE,
            Side::Black => Self::BLACK_QUEENSIDE,
        }
    }

    pub const fn both(side: Side) -> u8 {
        Self::kingside(side) | Self::queenside(side)
    }
}

impl Display for CastlingRights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }
        if self.has(Self::WHITE_KINGSIDE) {
            write!(f, "K")?;
        }
        if self.has(Self::WHITE_QUEENSIDE) {
            write!(f, "Q")?;
        }
        if self.has(Self::BLACK_KINGSIDE) {
            write!(f, "k")?;
        }
        if self.has(Self::BLACK_QUEENSIDE) {
            write!(f, "q")?;
        }
        Ok(())
    }
}

#[inline(always)]
pub const fn file_of(sq: u8) -> u8 {
    sq & 7
}

#[inline(always)]
pub const fn rank_of(sq: u8) -> u8 {
    sq >> 3
}

#[inline(always)]
pub const fn square_at(file: u8, rank: u8) -> u8 {
    rank * 8 + file
}

pub fn square_name(sq: u8) -> String {
    format!(
        "{}{}",
        (b'a' + file_of(sq)) as char,
        (b'1' + rank_of(sq)) as char
    )
}

/// Parses "e4" style coordinates
pub fn parse_square(s: &str) -> Option<u8> {
    let mut chars = s.chars();
    let file = chars.next()?;
    let rank = chars.next()?;
    if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
        return None;
    }
    Some(square_at(file as u8 - b'a', rank as u8 - b'1'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitboard_pop_lsb_drains_in_order() {
        let mut bb = BitBoard(0b1010_0100);
        assert_eq!(bb.pop_lsb(), Some(2));
        assert_eq!(bb.pop_lsb(), Some(5));
        assert_eq!(bb.pop_lsb(), Some(7));
        assert_eq!(bb.pop_lsb(), None);
    }

    #[test]
    fn square_round_trip() {
        for sq in 0..64u8 {
            assert_eq!(parse_square(&square_name(sq)), Some(sq));
        }
        assert_eq!(parse_square("i1"), None);
        assert_eq!(parse_square("a9"), None);
    }

    #[test]
    fn castling_rights_display() {
        assert_eq!(CastlingRights(CastlingRights::ALL).to_string(), "KQkq");
        assert_eq!(CastlingRights(0).to_string(), "-");
        let mut rights = CastlingRights(CastlingRights::ALL);
        rights.remove(CastlingRights::both(Side::White));
        assert_eq!(rights.to_string(), "kq");
    }
}
